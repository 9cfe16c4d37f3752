use crate::config::SwaggerConfig;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Futen OpenAPI Generator - Generate OpenAPI documentation from what Futen route handlers return
#[derive(Parser, Debug)]
#[command(name = "futen-openapi")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the TypeScript project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Document title, overriding the configuration file
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document description, overriding the configuration file
    #[arg(long = "description")]
    pub description: Option<String>,

    /// API version, overriding the configuration file
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if let Some(ref config) = args.config_path {
        info!("Configuration file: {}", config.display());
    }

    Ok(args)
}

/// Configuration file values with command line overrides applied.
pub fn load_config(args: &CliArgs) -> Result<SwaggerConfig> {
    let mut config = match &args.config_path {
        Some(path) => SwaggerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SwaggerConfig::default(),
    };

    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(description) = &args.description {
        config.description = description.clone();
    }
    if let Some(version) = &args.api_version {
        config.version = version.clone();
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::extractor::futen::FutenExtractor;
    use crate::extractor::{RouteExtractor, RouteRegistry};
    use crate::generator::DocumentGenerator;
    use crate::parser::{is_declaration_file, AstParser};
    use crate::scanner::{FileScanner, SourceText};
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

    info!("Starting OpenAPI document generation...");
    let config = load_config(&args)?;

    // Step 1: Scan project and dependency sources
    info!("Scanning project directory...");
    let context = FileScanner::new(args.project_path.clone()).scan();
    info!(
        "Found {} project files and {} dependency declaration files",
        context.project_files.len(),
        context.dependency_files.len()
    );
    if !context.warnings.is_empty() {
        info!("{} file(s) could not be read", context.warnings.len());
    }
    if context.project_files.is_empty() {
        anyhow::bail!("No TypeScript or JavaScript files found in the project directory");
    }

    // Step 2: Parse project sources for route discovery
    info!("Parsing project files...");
    let sources: Vec<SourceText> = context
        .project_files
        .iter()
        .filter(|file| !is_declaration_file(&file.name))
        .cloned()
        .collect();
    let parsed_files = AstParser::new().parse_sources(&sources);
    info!("Successfully parsed {} files", parsed_files.len());

    // Step 3: Discover and register route classes
    info!("Extracting routes...");
    let mut registry = RouteRegistry::new();
    for route in FutenExtractor.extract_routes(&parsed_files) {
        debug!("Registering route {} at {}", route.name, route.path.raw());
        registry
            .register(route)
            .context("Route registration failed")?;
    }
    if registry.is_empty() {
        warn!("No routes found in the project");
    }

    // Step 4: Infer responses and build the document
    info!("Building OpenAPI document...");
    let document = DocumentGenerator::new(&context, &config).generate(&registry);
    info!("OpenAPI document built successfully");

    // Step 5: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 6: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", context.project_files.len());
    info!("  - Files parsed: {}", parsed_files.len());
    info!("  - Routes found: {}", registry.len());
    info!("  - Paths documented: {}", document.paths.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args_for(project: &std::path::Path, extra: &[&str]) -> CliArgs {
        let mut argv = vec!["futen-openapi".to_string(), project.display().to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(temp_dir.path(), &[]);

        assert!(matches!(args.output_format, OutputFormat::Yaml));
        assert!(args.output_path.is_none());
        assert!(!args.verbose);
        assert!(parse_args_from_parsed(args).is_ok());
    }

    #[test]
    fn test_missing_project_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let args = args_for(&temp_dir.path().join("missing"), &[]);

        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("swagger.yaml");
        fs::write(&config_file, "title: From File\nversion: 1.0.0\n").unwrap();
        let config_arg = config_file.display().to_string();

        let args = args_for(
            temp_dir.path(),
            &["--config", &config_arg, "--api-version", "2.0.0"],
        );
        let config = load_config(&args).unwrap();

        assert_eq!(config.title, "From File");
        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.description, "Futen API Documentation");
    }

    #[test]
    fn test_run_writes_json_document() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("server.ts"),
            "@route('/')\nclass Home {\n  get() { return new Response('hi'); }\n}\n",
        )
        .unwrap();
        let output = temp_dir.path().join("out").join("openapi.json");
        let output_arg = output.display().to_string();

        run(args_for(temp_dir.path(), &["-f", "json", "-o", &output_arg])).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["paths"]["/"]["get"]["tags"][0], "Home");
    }

    #[test]
    fn test_run_rejects_duplicate_route_names() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("a.ts"),
            "@route('/a')\nclass Home { get() { return new Response('a'); } }\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("b.ts"),
            "@route('/b')\nclass Home { get() { return new Response('b'); } }\n",
        )
        .unwrap();
        let output = temp_dir.path().join("openapi.json");
        let output_arg = output.display().to_string();

        let result = run(args_for(temp_dir.path(), &["-o", &output_arg]));

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
