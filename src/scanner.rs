use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use indexmap::IndexMap;

/// Extensions of project files loaded into the semantic model.
const PROJECT_EXTENSIONS: &[&str] = &[".d.ts", ".d.mts", ".ts", ".mts", ".js", ".mjs"];
/// Extensions of dependency declaration files.
const DECLARATION_EXTENSIONS: &[&str] = &[".d.ts", ".d.mts"];

/// A source file captured at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Virtual file name. Project files use their full path, dependency files use
    /// their path below `node_modules` (e.g. `futen/dist/index.d.ts`).
    pub name: String,
    pub content: String,
}

impl SourceText {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Immutable snapshot of everything the analyzer may read from disk.
///
/// The analyzer never touches the filesystem itself; the scanner (or a test)
/// builds this value and hands it over.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    /// Project root, used to resolve relative imports in the preamble
    pub root: PathBuf,
    /// Project sources (`.ts`, `.mts`, `.d.ts`, `.js`, ...)
    pub project_files: Vec<SourceText>,
    /// Declaration files of installed dependencies
    pub dependency_files: Vec<SourceText>,
    /// Package name -> declaration entry file (from `types`/`typings`)
    pub package_types: IndexMap<String, String>,
    /// Warning messages for anything that could not be read
    pub warnings: Vec<String>,
}

impl ProjectContext {
    /// An empty context rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_project_file(
        mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.project_files.push(SourceText::new(name, content));
        self
    }

    pub fn with_dependency_file(
        mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.dependency_files.push(SourceText::new(name, content));
        self
    }

    pub fn with_package_types(
        mut self,
        package: impl Into<String>,
        entry: impl Into<String>,
    ) -> Self {
        self.package_types.insert(package.into(), entry.into());
        self
    }

    /// Looks a project file up by its virtual name.
    pub fn project_file(&self, name: &str) -> Option<&SourceText> {
        self.project_files.iter().find(|file| file.name == name)
    }
}

/// File scanner for collecting a TypeScript project's sources.
///
/// The `FileScanner` walks the project directory for TypeScript and JavaScript sources
/// and every installed package under `node_modules` for declaration files. Hidden
/// directories are skipped, and `node_modules` is never treated as project source.
///
/// # Example
///
/// ```no_run
/// use futen_openapi::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let context = scanner.scan();
/// println!("Found {} project files", context.project_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the project and its dependencies into a [`ProjectContext`].
    ///
    /// A missing project or `node_modules` directory contributes an empty set.
    /// Files that cannot be read are recorded as warnings and skipped.
    pub fn scan(&self) -> ProjectContext {
        let mut context = ProjectContext::new(self.root_path.clone());

        if self.root_path.is_dir() {
            self.scan_project(&mut context);
        } else {
            warn!("Project directory not found: {}", self.root_path.display());
        }

        let node_modules = self.root_path.join("node_modules");
        if node_modules.is_dir() {
            self.scan_dependencies(&node_modules, &mut context);
        } else {
            debug!("No node_modules directory in {}", self.root_path.display());
        }

        debug!(
            "Scanned {} project files and {} dependency declaration files",
            context.project_files.len(),
            context.dependency_files.len()
        );
        context
    }

    fn scan_project(&self, context: &mut ProjectContext) {
        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_node_modules = file_name == "node_modules";

                !is_hidden && !is_node_modules
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && has_extension(path, PROJECT_EXTENSIONS) {
                        if let Some(content) = read_source(path, &mut context.warnings) {
                            context
                                .project_files
                                .push(SourceText::new(path.to_string_lossy(), content));
                        }
                    }
                }
                Err(e) => record_warning(
                    &mut context.warnings,
                    format!("Failed to access path: {}", e),
                ),
            }
        }
    }

    fn scan_dependencies(&self, node_modules: &Path, context: &mut ProjectContext) {
        for entry in WalkDir::new(node_modules)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let Ok(relative) = path.strip_prefix(node_modules) else {
                        continue;
                    };
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");

                    if path.is_file() && has_extension(path, DECLARATION_EXTENSIONS) {
                        if let Some(content) = read_source(path, &mut context.warnings) {
                            context.dependency_files.push(SourceText::new(name, content));
                        }
                    } else if path.is_file() && entry.file_name() == "package.json" {
                        if let Some((package, types)) = read_types_entry(path, &name) {
                            context.package_types.entry(package).or_insert(types);
                        }
                    }
                }
                Err(e) => record_warning(
                    &mut context.warnings,
                    format!("Failed to access path: {}", e),
                ),
            }
        }
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    extensions.iter().any(|ext| name.ends_with(ext))
}

fn read_source(path: &Path, warnings: &mut Vec<String>) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            record_warning(warnings, format!("Failed to read {}: {}", path.display(), e));
            None
        }
    }
}

fn record_warning(warnings: &mut Vec<String>, warning: String) {
    warn!("{}", warning);
    warnings.push(warning);
}

/// Reads the declaration entry of a package manifest.
///
/// `relative` is the manifest's path below `node_modules`; only manifests that sit
/// directly in a package directory (`pkg/package.json`, `@scope/pkg/package.json`)
/// describe a package.
fn read_types_entry(path: &Path, relative: &str) -> Option<(String, String)> {
    let package_dir = relative.strip_suffix("/package.json")?;
    let depth = package_dir.split('/').count();
    let is_package_root = if package_dir.starts_with('@') { depth == 2 } else { depth == 1 };
    if !is_package_root {
        return None;
    }

    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).ok()?).ok()?;
    let types = manifest
        .get("types")
        .or_else(|| manifest.get("typings"))
        .and_then(|value| value.as_str())?;
    let types = types.trim_start_matches("./");
    Some((package_dir.to_string(), format!("{}/{}", package_dir, types)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[SourceText]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                Path::new(&f.name)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_scan_project_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("index.ts"), "export {}").unwrap();
        fs::write(root.join("src/routes.mts"), "export {}").unwrap();
        fs::write(root.join("src/types.d.ts"), "export type A = string;").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let context = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(context.project_files.len(), 3);
        assert!(context.warnings.is_empty());
        let found = names(&context.project_files);
        assert!(found.contains(&"index.ts".to_string()));
        assert!(found.contains(&"routes.mts".to_string()));
        assert!(found.contains(&"types.d.ts".to_string()));
    }

    #[test]
    fn test_scan_skips_node_modules_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("node_modules/futen")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join("node_modules/futen/index.ts"), "export {}").unwrap();
        fs::write(root.join(".git/hook.ts"), "export {}").unwrap();
        fs::write(root.join("main.ts"), "export {}").unwrap();

        let context = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(names(&context.project_files), vec!["main.ts".to_string()]);
    }

    #[test]
    fn test_scan_dependency_declarations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("node_modules/futen/dist")).unwrap();
        fs::create_dir_all(root.join("node_modules/@types/bun")).unwrap();
        fs::write(
            root.join("node_modules/futen/package.json"),
            r#"{ "name": "futen", "types": "./dist/index.d.ts" }"#,
        )
        .unwrap();
        fs::write(root.join("node_modules/futen/dist/index.d.ts"), "export {}").unwrap();
        fs::write(root.join("node_modules/futen/dist/index.js"), "export {}").unwrap();
        fs::write(root.join("node_modules/@types/bun/index.d.ts"), "export {}").unwrap();

        let context = FileScanner::new(root.to_path_buf()).scan();

        let deps: Vec<&str> = context.dependency_files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(deps, vec!["@types/bun/index.d.ts", "futen/dist/index.d.ts"]);
        assert_eq!(
            context.package_types.get("futen").map(String::as_str),
            Some("futen/dist/index.d.ts")
        );
    }

    #[test]
    fn test_missing_directories_yield_empty_context() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let context = FileScanner::new(missing).scan();

        assert!(context.project_files.is_empty());
        assert!(context.dependency_files.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_recorded_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("good.ts"), "export {}").unwrap();
        fs::write(root.join("bad.ts"), [0xff, 0xfe, 0xfd]).unwrap();

        let context = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(names(&context.project_files), vec!["good.ts".to_string()]);
        assert_eq!(context.warnings.len(), 1);
        assert!(context.warnings[0].contains("bad.ts"));
    }
}
