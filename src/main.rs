//! Futen OpenAPI Generator - Command-line tool for generating OpenAPI documentation.
//!
//! Scans a Futen project for route classes, infers each handler's responses from the
//! values it returns, and writes an OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! futen-openapi [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! futen-openapi ./my-api-project -o openapi.yaml
//! ```
//!
//! Generate JSON documentation with a custom title:
//! ```bash
//! futen-openapi ./my-api-project -f json --title "Pet Store" -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! futen-openapi ./my-api-project -v
//! ```

use anyhow::Result;
use clap::Parser;
use futen_openapi::cli;
use log::info;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Futen OpenAPI Generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
