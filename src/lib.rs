//! Futen OpenAPI Generator - OpenAPI documentation inferred from Futen handlers.
//!
//! Futen route classes expose one handler per HTTP verb. This library documents them
//! by statically analyzing what each handler returns: response wrappers such as
//! `Response.json({...})` or `new Response(new Blob(...))` become OpenAPI responses
//! with a status, a content type and a schema derived from the returned value.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Captures the project sources and dependency declaration files
//! 2. [`parser`] - Parses TypeScript sources into SWC syntax trees
//! 3. [`extractor`] - Discovers route classes and registers them
//! 4. [`program`] - Re-emits every handler as a top-level declaration of one unit
//! 5. [`checker`] - Shallow TypeScript type checker over the virtual file set
//! 6. [`walker`] - Collects the return statements of each handler
//! 7. [`shape`] - Classifies returned expressions into value shapes
//! 8. [`schema_generator`] - Turns value shapes into schemas and responses
//! 9. [`path_params`] - Path and query parameters of route templates
//! 10. [`openapi_builder`] - Merges inferred data and explicit docs into the document
//! 11. [`generator`] - Runs the whole pass
//! 12. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use futen_openapi::{
//!     config::SwaggerConfig,
//!     extractor::{futen::FutenExtractor, RouteExtractor, RouteRegistry},
//!     generator::DocumentGenerator,
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::PathBuf;
//!
//! let context = FileScanner::new(PathBuf::from("./my-project")).scan();
//! let parsed = AstParser::new().parse_sources(&context.project_files);
//!
//! let mut registry = RouteRegistry::new();
//! for route in FutenExtractor.extract_routes(&parsed) {
//!     registry.register(route).unwrap();
//! }
//!
//! let config = SwaggerConfig::default();
//! let document = DocumentGenerator::new(&context, &config).generate(&registry);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod modules;
pub mod openapi_builder;
pub mod parser;
pub mod path_params;
pub mod program;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod shape;
pub mod walker;
