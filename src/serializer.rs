//! Serialization module for converting OpenAPI documents to YAML or JSON format.
//!
//! Both formats keep the document's insertion order, so serializing the same
//! document twice yields identical text.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```no_run
/// use futen_openapi::openapi_builder::OpenApiBuilder;
/// use futen_openapi::serializer::serialize_yaml;
///
/// let doc = OpenApiBuilder::new().build();
/// let yaml = serialize_yaml(&doc).unwrap();
/// println!("{}", yaml);
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```no_run
/// use futen_openapi::openapi_builder::OpenApiBuilder;
/// use futen_openapi::serializer::serialize_json;
///
/// let doc = OpenApiBuilder::new().build();
/// let json = serialize_json(&doc).unwrap();
/// println!("{}", json);
/// ```
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and any missing parent directories, or overwrites an existing
/// file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{HandlerDefinition, HandlerKind, HttpMethod, RouteDescriptor};
    use crate::openapi_builder::{Info, OpenApiBuilder};
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn create_test_document() -> OpenApiDocument {
        let route = RouteDescriptor::new("Users", "/users/:id?expand").with_handler(
            HttpMethod::Get,
            HandlerDefinition::new(Some("get"), HandlerKind::Function, "get() {}"),
        );
        let mut builder = OpenApiBuilder::new().with_info(Info {
            title: "Test API".to_string(),
            description: "A test API".to_string(),
            version: "1.0.0".to_string(),
        });
        builder.add_route(&route, |_| IndexMap::new());
        builder.build()
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("openapi: 3.0.0"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("description: A test API"));
        assert!(yaml.contains("/users/{id}:"));
        assert!(yaml.contains("get:"));
        assert!(yaml.contains("- Users"));
    }

    #[test]
    fn test_serialize_json_keeps_field_order() {
        let json = serialize_json(&create_test_document()).unwrap();

        let openapi = json.find("\"openapi\"").unwrap();
        let info = json.find("\"info\"").unwrap();
        let paths = json.find("\"paths\"").unwrap();
        assert!(openapi < info && info < paths);

        let title = json.find("\"title\"").unwrap();
        let description = json.find("\"description\"").unwrap();
        let version = json.find("\"version\"").unwrap();
        assert!(title < description && description < version);
    }

    #[test]
    fn test_serialize_json_is_pretty_and_valid() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.lines().count() > 5);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.0");
        assert_eq!(parsed["paths"]["/users/{id}"]["get"]["parameters"][1]["name"], "expand");
    }

    #[test]
    fn test_serialization_is_repeatable() {
        let first = serialize_json(&create_test_document()).unwrap();
        let second = serialize_json(&create_test_document()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("openapi.yaml");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("openapi.json");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_write_yaml_file_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("openapi.yaml");
        let doc = create_test_document();

        write_to_file(&serialize_yaml(&doc).unwrap(), &file_path).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        let deserialized: OpenApiDocument = serde_yaml::from_str(&content).unwrap();
        assert_eq!(deserialized, doc);
    }
}
