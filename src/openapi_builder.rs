use crate::config::SwaggerConfig;
use crate::extractor::{HttpMethod, RouteDescriptor};
use crate::path_params::Parameter;
use crate::schema_generator::Schema;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OpenAPI version marker of every generated document
pub const OPENAPI_VERSION: &str = "3.0.0";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (normalized path -> verb -> operation)
    paths: IndexMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    pub description: String,
    /// API version
    pub version: String,
}

impl From<&SwaggerConfig> for Info {
    fn from(config: &SwaggerConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            version: config.version.clone(),
        }
    }
}

/// Operations of one path, keyed by lowercase verb
pub type PathItem = IndexMap<String, Operation>;

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Route class name followed by any explicit tags
    pub tags: Vec<Value>,
    /// Path and query parameters followed by any explicit parameters
    pub parameters: Vec<Value>,
    /// Explicit responses, or the ones synthesized from the handler's return values
    pub responses: Value,
    /// Remaining explicit operation fields (summary, description, requestBody...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with the default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::from(&SwaggerConfig::default()),
            paths: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Add every verb of a route class to the document.
    ///
    /// `synthesize` supplies the inferred responses of a verb; they are used when the
    /// verb's explicit documentation has no `responses` of its own. Routes whose
    /// normalized paths coincide share one path item.
    pub fn add_route(
        &mut self,
        route: &RouteDescriptor,
        mut synthesize: impl FnMut(HttpMethod) -> IndexMap<String, Response>,
    ) {
        let openapi_path = route.path.normalized();
        debug!(
            "Adding route {} at {} ({} verbs)",
            route.name,
            openapi_path,
            route.methods.len()
        );

        let parameters = route.path.parameters();
        for &method in route.methods.keys() {
            let operation = Self::build_operation(
                &route.name,
                &parameters,
                route.explicit_docs.get(&method),
                || synthesize(method),
            );
            self.paths
                .entry(openapi_path.clone())
                .or_default()
                .insert(method.as_str().to_string(), operation);
        }
    }

    /// Merge inferred data with a verb's explicit documentation.
    ///
    /// Explicit fields take precedence, except that explicit `tags` and `parameters`
    /// are appended to the route class tag and the template's parameters.
    fn build_operation(
        route_class: &str,
        parameters: &[Parameter],
        explicit: Option<&Map<String, Value>>,
        synthesize: impl FnOnce() -> IndexMap<String, Response>,
    ) -> Operation {
        let mut extra = explicit.cloned().unwrap_or_default();

        let mut tags = vec![Value::String(route_class.to_string())];
        if let Some(Value::Array(explicit_tags)) = extra.remove("tags") {
            tags.extend(explicit_tags);
        }

        let mut all_parameters: Vec<Value> = parameters
            .iter()
            .filter_map(|p| serde_json::to_value(p).ok())
            .collect();
        if let Some(Value::Array(explicit_parameters)) = extra.remove("parameters") {
            all_parameters.extend(explicit_parameters);
        }

        let responses = match extra.remove("responses") {
            Some(responses) => responses,
            None => {
                serde_json::to_value(synthesize()).unwrap_or_else(|_| Value::Object(Map::new()))
            }
        };

        Operation {
            tags,
            parameters: all_parameters,
            responses,
            extra,
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document with {} paths", self.paths.len());
        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            paths: self.paths,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
