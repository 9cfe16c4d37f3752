//! Route registrations: the input the document generator works from.
//!
//! A route class groups one handler per HTTP verb under a path template. The server
//! layer normally owns the registrations; [`futen::FutenExtractor`] recovers them
//! statically from a project's sources so the generator can run without a live server.
//!
//! # Example
//!
//! ```no_run
//! use futen_openapi::extractor::{RouteExtractor, RouteRegistry, futen::FutenExtractor};
//! use futen_openapi::parser::AstParser;
//!
//! let parser = AstParser::new();
//! let source = "@route('/') class Home { get() { return new Response('hi'); } }";
//! let parsed = parser.parse_source("server.ts", source).unwrap();
//! let mut registry = RouteRegistry::new();
//! for route in FutenExtractor.extract_routes(&[parsed]) {
//!     registry.register(route).unwrap();
//! }
//! println!("Found {} routes", registry.len());
//! ```

pub mod futen;

use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use crate::path_params::PathTemplate;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Trait for extracting route registrations from parsed source files.
pub trait RouteExtractor {
    /// Extracts every route class declared across the parsed files, in source order.
    fn extract_routes(&self, parsed_files: &[ParsedFile]) -> Vec<RouteDescriptor>;
}

/// HTTP verbs a route class may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Connect,
        HttpMethod::Options,
        HttpMethod::Trace,
        HttpMethod::Patch,
    ];

    /// Matches a handler name; Futen only dispatches to lower-case verb names.
    pub fn from_handler_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }

    /// Lower-case verb as used for handler names and document keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Connect => "connect",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// How a handler was written, which decides how it is re-emitted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// An arrow function (`(req) => ...`)
    Arrow,
    /// A method or `function` declaration/expression
    Function,
}

/// Source of one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDefinition {
    /// Function name; anonymous functions are named `f`
    pub name: String,
    pub kind: HandlerKind,
    /// Full source text of the function
    pub source: String,
}

impl HandlerDefinition {
    pub fn new(name: Option<&str>, kind: HandlerKind, source: impl Into<String>) -> Self {
        let name = name.filter(|n| !n.is_empty()).unwrap_or("f");
        Self {
            name: name.to_string(),
            kind,
            source: source.into(),
        }
    }
}

/// Explicit OpenAPI operation fields attached to one verb of a route class.
pub type OperationOverride = Map<String, Value>;

/// One registered route class.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    /// Route class name, unique within a registry
    pub name: String,
    pub path: PathTemplate,
    /// Handlers in declaration order
    pub methods: IndexMap<HttpMethod, HandlerDefinition>,
    /// Explicit per-verb documentation
    pub explicit_docs: IndexMap<HttpMethod, OperationOverride>,
}

impl RouteDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: PathTemplate::new(path),
            methods: IndexMap::new(),
            explicit_docs: IndexMap::new(),
        }
    }

    pub fn with_handler(mut self, method: HttpMethod, handler: HandlerDefinition) -> Self {
        self.methods.insert(method, handler);
        self
    }

    pub fn with_docs(mut self, method: HttpMethod, docs: OperationOverride) -> Self {
        self.explicit_docs.insert(method, docs);
        self
    }
}

/// Route classes keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: IndexMap<String, RouteDescriptor>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRoute`] if a route class with the same name is already
    /// registered; the registry is left unchanged.
    pub fn register(&mut self, route: RouteDescriptor) -> Result<()> {
        if self.routes.contains_key(&route.name) {
            return Err(Error::DuplicateRoute { name: route.name });
        }
        debug!("Registering route class {} at {}", route.name, route.path.raw());
        self.routes.insert(route.name.clone(), route);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.get(name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Explicit documentation attached to `verb` of `route_class`, if any.
    pub fn explicit_docs(&self, route_class: &str, verb: HttpMethod) -> Option<&OperationOverride> {
        self.routes.get(route_class)?.explicit_docs.get(&verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler(source: &str) -> HandlerDefinition {
        HandlerDefinition::new(Some("get"), HandlerKind::Function, source)
    }

    #[test]
    fn test_http_method_names() {
        assert_eq!(HttpMethod::from_handler_name("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_handler_name("trace"), Some(HttpMethod::Trace));
        assert_eq!(HttpMethod::from_handler_name("GET"), None);
        assert_eq!(HttpMethod::from_handler_name("handler"), None);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_anonymous_handler_is_named_f() {
        assert_eq!(HandlerDefinition::new(None, HandlerKind::Arrow, "() => 1").name, "f");
        assert_eq!(HandlerDefinition::new(Some(""), HandlerKind::Arrow, "() => 1").name, "f");
    }

    #[test]
    fn test_register_rejects_duplicate_names() {
        let mut registry = RouteRegistry::new();
        registry
            .register(
                RouteDescriptor::new("Home", "/")
                    .with_handler(HttpMethod::Get, handler("get() {}")),
            )
            .unwrap();

        let err = registry
            .register(RouteDescriptor::new("Home", "/other"))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateRoute { ref name } if name == "Home"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Home").unwrap().path.raw(), "/");
    }

    #[test]
    fn test_explicit_docs_accessor() {
        let docs = json!({ "summary": "Say hello" }).as_object().unwrap().clone();
        let mut registry = RouteRegistry::new();
        registry
            .register(RouteDescriptor::new("Home", "/").with_docs(HttpMethod::Get, docs.clone()))
            .unwrap();

        assert_eq!(registry.explicit_docs("Home", HttpMethod::Get), Some(&docs));
        assert_eq!(registry.explicit_docs("Home", HttpMethod::Post), None);
        assert_eq!(registry.explicit_docs("Missing", HttpMethod::Get), None);
    }

    #[test]
    fn test_routes_keep_registration_order() {
        let mut registry = RouteRegistry::new();
        for name in ["Zeta", "Alpha", "Mid"] {
            registry.register(RouteDescriptor::new(name, "/")).unwrap();
        }
        let names: Vec<&str> = registry.routes().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }
}
