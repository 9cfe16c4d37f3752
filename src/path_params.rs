//! Route path templates and the parameters they declare.
//!
//! Futen route paths carry two kinds of parameter tokens:
//!
//! - `:name` declares a path segment parameter; `:name?` (followed by `/` or the end
//!   of the template) marks it optional.
//! - `?name` / `&name` declare query parameters; a trailing `?` (`&name?=value`)
//!   marks them optional.
//!
//! The query declarations are documentation metadata only. The published path is
//! the template with `:name` rewritten to `{name}` and everything from the first
//! `?` onward removed.

use crate::schema_generator::Schema;
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":(\w+)(\?)?").expect("path parameter pattern is valid"));
static QUERY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&](\w+)(\?)?").expect("query parameter pattern is valid"));

/// The location where a parameter value is read from in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter embedded in the URL (e.g., `/users/:id`)
    Path,
    /// Query string parameter (e.g., `?page&limit?`)
    Query,
}

/// OpenAPI Parameter object for a path or query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path or query)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema, always a plain string
    pub schema: Schema,
}

impl Parameter {
    fn new(name: &str, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            required,
            schema: Schema::of_type("string"),
        }
    }
}

/// A raw Futen route path template such as `/users/:id?expand&limit?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
}

impl PathTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The template exactly as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Path form used as the key in the document's `paths` map.
    pub fn normalized(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        let mut last = 0;
        for caps in PATH_PARAM.captures_iter(&self.raw) {
            let whole = caps.get(0).expect("group 0 always participates");
            let name = &caps[1];
            out.push_str(&self.raw[last..whole.start()]);
            out.push('{');
            out.push_str(name);
            out.push('}');
            // Keep a `?` that starts the query section; drop an optional marker.
            last = if self.is_optional_marker(&caps) {
                whole.end()
            } else {
                caps.get(1).map_or(whole.end(), |m| m.end())
            };
        }
        out.push_str(&self.raw[last..]);

        match out.find('?') {
            Some(index) => out[..index].to_string(),
            None => out,
        }
    }

    /// Path parameters in order of first appearance.
    pub fn path_parameters(&self) -> Vec<Parameter> {
        let mut params: IndexMap<String, Parameter> = IndexMap::new();
        for caps in PATH_PARAM.captures_iter(&self.raw) {
            let name = &caps[1];
            let required = !self.is_optional_marker(&caps);
            params.insert(
                name.to_string(),
                Parameter::new(name, ParameterLocation::Path, required),
            );
        }
        params.into_values().collect()
    }

    /// Query parameters declared with `?name` / `&name` tokens.
    pub fn query_parameters(&self) -> Vec<Parameter> {
        let mut params: IndexMap<String, Parameter> = IndexMap::new();
        for caps in QUERY_PARAM.captures_iter(&self.raw) {
            let name = &caps[1];
            let required = caps.get(2).is_none();
            params.insert(
                name.to_string(),
                Parameter::new(name, ParameterLocation::Query, required),
            );
        }
        params.into_values().collect()
    }

    /// Path parameters followed by query parameters.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut params = self.path_parameters();
        params.extend(self.query_parameters());
        debug!("Path {} declares {} parameter(s)", self.raw, params.len());
        params
    }

    /// A `?` right after a path token is an optional marker only when it ends the
    /// segment; otherwise it opens the query declarations.
    fn is_optional_marker(&self, caps: &regex::Captures<'_>) -> bool {
        let Some(marker) = caps.get(2) else {
            return false;
        };
        matches!(self.raw[marker.end()..].chars().next(), None | Some('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(params: &[Parameter]) -> Vec<(String, ParameterLocation, bool)> {
        params
            .iter()
            .map(|p| (p.name.clone(), p.location, p.required))
            .collect()
    }

    #[test]
    fn test_dynamic_route_with_query_declarations() {
        let template =
            PathTemplate::new("/dynamic/:id/:adding/SomeText?query=value&query2?=value2");

        assert_eq!(template.normalized(), "/dynamic/{id}/{adding}/SomeText");
        assert_eq!(
            summary(&template.parameters()),
            vec![
                ("id".to_string(), ParameterLocation::Path, true),
                ("adding".to_string(), ParameterLocation::Path, true),
                ("query".to_string(), ParameterLocation::Query, true),
                ("query2".to_string(), ParameterLocation::Query, false),
            ]
        );
    }

    #[test]
    fn test_static_path_has_no_parameters() {
        let template = PathTemplate::new("/");
        assert_eq!(template.normalized(), "/");
        assert!(template.parameters().is_empty());
    }

    #[test]
    fn test_optional_path_parameter() {
        let template = PathTemplate::new("/users/:id?");
        assert_eq!(template.normalized(), "/users/{id}");
        assert_eq!(
            summary(&template.parameters()),
            vec![("id".to_string(), ParameterLocation::Path, false)]
        );

        let nested = PathTemplate::new("/users/:id?/posts");
        assert_eq!(nested.normalized(), "/users/{id}/posts");
        assert!(!nested.path_parameters()[0].required);
    }

    #[test]
    fn test_question_mark_after_path_token_opens_query() {
        let template = PathTemplate::new("/users/:id?expand");
        assert_eq!(template.normalized(), "/users/{id}");
        assert_eq!(
            summary(&template.parameters()),
            vec![
                ("id".to_string(), ParameterLocation::Path, true),
                ("expand".to_string(), ParameterLocation::Query, true),
            ]
        );
    }

    #[test]
    fn test_underscored_names() {
        let template = PathTemplate::new("/orgs/:org_id/members?page_size?");
        assert_eq!(template.normalized(), "/orgs/{org_id}/members");
        let params = template.parameters();
        assert_eq!(params[0].name, "org_id");
        assert_eq!(params[1].name, "page_size");
        assert!(!params[1].required);
    }

    #[test]
    fn test_repeated_query_name_is_listed_once() {
        let template = PathTemplate::new("/search?q&q?");
        let params = template.query_parameters();
        assert_eq!(params.len(), 1);
        assert!(!params[0].required);
    }

    #[test]
    fn test_parameter_serializes_as_openapi() {
        let template = PathTemplate::new("/items/:id");
        let value = serde_json::to_value(&template.parameters()[0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "id",
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        );
    }
}
