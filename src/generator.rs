//! Document generation pipeline.
//!
//! One generation pass builds the synthetic program for the registered routes,
//! parses it together with the default library, the project sources and the
//! dependency declarations into one virtual file set, infers the shape of every
//! handler's return values, and assembles the document. Nothing is cached between
//! passes.

use crate::checker::{self, Checker};
use crate::config::SwaggerConfig;
use crate::error::Result;
use crate::extractor::{RouteDescriptor, RouteRegistry};
use crate::openapi_builder::{Info, OpenApiBuilder, OpenApiDocument};
use crate::parser::{AstParser, ParsedFile};
use crate::program::{HandlerKey, ProgramBuilder, SYNTHETIC_FILE_NAME};
use crate::scanner::ProjectContext;
use crate::schema_generator::SchemaGenerator;
use crate::shape::{Property, ShapeResolver};
use crate::walker;
use indexmap::IndexMap;
use log::{debug, info, warn};

/// Inferred return shapes per handler.
pub type InferredShapes = IndexMap<HandlerKey, Vec<Property>>;

/// Generates documents for a fixed project snapshot and configuration.
pub struct DocumentGenerator<'a> {
    context: &'a ProjectContext,
    config: &'a SwaggerConfig,
}

impl<'a> DocumentGenerator<'a> {
    pub fn new(context: &'a ProjectContext, config: &'a SwaggerConfig) -> Self {
        Self { context, config }
    }

    /// Builds the document for every route of the registry.
    ///
    /// Analysis problems never fail the pass: a handler whose return values cannot be
    /// analyzed simply gets no synthesized responses.
    pub fn generate(&self, registry: &RouteRegistry) -> OpenApiDocument {
        info!("Generating document for {} routes", registry.len());

        let shapes = self.infer_shapes(registry);
        let schema_generator = SchemaGenerator::new();
        let mut builder = OpenApiBuilder::new().with_info(Info::from(self.config));

        for route in registry.routes() {
            builder.add_route(route, |method| {
                let key = HandlerKey::new(route.name.clone(), method);
                let properties = shapes.get(&key).map(Vec::as_slice).unwrap_or_default();
                schema_generator.generate_responses(properties)
            });
        }

        builder.build()
    }

    /// Infers the return shapes of every handler of the registry.
    pub fn infer_shapes(&self, registry: &RouteRegistry) -> InferredShapes {
        let program = ProgramBuilder::new(self.context).build(registry);
        let parser = AstParser::new();

        let prelude = checker::prelude();
        let mut files: Vec<ParsedFile> = Vec::new();
        match parser.parse_source(&prelude.name, &prelude.content) {
            Ok(parsed) => files.push(parsed),
            Err(e) => warn!("Default library failed to parse: {}", e),
        }

        let synthetic = match parser.parse_source(SYNTHETIC_FILE_NAME, &program.source) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Synthetic program failed to parse, no responses will be inferred: {}", e);
                return InferredShapes::new();
            }
        };
        let returns = walker::collect_returns(&synthetic);
        files.push(synthetic);
        files.extend(parser.parse_sources(&self.context.project_files));
        files.extend(parser.parse_sources(&self.context.dependency_files));
        debug!("Virtual file set holds {} files", files.len());

        let checker = Checker::new(&files, &self.context.package_types);
        let mut resolver = ShapeResolver::new(&checker);

        let mut shapes = InferredShapes::new();
        for (declaration, key) in &program.handlers {
            let properties: Vec<Property> = returns
                .get(declaration)
                .map(|exprs| {
                    exprs
                        .iter()
                        .filter_map(|expr| resolver.resolve_return(expr))
                        .collect()
                })
                .unwrap_or_default();
            debug!(
                "{} {} returns {} inferred value(s)",
                key.route,
                key.method.as_str(),
                properties.len()
            );
            shapes.insert(key.clone(), properties);
        }
        shapes
    }
}

/// Registers the routes and generates their document.
///
/// # Errors
///
/// Returns [`crate::error::Error::DuplicateRoute`] if two routes share a class name;
/// no document is produced in that case.
pub fn generate_document(
    routes: impl IntoIterator<Item = RouteDescriptor>,
    context: &ProjectContext,
    config: &SwaggerConfig,
) -> Result<OpenApiDocument> {
    let mut registry = RouteRegistry::new();
    for route in routes {
        registry.register(route)?;
    }
    Ok(DocumentGenerator::new(context, config).generate(&registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::extractor::{HandlerDefinition, HandlerKind, HttpMethod};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn method(source: &str) -> HandlerDefinition {
        HandlerDefinition::new(Some("get"), HandlerKind::Function, source)
    }

    fn document(routes: Vec<RouteDescriptor>, context: &ProjectContext) -> serde_json::Value {
        let document = generate_document(routes, context, &SwaggerConfig::default()).unwrap();
        serde_json::to_value(document).unwrap()
    }

    #[test]
    fn test_plain_text_handler() {
        let route = RouteDescriptor::new("Home", "/").with_handler(
            HttpMethod::Get,
            method("get() { return new Response('Hello, World!'); }"),
        );

        let value = document(vec![route], &ProjectContext::default());

        assert_eq!(
            value["paths"]["/"]["get"]["responses"],
            json!({
                "200": {
                    "description": "OK",
                    "content": {"text/plain": {"schema": {"type": "string"}}}
                }
            })
        );
    }

    #[test]
    fn test_handler_using_project_type() {
        let context = ProjectContext::new("/app")
            .with_project_file(
                "/app/src/users.ts",
                "export interface User { id: number; name: string }\n\
                 export function findUser(): User { return { id: 1, name: 'a' }; }",
            )
            .with_project_file(
                "/app/src/routes.ts",
                "import { findUser } from './users';\nexport const unused = findUser;",
            );
        let route = RouteDescriptor::new("Users", "/users/:id").with_handler(
            HttpMethod::Get,
            method("get() { return Response.json({ user: findUser(), count: 2 }); }"),
        );

        let value = document(vec![route], &context);

        let content = &value["paths"]["/users/{id}"]["get"]["responses"]["200"]["content"];
        assert_eq!(
            content["application/json"]["schema"],
            json!({
                "type": "object",
                "properties": {"user": {"type": "user"}, "count": {"type": "number"}}
            })
        );
    }

    #[test]
    fn test_spread_and_aliased_import() {
        let context = ProjectContext::new("/app")
            .with_project_file(
                "/app/src/c.ts",
                "export const config = { port: 8080, host: 'localhost' };",
            )
            .with_project_file(
                "/app/src/routes.ts",
                "import { config as cfg } from './c';\nexport const unused = cfg;",
            );
        let route = RouteDescriptor::new("Settings", "/settings").with_handler(
            HttpMethod::Get,
            method(
                "get() {\n\
                   const base = { z: 1 };\n\
                   return Response.json({ a: 'x', ...{ b: 2, a: 3 }, ...base, c: cfg });\n\
                 }",
            ),
        );

        let value = document(vec![route], &context);

        let content = &value["paths"]["/settings"]["get"]["responses"]["200"]["content"];
        assert_eq!(
            content["application/json"]["schema"],
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"},
                    "c": {
                        "type": "object",
                        "properties": {
                            "port": {"type": "number"},
                            "host": {"type": "string"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_in_memory_dependency_is_resolved() {
        let context = ProjectContext::new("/app")
            .with_dependency_file(
                "kit/dist/index.d.ts",
                "export declare function version(): string;",
            )
            .with_package_types("kit", "kit/dist/index.d.ts")
            .with_project_file(
                "/app/src/routes.ts",
                "import { version } from 'kit';\nexport const unused = version;",
            );
        let route = RouteDescriptor::new("Version", "/version").with_handler(
            HttpMethod::Get,
            method("get() { return Response.json({ v: version() }); }"),
        );

        let value = document(vec![route], &context);

        let content = &value["paths"]["/version"]["get"]["responses"]["200"]["content"];
        assert_eq!(
            content["application/json"]["schema"],
            json!({"type": "object", "properties": {"v": {"type": "string"}}})
        );
    }

    #[test]
    fn test_unparsable_handler_still_documented() {
        let route = RouteDescriptor::new("Broken", "/broken").with_handler(
            HttpMethod::Post,
            HandlerDefinition::new(Some("post"), HandlerKind::Arrow, "() => {{"),
        );

        let value = document(vec![route], &ProjectContext::default());

        assert_eq!(
            value["paths"]["/broken"]["post"],
            json!({"tags": ["Broken"], "parameters": [], "responses": {}})
        );
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let routes = vec![
            RouteDescriptor::new("Home", "/"),
            RouteDescriptor::new("Home", "/other"),
        ];

        let result =
            generate_document(routes, &ProjectContext::default(), &SwaggerConfig::default());

        assert!(matches!(result, Err(Error::DuplicateRoute { name }) if name == "Home"));
    }

    #[test]
    fn test_info_comes_from_config() {
        let config = SwaggerConfig {
            title: "Store".to_string(),
            ..SwaggerConfig::default()
        };

        let document = generate_document(Vec::new(), &ProjectContext::default(), &config).unwrap();

        assert_eq!(document.info.title, "Store");
        assert_eq!(document.openapi, "3.0.0");
    }
}
