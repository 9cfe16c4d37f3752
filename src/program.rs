//! Synthetic program assembly.
//!
//! Handlers are registered as class members, which a type checker cannot look at in
//! isolation. [`ProgramBuilder`] re-emits every handler as a uniquely named top-level
//! declaration (`<Class>_<name>`) in one compilation unit, prefixed by the import
//! statements the project itself uses so that the handlers' free names resolve.

use crate::extractor::{HandlerDefinition, HandlerKind, HttpMethod, RouteRegistry};
use crate::modules;
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::ProjectContext;
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{ClassMember, Decl, Expr, Function, ModuleItem, Pat, Stmt};

/// Virtual file name of the synthetic unit.
pub const SYNTHETIC_FILE_NAME: &str = "generated.ts";

static NAMED_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+(type\s+)?\{([^}]*)\}\s+from\s+['"]([^'"]+)['"]"#)
        .expect("import pattern is valid")
});

/// Identifies the handler behind a synthetic declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    /// Route class name
    pub route: String,
    pub method: HttpMethod,
}

impl HandlerKey {
    pub fn new(route: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            route: route.into(),
            method,
        }
    }
}

/// The assembled compilation unit.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProgram {
    /// Full source text: import preamble followed by one declaration per handler
    pub source: String,
    /// Synthetic declaration name -> handler it was emitted for
    pub handlers: IndexMap<String, HandlerKey>,
}

#[derive(Debug, Default)]
struct ModuleImports {
    values: IndexSet<String>,
    types: IndexSet<String>,
}

impl ModuleImports {
    fn has(&self, item: &str, type_only: bool) -> bool {
        if type_only {
            self.types.contains(item)
        } else {
            self.values.contains(item)
        }
    }
}

/// Builds the synthetic unit for a route registry.
pub struct ProgramBuilder<'a> {
    context: &'a ProjectContext,
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(context: &'a ProjectContext) -> Self {
        Self { context }
    }

    /// Emits the import preamble and every handler of every registered route.
    ///
    /// A handler whose source cannot be re-emitted is logged and left out; it then
    /// contributes no inferred responses.
    pub fn build(&self, registry: &RouteRegistry) -> SyntheticProgram {
        let mut program = SyntheticProgram {
            source: self.import_preamble(),
            handlers: IndexMap::new(),
        };
        program.source.push('\n');

        for route in registry.routes() {
            for (method, handler) in &route.methods {
                let base = format!("{}_{}", route.name, handler.name);
                let name = unique_name(&program.handlers, &base);
                match emit_handler(&name, handler) {
                    Some(declaration) => {
                        program.source.push_str(&declaration);
                        program.source.push('\n');
                        program
                            .handlers
                            .insert(name, HandlerKey::new(route.name.clone(), *method));
                    }
                    None => warn!(
                        "Skipping handler {}.{}: source could not be re-emitted",
                        route.name, handler.name
                    ),
                }
            }
        }

        debug!(
            "Synthetic program has {} handler declarations",
            program.handlers.len()
        );
        program
    }

    /// Collects the brace-style imports of the project's `.ts`/`.mts` files.
    ///
    /// A name is imported at most once per kind across all modules. Within one module
    /// the first kind seen for a name wins, so a name is never both a value and a
    /// type-only import. Relative specifiers are rewritten to the resolved file; ones
    /// that do not resolve to a TypeScript file are dropped.
    pub fn import_preamble(&self) -> String {
        let mut imports: IndexMap<String, ModuleImports> = IndexMap::new();

        let sources = self
            .context
            .project_files
            .iter()
            .filter(|file| file.name.ends_with(".ts") || file.name.ends_with(".mts"));

        for file in sources {
            for captures in NAMED_IMPORT.captures_iter(&file.content) {
                let type_only = captures.get(1).is_some();
                let items: Vec<String> = captures[2]
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .filter(|item| !imports.values().any(|m| m.has(item, type_only)))
                    .map(String::from)
                    .collect();

                let specifier = &captures[3];
                let module = if specifier.starts_with('.') {
                    let resolved = modules::resolve_path(&file.name, specifier, |candidate| {
                        self.context.project_file(candidate).is_some()
                    });
                    match resolved {
                        Some(path) if path.ends_with(".ts") => path,
                        _ => {
                            debug!("Unresolved import '{}' in {}", specifier, file.name);
                            continue;
                        }
                    }
                } else {
                    specifier.to_string()
                };

                let entry = imports.entry(module).or_default();
                for item in items {
                    if type_only {
                        if !entry.values.contains(&item) {
                            entry.types.insert(item);
                        }
                    } else if !entry.types.contains(&item) {
                        entry.values.insert(item);
                    }
                }
            }
        }

        let mut lines = Vec::new();
        for (module, items) in &imports {
            if !items.values.is_empty() {
                lines.push(format!(
                    "import {{ {} }} from '{}'",
                    items.values.iter().cloned().collect::<Vec<_>>().join(", "),
                    module
                ));
            }
            if !items.types.is_empty() {
                lines.push(format!(
                    "import type {{ {} }} from '{}'",
                    items.types.iter().cloned().collect::<Vec<_>>().join(", "),
                    module
                ));
            }
        }
        lines.join("\n")
    }
}

fn unique_name(taken: &IndexMap<String, HandlerKey>, base: &str) -> String {
    if !taken.contains_key(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Renders one handler as a top-level declaration named `name`.
pub fn emit_handler(name: &str, handler: &HandlerDefinition) -> Option<String> {
    match handler.kind {
        HandlerKind::Arrow => Some(format!("const {} = {};", name, handler.source.trim())),
        HandlerKind::Function => {
            let parts = FunctionParts::parse(&handler.source)?;
            Some(format!(
                "{}function{} {}{}({}){} {}",
                if parts.is_async { "async " } else { "" },
                if parts.is_generator { "*" } else { "" },
                name,
                parts.type_params,
                parts.params,
                parts
                    .return_type
                    .map(|ty| format!(": {}", ty))
                    .unwrap_or_default(),
                parts.body
            ))
        }
    }
}

/// Pieces of a method or function expression, as source text.
#[derive(Debug, Default, PartialEq)]
struct FunctionParts {
    is_async: bool,
    is_generator: bool,
    type_params: String,
    params: String,
    return_type: Option<String>,
    body: String,
}

impl FunctionParts {
    /// Re-parses the handler as a class member, or failing that as a function expression.
    fn parse(source: &str) -> Option<Self> {
        let parser = AstParser::new();

        let as_member = format!("class __Handler {{\n{}\n}}", source);
        if let Ok(parsed) = parser.parse_source("handler.ts", &as_member) {
            if let Some(function) = first_method(&parsed) {
                return Self::from_function(&parsed, function);
            }
        }

        let as_expression = format!("({});", source);
        let parsed = parser.parse_source("handler.ts", &as_expression).ok()?;
        let function = parsed.module.body.first().and_then(|item| match item {
            ModuleItem::Stmt(Stmt::Expr(stmt)) => match &*stmt.expr {
                Expr::Paren(paren) => match &*paren.expr {
                    Expr::Fn(fn_expr) => Some(&*fn_expr.function),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })?;
        Self::from_function(&parsed, function)
    }

    fn from_function(file: &ParsedFile, function: &Function) -> Option<Self> {
        let body = file.text(function.body.as_ref()?.span)?.to_string();

        let params = match (function.params.first(), function.params.last()) {
            (Some(first), Some(last)) => {
                let hi = last.span.hi.max(pat_end(&last.pat));
                file.text(Span::new(first.span.lo, hi, Default::default()))?
                    .to_string()
            }
            _ => String::new(),
        };

        Some(Self {
            is_async: function.is_async,
            is_generator: function.is_generator,
            type_params: function
                .type_params
                .as_ref()
                .and_then(|params| file.text(params.span))
                .unwrap_or_default()
                .to_string(),
            params,
            return_type: function
                .return_type
                .as_ref()
                .and_then(|ann| file.text(ann.type_ann.span()))
                .map(String::from),
            body,
        })
    }
}

fn first_method(file: &ParsedFile) -> Option<&Function> {
    file.module.body.iter().find_map(|item| match item {
        ModuleItem::Stmt(Stmt::Decl(Decl::Class(class))) => {
            class.class.body.iter().find_map(|member| match member {
                ClassMember::Method(method) => Some(&*method.function),
                _ => None,
            })
        }
        _ => None,
    })
}

/// End of a parameter pattern, including its type annotation.
fn pat_end(pat: &Pat) -> swc_common::BytePos {
    let annotation = match pat {
        Pat::Ident(ident) => ident.type_ann.as_ref().map(|ann| ann.span.hi),
        Pat::Object(object) => object.type_ann.as_ref().map(|ann| ann.span.hi),
        Pat::Array(array) => array.type_ann.as_ref().map(|ann| ann.span.hi),
        Pat::Rest(rest) => rest.type_ann.as_ref().map(|ann| ann.span.hi),
        _ => None,
    };
    annotation.map_or(pat.span().hi, |hi| hi.max(pat.span().hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::RouteDescriptor;
    use pretty_assertions::assert_eq;

    fn registry(routes: Vec<RouteDescriptor>) -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        for route in routes {
            registry.register(route).unwrap();
        }
        registry
    }

    fn method(source: &str) -> HandlerDefinition {
        HandlerDefinition::new(Some("get"), HandlerKind::Function, source)
    }

    #[test]
    fn test_method_is_reemitted_as_named_function() {
        let handler = method(
            "public get(_request: Request, \
             params: { id: string }): Response {\n    return new Response(params.id);\n}",
        );

        let emitted = emit_handler("Users_get", &handler).unwrap();

        assert_eq!(
            emitted,
            "function Users_get(_request: Request, \
             params: { id: string }): Response {\n    return new Response(params.id);\n}"
        );
    }

    #[test]
    fn test_async_method_keeps_async_keyword() {
        let handler = method("async get() { return Response.json(await load()); }");

        let emitted = emit_handler("Home_get", &handler).unwrap();

        assert_eq!(
            emitted,
            "async function Home_get() { return Response.json(await load()); }"
        );
    }

    #[test]
    fn test_arrow_handler_becomes_const() {
        let handler = HandlerDefinition::new(
            Some("put"),
            HandlerKind::Arrow,
            "() => new Response('ok')",
        );

        assert_eq!(
            emit_handler("Home_put", &handler).unwrap(),
            "const Home_put = () => new Response('ok');"
        );
    }

    #[test]
    fn test_function_expression_source() {
        let handler = method("function (req: Request) { return new Response('x'); }");

        assert_eq!(
            emit_handler("Home_get", &handler).unwrap(),
            "function Home_get(req: Request) { return new Response('x'); }"
        );
    }

    #[test]
    fn test_build_renames_per_route_class() {
        let registry = registry(vec![
            RouteDescriptor::new("Home", "/")
                .with_handler(HttpMethod::Get, method("get() { return new Response('home'); }")),
            RouteDescriptor::new("About", "/about")
                .with_handler(HttpMethod::Get, method("get() { return new Response('about'); }")),
        ]);
        let context = ProjectContext::new("/project");

        let program = ProgramBuilder::new(&context).build(&registry);

        assert_eq!(
            program.handlers.keys().collect::<Vec<_>>(),
            vec!["Home_get", "About_get"]
        );
        assert_eq!(program.handlers["About_get"], HandlerKey::new("About", HttpMethod::Get));
        assert!(program.source.contains("function Home_get() { return new Response('home'); }"));
        assert!(program.source.contains("function About_get() { return new Response('about'); }"));
    }

    #[test]
    fn test_colliding_synthetic_names_get_suffix() {
        let registry = registry(vec![RouteDescriptor::new("Home", "/")
            .with_handler(HttpMethod::Get, method("get() { return 1; }"))
            .with_handler(
                HttpMethod::Post,
                HandlerDefinition::new(Some("get"), HandlerKind::Arrow, "() => 2"),
            )]);
        let context = ProjectContext::new("/project");

        let program = ProgramBuilder::new(&context).build(&registry);

        assert_eq!(
            program.handlers.keys().collect::<Vec<_>>(),
            vec!["Home_get", "Home_get_2"]
        );
        assert_eq!(program.handlers["Home_get_2"].method, HttpMethod::Post);
    }

    #[test]
    fn test_unparseable_handler_is_skipped() {
        let registry = registry(vec![RouteDescriptor::new("Home", "/")
            .with_handler(HttpMethod::Get, method("get( { return"))]);
        let context = ProjectContext::new("/project");

        let program = ProgramBuilder::new(&context).build(&registry);

        assert!(program.handlers.is_empty());
    }

    #[test]
    fn test_import_preamble_deduplicates_and_resolves() {
        let context = ProjectContext::new("/project")
            .with_project_file(
                "/project/src/index.ts",
                "import { route, Swagger } from 'futen';\n\
                 import type { User } from './models';\n\
                 import { helper } from './missing';",
            )
            .with_project_file(
                "/project/src/routes.ts",
                "import { route } from 'futen';\nimport { User, makeUser } from './models';",
            )
            .with_project_file("/project/src/models.ts", "export interface User {}")
            .with_project_file("/project/src/legacy.js", "import { ignored } from 'pkg';");

        let preamble = ProgramBuilder::new(&context).import_preamble();

        assert_eq!(
            preamble,
            "import { route, Swagger } from 'futen'\n\
             import { makeUser } from '/project/src/models.ts'\n\
             import type { User } from '/project/src/models.ts'"
        );
    }

    #[test]
    fn test_type_import_does_not_displace_earlier_value_import() {
        let context = ProjectContext::new("/project")
            .with_project_file("/project/a.ts", "import { Blob } from 'buffer';")
            .with_project_file("/project/b.ts", "import type { Blob } from 'buffer';");

        let preamble = ProgramBuilder::new(&context).import_preamble();

        assert_eq!(preamble, "import { Blob } from 'buffer'");
    }
}
