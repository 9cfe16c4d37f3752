use crate::extractor::{
    HandlerDefinition, HandlerKind, HttpMethod, OperationOverride, RouteDescriptor,
    RouteExtractor,
};
use crate::parser::ParsedFile;
use log::{debug, warn};
use serde_json::{Map, Number, Value};
use swc_ecma_ast::{
    Callee, Class, ClassMember, Decl, Decorator, DefaultDecl, Expr, Lit, MemberProp, MethodKind,
    ModuleDecl, ModuleItem, Pat, Prop, PropName, PropOrSpread, Stmt, UnaryOp,
};

/// Futen route extractor.
///
/// Recognizes the two ways Futen route classes are declared:
///
/// ```ts
/// @route('/users/:id')
/// class User { public get() { ... } }
///
/// const Wrapped = route('/wrapped')(class { public get() { ... } });
/// ```
///
/// `@docs({...})` decorators on verb methods become explicit operation overrides when
/// their argument is a literal object.
pub struct FutenExtractor;

impl RouteExtractor for FutenExtractor {
    fn extract_routes(&self, parsed_files: &[ParsedFile]) -> Vec<RouteDescriptor> {
        let mut routes = Vec::new();

        for file in parsed_files.iter().filter(|f| !f.is_declaration()) {
            for item in &file.module.body {
                match item {
                    ModuleItem::Stmt(Stmt::Decl(decl)) => {
                        extract_from_decl(file, decl, &mut routes);
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                        extract_from_decl(file, &export.decl, &mut routes);
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                        if let DefaultDecl::Class(class_expr) = &export.decl {
                            let decorators = &class_expr.class.decorators;
                            if let Some(path) = route_path_from_decorators(decorators) {
                                let name = class_expr
                                    .ident
                                    .as_ref()
                                    .map_or_else(|| "default".to_string(), |i| i.sym.to_string());
                                routes.push(build_route(file, name, path, &class_expr.class));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        debug!("Extracted {} Futen route classes", routes.len());
        routes
    }
}

fn extract_from_decl(file: &ParsedFile, decl: &Decl, routes: &mut Vec<RouteDescriptor>) {
    match decl {
        Decl::Class(class_decl) => {
            if let Some(path) = route_path_from_decorators(&class_decl.class.decorators) {
                routes.push(build_route(
                    file,
                    class_decl.ident.sym.to_string(),
                    path,
                    &class_decl.class,
                ));
            }
        }
        Decl::Var(var_decl) => {
            for declarator in &var_decl.decls {
                let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) else {
                    continue;
                };
                if let Some((path, class)) = wrapped_route_class(init) {
                    routes.push(build_route(file, binding.id.sym.to_string(), path, class));
                }
            }
        }
        _ => {}
    }
}

/// Matches `route('<path>')(class { ... })`.
fn wrapped_route_class(expr: &Expr) -> Option<(String, &Class)> {
    let Expr::Call(outer) = unwrap_parens(expr) else {
        return None;
    };
    let Callee::Expr(callee) = &outer.callee else {
        return None;
    };
    let path = route_call_path(callee)?;
    let argument = outer.args.first()?;
    match unwrap_parens(&argument.expr) {
        Expr::Class(class_expr) => Some((path, &class_expr.class)),
        _ => None,
    }
}

fn route_path_from_decorators(decorators: &[Decorator]) -> Option<String> {
    decorators.iter().find_map(|d| route_call_path(&d.expr))
}

/// Path argument of a `route('<path>')` call.
fn route_call_path(expr: &Expr) -> Option<String> {
    let Expr::Call(call) = unwrap_parens(expr) else {
        return None;
    };
    if callee_name(&call.callee)? != "route" {
        return None;
    }
    string_literal(&call.args.first()?.expr)
}

fn build_route(file: &ParsedFile, name: String, path: String, class: &Class) -> RouteDescriptor {
    debug!("Found route class {} at {} in {}", name, path, file.name);
    let mut route = RouteDescriptor::new(name, path);

    for member in &class.body {
        let (method_name, kind, span, decorators) = match member {
            ClassMember::Method(method)
                if !method.is_static && method.kind == MethodKind::Method =>
            {
                let Some(name) = prop_name(&method.key) else {
                    continue;
                };
                (name, HandlerKind::Function, method.span, &method.function.decorators)
            }
            ClassMember::ClassProp(prop) if !prop.is_static => {
                let Some(name) = prop_name(&prop.key) else {
                    continue;
                };
                let span = match prop.value.as_deref().map(unwrap_parens) {
                    Some(Expr::Arrow(arrow)) => (HandlerKind::Arrow, arrow.span),
                    Some(Expr::Fn(function)) => (HandlerKind::Function, function.function.span),
                    _ => continue,
                };
                (name, span.0, span.1, &prop.decorators)
            }
            _ => continue,
        };

        let Some(verb) = HttpMethod::from_handler_name(&method_name) else {
            continue;
        };
        let Some(source) = file.text(span) else {
            warn!("Could not read the source of {}.{}", route.name, method_name);
            continue;
        };

        route
            .methods
            .insert(verb, HandlerDefinition::new(Some(&method_name), kind, source));
        if let Some(docs) = docs_from_decorators(decorators) {
            route.explicit_docs.insert(verb, docs);
        }
    }

    route
}

fn docs_from_decorators(decorators: &[Decorator]) -> Option<OperationOverride> {
    decorators.iter().find_map(|decorator| {
        let Expr::Call(call) = unwrap_parens(&decorator.expr) else {
            return None;
        };
        if callee_name(&call.callee)? != "docs" {
            return None;
        }
        match literal_to_json(&call.args.first()?.expr) {
            Some(Value::Object(map)) => Some(map),
            _ => {
                warn!("Ignoring @docs decorator whose argument is not a literal object");
                None
            }
        }
    })
}

/// Statically evaluates a literal expression into JSON.
///
/// Object entries whose value is not a literal are left out.
pub fn literal_to_json(expr: &Expr) -> Option<Value> {
    match unwrap_parens(expr) {
        Expr::Lit(Lit::Str(s)) => Some(Value::String(s.value.to_string())),
        Expr::Lit(Lit::Num(n)) => Some(number_value(n.value)),
        Expr::Lit(Lit::Bool(b)) => Some(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Some(Value::Null),
        Expr::Tpl(_) => string_literal(expr).map(Value::String),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match unwrap_parens(&unary.arg) {
            Expr::Lit(Lit::Num(n)) => Some(number_value(-n.value)),
            _ => None,
        },
        Expr::Array(array) => Some(Value::Array(
            array
                .elems
                .iter()
                .flatten()
                .filter(|element| element.spread.is_none())
                .filter_map(|element| literal_to_json(&element.expr))
                .collect(),
        )),
        Expr::Object(object) => {
            let mut map = Map::new();
            for prop in &object.props {
                match prop {
                    PropOrSpread::Prop(prop) => {
                        if let Prop::KeyValue(kv) = &**prop {
                            if let (Some(key), Some(value)) =
                                (prop_name(&kv.key), literal_to_json(&kv.value))
                            {
                                map.insert(key, value);
                            }
                        }
                    }
                    PropOrSpread::Spread(spread) => {
                        if let Some(Value::Object(inner)) = literal_to_json(&spread.expr) {
                            map.extend(inner);
                        }
                    }
                }
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_parens(&paren.expr),
        Expr::TsAs(as_expr) => unwrap_parens(&as_expr.expr),
        Expr::TsConstAssertion(assertion) => unwrap_parens(&assertion.expr),
        Expr::TsSatisfies(satisfies) => unwrap_parens(&satisfies.expr),
        _ => expr,
    }
}

/// Name of a called function, either `name(...)` or `something.name(...)`.
fn callee_name(callee: &Callee) -> Option<&str> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    match unwrap_parens(expr) {
        Expr::Ident(ident) => Some(&*ident.sym),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(ident) => Some(&*ident.sym),
            _ => None,
        },
        _ => None,
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match unwrap_parens(expr) {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl.quasis.first().map(|q| q.raw.to_string()),
        _ => None,
    }
}

pub(crate) fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Num(n) => Some(match number_value(n.value) {
            Value::Number(number) => number.to_string(),
            _ => n.value.to_string(),
        }),
        _ => None,
    }
}
