//! Return statement collection.

use crate::parser::ParsedFile;
use indexmap::IndexMap;
use log::debug;
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, Class, Decl, Expr, Function, ModuleItem, Pat, ReturnStmt, Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Collects every `return <expr>` below a node, nested closures included.
#[derive(Default)]
struct ReturnCollector {
    returns: Vec<Box<Expr>>,
}

impl Visit for ReturnCollector {
    fn visit_return_stmt(&mut self, n: &ReturnStmt) {
        if let Some(arg) = &n.arg {
            self.returns.push(arg.clone());
        }
        n.visit_children_with(self);
    }
}

/// Collects the return statements that belong to one function body.
#[derive(Default)]
struct OwnReturns {
    returns: Vec<Option<Box<Expr>>>,
}

impl Visit for OwnReturns {
    fn visit_return_stmt(&mut self, n: &ReturnStmt) {
        self.returns.push(n.arg.clone());
    }

    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}
}

/// Returned expressions of every top-level declaration of a file, keyed by
/// declaration name, in source order.
///
/// Function declarations and variable declarators with a plain identifier name are
/// considered. A bare `return;` carries no value and is left out.
pub fn collect_returns(file: &ParsedFile) -> IndexMap<String, Vec<Box<Expr>>> {
    let mut found = IndexMap::new();

    for item in &file.module.body {
        let ModuleItem::Stmt(Stmt::Decl(decl)) = item else {
            continue;
        };
        match decl {
            Decl::Fn(fn_decl) => {
                let mut collector = ReturnCollector::default();
                fn_decl.function.visit_with(&mut collector);
                found.insert(fn_decl.ident.sym.to_string(), collector.returns);
            }
            Decl::Var(var) => {
                for declarator in &var.decls {
                    let Pat::Ident(name) = &declarator.name else {
                        continue;
                    };
                    let mut collector = ReturnCollector::default();
                    declarator.visit_with(&mut collector);
                    found.insert(name.id.sym.to_string(), collector.returns);
                }
            }
            _ => {}
        }
    }

    debug!("Collected return statements of {} declarations", found.len());
    found
}

/// Arguments of the return statements of a function body, excluding nested
/// functions. A bare `return;` yields `None`.
pub fn own_returns(body: &BlockStmt) -> Vec<Option<Box<Expr>>> {
    let mut collector = OwnReturns::default();
    body.visit_with(&mut collector);
    collector.returns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use swc_common::Spanned;

    fn returns_of(code: &str) -> IndexMap<String, Vec<String>> {
        let parser = AstParser::new();
        let parsed = parser.parse_source("generated.ts", code).unwrap();
        collect_returns(&parsed)
            .into_iter()
            .map(|(name, exprs)| {
                let texts = exprs
                    .iter()
                    .map(|expr| parsed.text(expr.span()).unwrap().to_string())
                    .collect();
                (name, texts)
            })
            .collect()
    }

    #[test]
    fn test_returns_in_source_order() {
        let returns = returns_of(
            "function Home_get(ok: boolean) {\n  if (ok) { return a; }\n  else { return b; }\n}",
        );

        assert_eq!(returns["Home_get"], vec!["a", "b"]);
    }

    #[test]
    fn test_nested_closure_returns_are_included() {
        let returns = returns_of(
            "const Home_get = () => {\n  const inner = () => { return 1; };\n  return inner();\n};",
        );

        assert_eq!(returns["Home_get"], vec!["1", "inner()"]);
    }

    #[test]
    fn test_bare_return_is_excluded() {
        let returns = returns_of("function Home_get(x: number) { if (x) return; return x; }");

        assert_eq!(returns["Home_get"], vec!["x"]);
    }

    #[test]
    fn test_declarations_without_returns_are_listed_empty() {
        let returns = returns_of("import { a } from 'a';\nconst Home_put = () => 1;");

        assert_eq!(returns.len(), 1);
        assert!(returns["Home_put"].is_empty());
    }

    #[test]
    fn test_own_returns_skip_nested_functions() {
        let parser = AstParser::new();
        let parsed = parser
            .parse_source(
                "a.ts",
                "function f() { const g = () => { return 1; }; if (x) return; return 'a'; }",
            )
            .unwrap();
        let ModuleItem::Stmt(Stmt::Decl(Decl::Fn(f))) = &parsed.module.body[0] else {
            panic!("expected a function");
        };

        let returns = own_returns(f.function.body.as_ref().unwrap());

        assert_eq!(returns.len(), 2);
        assert!(returns[0].is_none());
        assert!(returns[1].is_some());
    }
}
