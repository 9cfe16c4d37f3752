//! Declarations and lexical scopes of the virtual file set.
//!
//! Every file is walked once. Declarations are stored in an arena and referenced by
//! [`DeclId`]; the AST parts they need later are cloned into `Rc`s and keep their
//! original spans, so identifiers inside them still resolve through [`Scope`] spans.

use crate::extractor::futen::prop_name;
use crate::parser::ParsedFile;
use indexmap::IndexMap;
use std::rc::Rc;
use swc_common::Span;
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, CatchClause, Class, ClassDecl, Constructor, DefaultDecl, ExportAll,
    ExportDecl, ExportDefaultDecl, ExportDefaultExpr, ExportSpecifier, Expr, FnDecl, ForInStmt,
    ForOfStmt, ForStmt, Function, Ident, ImportDecl, ImportSpecifier, ModuleExportName,
    ModuleItem, NamedExport, ObjectPatProp, ParamOrTsParamProp, Pat, TsCallSignatureDecl,
    TsConstructSignatureDecl, TsConstructorType, TsEnumDecl, TsExportAssignment, TsFnType,
    TsImportEqualsDecl, TsInterfaceDecl, TsMethodSignature, TsModuleDecl, TsModuleName,
    TsModuleRef, TsNamespaceBody, TsParamPropParam, TsType, TsTypeAliasDecl, TsTypeParamDecl,
    VarDecl, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

pub type DeclId = usize;
pub type ScopeId = usize;
pub type FileId = usize;
pub type ModuleId = usize;

/// Scope holding the default library, script files and `declare global` blocks.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Default)]
pub struct Scope {
    pub span: Span,
    pub parent: Option<ScopeId>,
    /// Value namespace
    pub values: IndexMap<String, Vec<DeclId>>,
    /// Type namespace
    pub types: IndexMap<String, Vec<DeclId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    Named(String),
    Default,
    Namespace,
}

/// One step from a destructuring source to a bound name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingStep {
    Key(String),
    Index(usize),
    Rest,
}

/// Where the value of a destructuring pattern comes from.
#[derive(Debug, Clone)]
pub enum BindingSource {
    Init(Rc<Expr>),
    Annotation(Rc<TsType>),
    Unknown,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    /// `const name = init`
    Variable {
        name: String,
        declarator: Rc<VarDeclarator>,
    },
    /// A name bound inside a destructuring pattern
    Binding {
        name: String,
        source: BindingSource,
        path: Vec<BindingStep>,
        default: Option<Rc<Expr>>,
    },
    Parameter {
        name: String,
        annotation: Option<Rc<TsType>>,
        default: Option<Rc<Expr>>,
        optional: bool,
        rest: bool,
    },
    Function {
        name: String,
        function: Rc<Function>,
    },
    Class {
        name: String,
        class: Rc<Class>,
    },
    Interface {
        name: String,
        decl: Rc<TsInterfaceDecl>,
    },
    TypeAlias {
        name: String,
        decl: Rc<TsTypeAliasDecl>,
    },
    Enum {
        name: String,
        decl: Rc<TsEnumDecl>,
    },
    Namespace {
        name: String,
        scope: ScopeId,
    },
    Import {
        local: String,
        imported: Imported,
        module: String,
        file: FileId,
    },
    TypeParameter {
        name: String,
    },
    /// `export default <expression>`
    DefaultExport {
        expr: Rc<Expr>,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Variable { name, .. }
            | Declaration::Binding { name, .. }
            | Declaration::Parameter { name, .. }
            | Declaration::Function { name, .. }
            | Declaration::Class { name, .. }
            | Declaration::Interface { name, .. }
            | Declaration::TypeAlias { name, .. }
            | Declaration::Enum { name, .. }
            | Declaration::Namespace { name, .. }
            | Declaration::TypeParameter { name } => name,
            Declaration::Import { local, .. } => local,
            Declaration::DefaultExport { .. } => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Export {
    /// A name declared in the module's own scope
    Local(String),
    /// `export { name } from 'module'`
    Reexport { module: String, name: String },
    /// A declaration that has no local name
    Declaration(DeclId),
}

/// A source file with imports/exports, or a `declare module "name"` block.
#[derive(Debug, Default)]
pub struct ModuleInfo {
    /// File the module is declared in; relative specifiers resolve against it
    pub file: FileId,
    pub scope: ScopeId,
    pub exports: IndexMap<String, Export>,
    pub star_exports: Vec<String>,
    /// Name given to `export =`
    pub export_equals: Option<String>,
}

#[derive(Debug, Default)]
pub struct BoundProgram {
    pub declarations: Vec<Declaration>,
    pub scopes: Vec<Scope>,
    pub modules: Vec<ModuleInfo>,
    /// Module of each file; script files have none
    pub file_modules: Vec<Option<ModuleId>>,
    /// Scopes created inside each file
    pub file_scopes: Vec<Vec<ScopeId>>,
    /// `declare module "name"` blocks by module name
    pub ambient_modules: IndexMap<String, ModuleId>,
}

impl BoundProgram {
    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id]
    }

    fn add_scope(&mut self, file: FileId, span: Span, parent: Option<ScopeId>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            span,
            parent,
            ..Default::default()
        });
        self.file_scopes[file].push(id);
        id
    }
}

/// Binds every file. File ids are indices into `files`.
pub fn bind(files: &[ParsedFile]) -> BoundProgram {
    let mut program = BoundProgram::default();
    program.scopes.push(Scope::default());

    for (file_id, file) in files.iter().enumerate() {
        program.file_scopes.push(Vec::new());

        let is_module = file
            .module
            .body
            .iter()
            .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));

        let (root, module) = if is_module {
            let span = Span::new(file.source.start_pos, file.source.end_pos, Default::default());
            let scope = program.add_scope(file_id, span, Some(GLOBAL_SCOPE));
            let module = program.modules.len();
            program.modules.push(ModuleInfo {
                file: file_id,
                scope,
                ..Default::default()
            });
            (scope, Some(module))
        } else {
            (GLOBAL_SCOPE, None)
        };
        program.file_modules.push(module);

        let mut binder = FileBinder {
            program: &mut program,
            file: file_id,
            stack: vec![root],
            current_module: module,
        };
        file.module.visit_with(&mut binder);
    }

    program
}

/// What introduced a binding pattern.
#[derive(Clone)]
enum Top {
    Var(Rc<VarDeclarator>),
    Param,
}

struct FileBinder<'p> {
    program: &'p mut BoundProgram,
    file: FileId,
    stack: Vec<ScopeId>,
    /// Module receiving `export` statements; none inside namespaces and scripts
    current_module: Option<ModuleId>,
}

impl FileBinder<'_> {
    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(GLOBAL_SCOPE)
    }

    fn enter(&mut self, span: Span) -> ScopeId {
        let parent = self.current();
        let scope = self.program.add_scope(self.file, span, Some(parent));
        self.stack.push(scope);
        scope
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    fn add(&mut self, decl: Declaration) -> DeclId {
        self.program.declarations.push(decl);
        self.program.declarations.len() - 1
    }

    fn declare(&mut self, decl: Declaration, value: bool, ty: bool) -> DeclId {
        let name = decl.name().to_string();
        let id = self.add(decl);
        let current = self.current();
        let scope = &mut self.program.scopes[current];
        if value {
            scope.values.entry(name.clone()).or_default().push(id);
        }
        if ty {
            scope.types.entry(name).or_default().push(id);
        }
        id
    }

    fn export(&mut self, name: String, export: Export) {
        if let Some(module) = self.current_module {
            self.program.modules[module].exports.insert(name, export);
        }
    }

    fn declare_type_params(&mut self, params: Option<&TsTypeParamDecl>) {
        for param in params.into_iter().flat_map(|p| &p.params) {
            self.declare(
                Declaration::TypeParameter {
                    name: param.name.sym.to_string(),
                },
                false,
                true,
            );
        }
    }

    fn bind_param(&mut self, pat: &Pat) {
        let source = match pat_annotation(pat) {
            Some(annotation) => BindingSource::Annotation(Rc::new(annotation.clone())),
            None => match pat {
                Pat::Assign(assign) => BindingSource::Init(Rc::new((*assign.right).clone())),
                _ => BindingSource::Unknown,
            },
        };
        self.declare_pattern(pat, &Top::Param, &source, Vec::new(), None);
    }

    fn declare_pattern(
        &mut self,
        pat: &Pat,
        top: &Top,
        source: &BindingSource,
        path: Vec<BindingStep>,
        default: Option<Rc<Expr>>,
    ) {
        match pat {
            Pat::Ident(binding) => {
                let name = binding.id.sym.to_string();
                let decl = match top {
                    Top::Var(declarator) if path.is_empty() => Declaration::Variable {
                        name,
                        declarator: declarator.clone(),
                    },
                    Top::Param if path.is_empty() => Declaration::Parameter {
                        name,
                        annotation: binding
                            .type_ann
                            .as_ref()
                            .map(|ann| Rc::new((*ann.type_ann).clone())),
                        optional: binding.id.optional || default.is_some(),
                        default,
                        rest: false,
                    },
                    _ => Declaration::Binding {
                        name,
                        source: source.clone(),
                        path,
                        default,
                    },
                };
                self.declare(decl, true, false);
            }
            Pat::Assign(assign) => {
                let default = Some(Rc::new((*assign.right).clone()));
                self.declare_pattern(&assign.left, top, source, path, default);
            }
            Pat::Rest(rest) => match (&*rest.arg, top) {
                (Pat::Ident(binding), Top::Param) if path.is_empty() => {
                    let annotation = rest.type_ann.as_ref().or(binding.type_ann.as_ref());
                    self.declare(
                        Declaration::Parameter {
                            name: binding.id.sym.to_string(),
                            annotation: annotation.map(|ann| Rc::new((*ann.type_ann).clone())),
                            default: None,
                            optional: true,
                            rest: true,
                        },
                        true,
                        false,
                    );
                }
                _ => {
                    let mut path = path;
                    path.push(BindingStep::Rest);
                    self.declare_pattern(&rest.arg, top, source, path, None);
                }
            },
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            let Some(key) = prop_name(&kv.key) else {
                                continue;
                            };
                            let mut path = path.clone();
                            path.push(BindingStep::Key(key));
                            self.declare_pattern(&kv.value, top, source, path, None);
                        }
                        ObjectPatProp::Assign(assign) => {
                            let key: &Ident = &assign.key;
                            let mut path = path.clone();
                            path.push(BindingStep::Key(key.sym.to_string()));
                            self.declare(
                                Declaration::Binding {
                                    name: key.sym.to_string(),
                                    source: source.clone(),
                                    path,
                                    default: assign.value.as_ref().map(|v| Rc::new((**v).clone())),
                                },
                                true,
                                false,
                            );
                        }
                        ObjectPatProp::Rest(rest) => {
                            let mut path = path.clone();
                            path.push(BindingStep::Rest);
                            self.declare_pattern(&rest.arg, top, source, path, None);
                        }
                    }
                }
            }
            Pat::Array(array) => {
                for (index, elem) in array.elems.iter().enumerate() {
                    if let Some(elem) = elem {
                        let mut path = path.clone();
                        path.push(BindingStep::Index(index));
                        self.declare_pattern(elem, top, source, path, None);
                    }
                }
            }
            Pat::Expr(_) | Pat::Invalid(_) => {}
        }
    }

    fn bind_namespace(&mut self, id: &Ident, body: Option<&TsNamespaceBody>, span: Span) {
        let parent = self.current();
        let scope = self.program.add_scope(self.file, span, Some(parent));
        self.declare(
            Declaration::Namespace {
                name: id.sym.to_string(),
                scope,
            },
            true,
            true,
        );

        let previous = self.current_module.take();
        self.stack.push(scope);
        match body {
            Some(TsNamespaceBody::TsModuleBlock(block)) => block.visit_with(self),
            Some(TsNamespaceBody::TsNamespaceDecl(inner)) => {
                self.bind_namespace(&inner.id, Some(&*inner.body), inner.span)
            }
            None => {}
        }
        self.leave();
        self.current_module = previous;
    }
}

impl Visit for FileBinder<'_> {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let module = n.src.value.to_string();
        for specifier in &n.specifiers {
            let (local, imported) = match specifier {
                ImportSpecifier::Named(named) => {
                    let imported = named
                        .imported
                        .as_ref()
                        .map(export_name)
                        .unwrap_or_else(|| named.local.sym.to_string());
                    (&named.local, Imported::Named(imported))
                }
                ImportSpecifier::Default(default) => (&default.local, Imported::Default),
                ImportSpecifier::Namespace(namespace) => (&namespace.local, Imported::Namespace),
            };
            self.declare(
                Declaration::Import {
                    local: local.sym.to_string(),
                    imported,
                    module: module.clone(),
                    file: self.file,
                },
                true,
                true,
            );
        }
    }

    fn visit_ts_import_equals_decl(&mut self, n: &TsImportEqualsDecl) {
        if let TsModuleRef::TsExternalModuleRef(external) = &n.module_ref {
            self.declare(
                Declaration::Import {
                    local: n.id.sym.to_string(),
                    imported: Imported::Namespace,
                    module: external.expr.value.to_string(),
                    file: self.file,
                },
                true,
                true,
            );
        }
    }

    fn visit_export_decl(&mut self, n: &ExportDecl) {
        let mut names = Vec::new();
        match &n.decl {
            swc_ecma_ast::Decl::Class(class) => names.push(class.ident.sym.to_string()),
            swc_ecma_ast::Decl::Fn(function) => names.push(function.ident.sym.to_string()),
            swc_ecma_ast::Decl::Var(var) => {
                for declarator in &var.decls {
                    pattern_names(&declarator.name, &mut names);
                }
            }
            swc_ecma_ast::Decl::TsInterface(decl) => names.push(decl.id.sym.to_string()),
            swc_ecma_ast::Decl::TsTypeAlias(decl) => names.push(decl.id.sym.to_string()),
            swc_ecma_ast::Decl::TsEnum(decl) => names.push(decl.id.sym.to_string()),
            swc_ecma_ast::Decl::TsModule(decl) => {
                if let TsModuleName::Ident(id) = &decl.id {
                    names.push(id.sym.to_string());
                }
            }
            _ => {}
        }
        for name in names {
            self.export(name.clone(), Export::Local(name));
        }
        n.visit_children_with(self);
    }

    fn visit_named_export(&mut self, n: &NamedExport) {
        let source = n.src.as_ref().map(|src| src.value.to_string());
        for specifier in &n.specifiers {
            match specifier {
                ExportSpecifier::Named(named) => {
                    let original = export_name(&named.orig);
                    let exported = named
                        .exported
                        .as_ref()
                        .map(export_name)
                        .unwrap_or_else(|| original.clone());
                    let export = match &source {
                        Some(module) => Export::Reexport {
                            module: module.clone(),
                            name: original,
                        },
                        None => Export::Local(original),
                    };
                    self.export(exported, export);
                }
                ExportSpecifier::Namespace(namespace) => {
                    let Some(module) = &source else {
                        continue;
                    };
                    let exported = export_name(&namespace.name);
                    let id = self.add(Declaration::Import {
                        local: exported.clone(),
                        imported: Imported::Namespace,
                        module: module.clone(),
                        file: self.file,
                    });
                    self.export(exported, Export::Declaration(id));
                }
                ExportSpecifier::Default(default) => {
                    if let Some(module) = &source {
                        self.export(
                            default.exported.sym.to_string(),
                            Export::Reexport {
                                module: module.clone(),
                                name: "default".to_string(),
                            },
                        );
                    }
                }
            }
        }
    }

    fn visit_export_all(&mut self, n: &ExportAll) {
        if let Some(module) = self.current_module {
            self.program.modules[module]
                .star_exports
                .push(n.src.value.to_string());
        }
    }

    fn visit_export_default_decl(&mut self, n: &ExportDefaultDecl) {
        let id = match &n.decl {
            DefaultDecl::Class(class) => {
                let name = class
                    .ident
                    .as_ref()
                    .map_or("default".to_string(), |i| i.sym.to_string());
                let decl = Declaration::Class {
                    name,
                    class: Rc::new((*class.class).clone()),
                };
                if class.ident.is_some() {
                    self.declare(decl, true, true)
                } else {
                    self.add(decl)
                }
            }
            DefaultDecl::Fn(function) => {
                let name = function
                    .ident
                    .as_ref()
                    .map_or("default".to_string(), |i| i.sym.to_string());
                let decl = Declaration::Function {
                    name,
                    function: Rc::new((*function.function).clone()),
                };
                if function.ident.is_some() {
                    self.declare(decl, true, false)
                } else {
                    self.add(decl)
                }
            }
            DefaultDecl::TsInterfaceDecl(decl) => self.declare(
                Declaration::Interface {
                    name: decl.id.sym.to_string(),
                    decl: Rc::new((**decl).clone()),
                },
                false,
                true,
            ),
        };
        self.export("default".to_string(), Export::Declaration(id));
        n.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, n: &ExportDefaultExpr) {
        match &*n.expr {
            Expr::Ident(ident) => {
                self.export("default".to_string(), Export::Local(ident.sym.to_string()))
            }
            expr => {
                let id = self.add(Declaration::DefaultExport {
                    expr: Rc::new(expr.clone()),
                });
                self.export("default".to_string(), Export::Declaration(id));
            }
        }
        n.visit_children_with(self);
    }

    fn visit_ts_export_assignment(&mut self, n: &TsExportAssignment) {
        if let Expr::Ident(ident) = &*n.expr {
            let name = ident.sym.to_string();
            if let Some(module) = self.current_module {
                self.program.modules[module].export_equals = Some(name.clone());
            }
            self.export("default".to_string(), Export::Local(name));
        }
    }

    fn visit_ts_module_decl(&mut self, n: &TsModuleDecl) {
        if n.global {
            let previous = self.current_module.take();
            self.stack.push(GLOBAL_SCOPE);
            if let Some(body) = &n.body {
                body.visit_with(self);
            }
            self.stack.pop();
            self.current_module = previous;
            return;
        }

        match &n.id {
            TsModuleName::Str(name) => {
                let scope = self.enter(n.span);
                let module = self.program.modules.len();
                self.program.modules.push(ModuleInfo {
                    file: self.file,
                    scope,
                    ..Default::default()
                });
                self.program
                    .ambient_modules
                    .entry(name.value.to_string())
                    .or_insert(module);

                let previous = self.current_module.replace(module);
                if let Some(body) = &n.body {
                    body.visit_with(self);
                }
                self.current_module = previous;
                self.leave();

                // Everything declared in an ambient module is visible to importers.
                let scope = &self.program.scopes[scope];
                let names: Vec<String> =
                    scope.values.keys().chain(scope.types.keys()).cloned().collect();
                let info = &mut self.program.modules[module];
                for name in names {
                    info.exports.entry(name.clone()).or_insert(Export::Local(name));
                }
            }
            TsModuleName::Ident(id) => self.bind_namespace(id, n.body.as_ref(), n.span),
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.declare(
            Declaration::Function {
                name: n.ident.sym.to_string(),
                function: Rc::new((*n.function).clone()),
            },
            true,
            false,
        );
        n.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(
            Declaration::Class {
                name: n.ident.sym.to_string(),
                class: Rc::new((*n.class).clone()),
            },
            true,
            true,
        );
        n.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        for declarator in &n.decls {
            let source = match pat_annotation(&declarator.name) {
                Some(annotation) => BindingSource::Annotation(Rc::new(annotation.clone())),
                None => declarator
                    .init
                    .as_ref()
                    .map_or(BindingSource::Unknown, |init| {
                        BindingSource::Init(Rc::new((**init).clone()))
                    }),
            };
            let top = Top::Var(Rc::new(declarator.clone()));
            self.declare_pattern(&declarator.name, &top, &source, Vec::new(), None);
        }
        n.visit_children_with(self);
    }

    fn visit_ts_interface_decl(&mut self, n: &TsInterfaceDecl) {
        self.declare(
            Declaration::Interface {
                name: n.id.sym.to_string(),
                decl: Rc::new(n.clone()),
            },
            false,
            true,
        );
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_type_alias_decl(&mut self, n: &TsTypeAliasDecl) {
        self.declare(
            Declaration::TypeAlias {
                name: n.id.sym.to_string(),
                decl: Rc::new(n.clone()),
            },
            false,
            true,
        );
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_enum_decl(&mut self, n: &TsEnumDecl) {
        self.declare(
            Declaration::Enum {
                name: n.id.sym.to_string(),
                decl: Rc::new(n.clone()),
            },
            true,
            true,
        );
    }

    fn visit_function(&mut self, n: &Function) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        for param in &n.params {
            self.bind_param(&param.pat);
        }
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        for param in &n.params {
            self.bind_param(param);
        }
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        self.enter(n.span);
        for param in &n.params {
            match param {
                ParamOrTsParamProp::Param(param) => self.bind_param(&param.pat),
                ParamOrTsParamProp::TsParamProp(prop) => {
                    if let TsParamPropParam::Ident(binding) = &prop.param {
                        self.bind_param(&Pat::Ident(binding.clone()));
                    }
                }
            }
        }
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_class(&mut self, n: &Class) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.enter(n.span);
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        self.enter(n.span);
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        self.enter(n.span);
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.enter(n.span);
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.enter(n.span);
        if let Some(param) = &n.param {
            self.bind_param(param);
        }
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_method_signature(&mut self, n: &TsMethodSignature) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_call_signature_decl(&mut self, n: &TsCallSignatureDecl) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_construct_signature_decl(&mut self, n: &TsConstructSignatureDecl) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_fn_type(&mut self, n: &TsFnType) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }

    fn visit_ts_constructor_type(&mut self, n: &TsConstructorType) {
        self.enter(n.span);
        self.declare_type_params(n.type_params.as_deref());
        n.visit_children_with(self);
        self.leave();
    }
}

/// Type annotation written directly on a pattern.
pub fn pat_annotation(pat: &Pat) -> Option<&TsType> {
    let annotation = match pat {
        Pat::Ident(binding) => binding.type_ann.as_ref(),
        Pat::Object(object) => object.type_ann.as_ref(),
        Pat::Array(array) => array.type_ann.as_ref(),
        Pat::Rest(rest) => rest.type_ann.as_ref(),
        Pat::Assign(assign) => return pat_annotation(&assign.left),
        _ => None,
    };
    annotation.map(|ann| &*ann.type_ann)
}

fn pattern_names(pat: &Pat, names: &mut Vec<String>) {
    match pat {
        Pat::Ident(binding) => names.push(binding.id.sym.to_string()),
        Pat::Assign(assign) => pattern_names(&assign.left, names),
        Pat::Rest(rest) => pattern_names(&rest.arg, names),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pattern_names(&kv.value, names),
                    ObjectPatProp::Assign(assign) => {
                        let key: &Ident = &assign.key;
                        names.push(key.sym.to_string());
                    }
                    ObjectPatProp::Rest(rest) => pattern_names(&rest.arg, names),
                }
            }
        }
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pattern_names(elem, names);
            }
        }
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}
