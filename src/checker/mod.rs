//! A shallow TypeScript checker.
//!
//! The checker answers the questions the shape resolver asks about the synthetic
//! program: what type an expression has, which signature a call resolves to, what an
//! identifier was declared as and what an import aliases. It understands declarations,
//! generics, overloads and module resolution well enough for handler code; anything
//! beyond that degrades to `any`.
//!
//! # Example
//!
//! ```no_run
//! use futen_openapi::checker::{self, Checker};
//! use futen_openapi::parser::AstParser;
//! use indexmap::IndexMap;
//!
//! let parser = AstParser::new();
//! let prelude = checker::prelude();
//! let files = vec![
//!     parser.parse_source(&prelude.name, &prelude.content).unwrap(),
//!     parser.parse_source("generated.ts", "const r = Response.json({ ok: true });").unwrap(),
//! ];
//! let checker = Checker::new(&files, &IndexMap::new());
//! ```

pub mod binder;
mod expressions;
pub mod types;

use crate::modules;
use crate::parser::ParsedFile;
use crate::scanner::SourceText;
use crate::walker;
use binder::{
    pat_annotation, BindingSource, BindingStep, BoundProgram, DeclId, Declaration, Export, FileId,
    Imported, ModuleId, ScopeId, GLOBAL_SCOPE,
};
use indexmap::IndexMap;
use log::debug;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use swc_common::{BytePos, Span};
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, Class, ClassMember, Expr, Function, Ident, Lit,
    MethodKind, ParamOrTsParamProp, Pat, PropName, TsEntityName, TsEnumMemberId, TsFnParam,
    TsKeywordTypeKind, TsLit, TsParamPropParam, TsType, TsTypeAnn, TsTypeElement,
    TsTypeOperatorOp, TsTypeParamDecl, TsTypeParamInstantiation, TsTypeQueryExpr,
    TsUnionOrIntersectionType,
};
pub use types::{
    symbol_name, type_arguments, Member, NamespaceTarget, ObjectType, Param, Signature, Type,
    TypeRef,
};

/// Virtual name of the default library.
pub const PRELUDE_NAME: &str = "lib.d.ts";

const PRELUDE: &str = include_str!("lib.d.ts");

/// Bound on alias, heritage and re-export chains.
const MAX_DEPTH: usize = 16;

/// The default library as a source file.
pub fn prelude() -> SourceText {
    SourceText::new(PRELUDE_NAME, PRELUDE)
}

/// Function body to infer a return type from.
#[derive(Clone, Copy)]
enum Body<'b> {
    Block(&'b BlockStmt),
    Expr(&'b Expr),
}

pub struct Checker<'a> {
    files: &'a [ParsedFile],
    program: BoundProgram,
    file_index: HashMap<&'a str, FileId>,
    package_types: IndexMap<String, String>,
    declaration_types: RefCell<HashMap<DeclId, TypeRef>>,
    /// Declarations and aliases whose type is being computed
    resolving: RefCell<HashSet<DeclId>>,
    /// Function bodies whose return type is being inferred
    inferring: RefCell<HashSet<BytePos>>,
}

impl<'a> Checker<'a> {
    /// Binds the files. `package_types` maps package names to their declaration entry.
    pub fn new(files: &'a [ParsedFile], package_types: &IndexMap<String, String>) -> Self {
        let program = binder::bind(files);
        debug!(
            "Bound {} files: {} declarations, {} scopes, {} modules",
            files.len(),
            program.declarations.len(),
            program.scopes.len(),
            program.modules.len()
        );
        Self {
            files,
            program,
            file_index: files
                .iter()
                .enumerate()
                .map(|(id, file)| (file.name.as_str(), id))
                .collect(),
            package_types: package_types.clone(),
            declaration_types: RefCell::new(HashMap::new()),
            resolving: RefCell::new(HashSet::new()),
            inferring: RefCell::new(HashSet::new()),
        }
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        self.program.declaration(id)
    }

    pub fn file(&self, name: &str) -> Option<&'a ParsedFile> {
        self.file_index.get(name).map(|&id| &self.files[id])
    }

    /// Source text covered by a span of any file.
    pub fn source_text(&self, span: Span) -> Option<&'a str> {
        self.file_of(span).and_then(|id| self.files[id].text(span))
    }

    pub fn type_to_string(&self, ty: &TypeRef) -> String {
        ty.to_string()
    }

    fn file_of(&self, span: Span) -> Option<FileId> {
        let index = self
            .files
            .partition_point(|file| file.source.start_pos <= span.lo);
        if index > 0 && self.files[index - 1].contains(span) {
            return Some(index - 1);
        }
        self.files.iter().position(|file| file.contains(span))
    }

    /// Innermost scope enclosing a span.
    fn scope_at(&self, span: Span) -> ScopeId {
        let Some(file) = self.file_of(span) else {
            return GLOBAL_SCOPE;
        };
        self.program.file_scopes[file]
            .iter()
            .copied()
            .filter(|&id| {
                let scope = self.program.scopes[id].span;
                scope.lo <= span.lo && span.hi <= scope.hi
            })
            .min_by_key(|&id| {
                let scope = self.program.scopes[id].span;
                (scope.hi.0 - scope.lo.0, Reverse(id))
            })
            .unwrap_or(GLOBAL_SCOPE)
    }

    fn lookup_from(&self, scope: ScopeId, name: &str, types: bool) -> Vec<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.program.scopes[id];
            let table = if types { &scope.types } else { &scope.values };
            if let Some(found) = table.get(name) {
                return found.clone();
            }
            current = scope.parent;
        }
        Vec::new()
    }

    fn lookup(&self, name: &str, at: Span, types: bool) -> Vec<DeclId> {
        self.lookup_from(self.scope_at(at), name, types)
    }

    fn global_types(&self, name: &str) -> Vec<DeclId> {
        self.lookup_from(GLOBAL_SCOPE, name, true)
    }

    fn named_global(&self, name: &str, args: Vec<TypeRef>) -> TypeRef {
        Type::reference(name, self.global_types(name), args)
    }

    /// Declarations an identifier in value position refers to.
    pub fn declarations_of(&self, ident: &Ident) -> Vec<DeclId> {
        self.lookup(&ident.sym, ident.span, false)
    }

    /// Resolves a module specifier as written in `from`.
    pub fn resolve_module(&self, from: FileId, specifier: &str) -> Option<ModuleId> {
        let resolved = if modules::is_relative(specifier) || specifier.starts_with('/') {
            let importer = &self.files.get(from)?.name;
            modules::resolve_path(importer, specifier, |candidate| {
                self.file_index.contains_key(candidate)
            })
        } else {
            if let Some(&module) = self.program.ambient_modules.get(specifier) {
                return Some(module);
            }
            self.resolve_package(specifier)
        };
        let file = resolved?;
        self.program.file_modules[*self.file_index.get(file.as_str())?]
    }

    fn resolve_package(&self, specifier: &str) -> Option<String> {
        let (package, subpath) = modules::split_package(specifier);
        let types_package =
            format!("@types/{}", package.trim_start_matches('@').replace('/', "__"));

        let mut roots = Vec::new();
        match subpath {
            Some(subpath) => {
                roots.push(format!("{}/{}", package, subpath));
                roots.push(format!("{}/{}", types_package, subpath));
            }
            None => {
                if let Some(entry) = self.package_types.get(package) {
                    roots.push(entry.clone());
                }
                roots.push(format!("{}/index", package));
                roots.push(format!("{}/index", types_package));
            }
        }

        roots
            .iter()
            .flat_map(|root| modules::candidates(root))
            .find(|candidate| self.file_index.contains_key(candidate.as_str()))
    }

    /// Declarations a module exports under `name`.
    pub fn export_declarations(&self, module: ModuleId, name: &str) -> Vec<DeclId> {
        self.exports_inner(module, name, 0)
    }

    fn exports_inner(&self, module: ModuleId, name: &str, depth: usize) -> Vec<DeclId> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let info = &self.program.modules[module];

        if let Some(export) = info.exports.get(name) {
            return match export {
                Export::Local(local) => self.scope_declarations(info.scope, local),
                Export::Reexport { module: specifier, name: original } => self
                    .resolve_module(info.file, specifier)
                    .map(|target| self.exports_inner(target, original, depth + 1))
                    .unwrap_or_default(),
                Export::Declaration(id) => vec![*id],
            };
        }

        if let Some(target) = &info.export_equals {
            for id in self.scope_declarations(info.scope, target) {
                if let Declaration::Namespace { scope, .. } = self.declaration(id) {
                    let found = self.scope_declarations(*scope, name);
                    if !found.is_empty() {
                        return found;
                    }
                }
            }
        }

        if name != "default" {
            for specifier in &info.star_exports {
                if let Some(target) = self.resolve_module(info.file, specifier) {
                    let found = self.exports_inner(target, name, depth + 1);
                    if !found.is_empty() {
                        return found;
                    }
                }
            }
        }
        Vec::new()
    }

    /// Value and type declarations of a name visible from a scope.
    fn scope_declarations(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        let mut found = self.lookup_from(scope, name, false);
        for id in self.lookup_from(scope, name, true) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    /// Follows an import (and re-exported imports) to the declarations it aliases.
    /// Other declarations alias themselves.
    pub fn aliased_declarations(&self, id: DeclId) -> Vec<DeclId> {
        self.aliased_inner(id, 0)
    }

    fn aliased_inner(&self, id: DeclId, depth: usize) -> Vec<DeclId> {
        let Declaration::Import {
            imported,
            module,
            file,
            ..
        } = self.declaration(id)
        else {
            return vec![id];
        };
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        let name = match imported {
            Imported::Named(name) => name.as_str(),
            Imported::Default => "default",
            Imported::Namespace => return vec![id],
        };
        let Some(target) = self.resolve_module(*file, module) else {
            debug!("Unresolved module '{}'", module);
            return Vec::new();
        };
        self.export_declarations(target, name)
            .into_iter()
            .flat_map(|found| self.aliased_inner(found, depth + 1))
            .collect()
    }

    fn is_value(&self, id: DeclId) -> bool {
        !matches!(
            self.declaration(id),
            Declaration::Interface { .. }
                | Declaration::TypeAlias { .. }
                | Declaration::TypeParameter { .. }
        )
    }

    fn is_type(&self, id: DeclId) -> bool {
        !matches!(
            self.declaration(id),
            Declaration::Variable { .. }
                | Declaration::Binding { .. }
                | Declaration::Parameter { .. }
                | Declaration::Function { .. }
                | Declaration::DefaultExport { .. }
        )
    }

    /// Type of one declaration, as seen by its users.
    pub fn type_of_declaration(&self, id: DeclId) -> TypeRef {
        if let Some(ty) = self.declaration_types.borrow().get(&id) {
            return ty.clone();
        }
        if !self.resolving.borrow_mut().insert(id) {
            return Type::any();
        }
        let ty = self.compute_declaration_type(id);
        self.resolving.borrow_mut().remove(&id);
        self.declaration_types.borrow_mut().insert(id, ty.clone());
        ty
    }

    fn compute_declaration_type(&self, id: DeclId) -> TypeRef {
        match self.declaration(id) {
            Declaration::Variable { declarator, .. } => {
                if let Some(annotation) = pat_annotation(&declarator.name) {
                    return self.type_from_node(annotation);
                }
                declarator
                    .init
                    .as_ref()
                    .map_or_else(Type::any, |init| self.type_of_expr(init))
            }
            Declaration::Binding {
                source,
                path,
                default,
                ..
            } => {
                let mut ty = match source {
                    BindingSource::Init(expr) => self.type_of_expr(expr),
                    BindingSource::Annotation(annotation) => self.type_from_node(annotation),
                    BindingSource::Unknown => Type::any(),
                };
                for step in path {
                    ty = match step {
                        BindingStep::Key(key) => {
                            self.property_type(&ty, key).unwrap_or_else(Type::any)
                        }
                        BindingStep::Index(index) => self.element_type(&ty, *index),
                        BindingStep::Rest => ty,
                    };
                }
                match default {
                    Some(default) if ty.is_any() => self.type_of_expr(default),
                    Some(_) => Type::non_nullable(&ty),
                    None => ty,
                }
            }
            Declaration::Parameter {
                annotation,
                default,
                rest,
                ..
            } => match (annotation, default) {
                (Some(annotation), _) => self.type_from_node(annotation),
                (None, Some(default)) => self.type_of_expr(default),
                _ if *rest => Rc::new(Type::Array(Type::any())),
                _ => Type::any(),
            },
            Declaration::Interface { .. }
            | Declaration::TypeAlias { .. }
            | Declaration::TypeParameter { .. } => Type::any(),
            _ => self.type_of_value(&[id]),
        }
    }

    /// Type of a value declared by one or more declarations (overloads, merges).
    pub fn type_of_value(&self, ids: &[DeclId]) -> TypeRef {
        let Some(&first) = ids.first() else {
            return Type::any();
        };
        match self.declaration(first) {
            Declaration::Function { .. } => {
                let functions: Vec<&Rc<Function>> = ids
                    .iter()
                    .filter_map(|&id| match self.declaration(id) {
                        Declaration::Function { function, .. } => Some(function),
                        _ => None,
                    })
                    .collect();
                let has_overloads = functions.iter().any(|f| f.body.is_none());
                Rc::new(Type::Function(
                    functions
                        .into_iter()
                        .filter(|f| !has_overloads || f.body.is_none())
                        .map(|f| self.signature_of_function(f))
                        .collect(),
                ))
            }
            Declaration::Class { name, .. } => Rc::new(Type::Constructor {
                name: name.clone(),
                decls: ids.to_vec(),
            }),
            Declaration::Namespace { name, scope } => Rc::new(Type::Namespace {
                name: name.clone(),
                target: NamespaceTarget::Scope(*scope),
            }),
            Declaration::Enum { name, .. } => Rc::new(Type::Namespace {
                name: name.clone(),
                target: NamespaceTarget::Enum(first),
            }),
            Declaration::Import {
                imported: Imported::Namespace,
                local,
                module,
                file,
            } => match self.resolve_module(*file, module) {
                Some(target) => Rc::new(Type::Namespace {
                    name: local.clone(),
                    target: NamespaceTarget::Module(target),
                }),
                None => Type::any(),
            },
            Declaration::Import { .. } => {
                if !self.resolving.borrow_mut().insert(first) {
                    return Type::any();
                }
                let targets: Vec<DeclId> = self
                    .aliased_declarations(first)
                    .into_iter()
                    .filter(|&id| self.is_value(id))
                    .collect();
                let ty = self.type_of_value(&targets);
                self.resolving.borrow_mut().remove(&first);
                ty
            }
            Declaration::DefaultExport { expr } => self.type_of_expr(expr),
            _ => self.type_of_declaration(first),
        }
    }

    fn element_type(&self, ty: &TypeRef, index: usize) -> TypeRef {
        match &**ty {
            Type::Array(el) => el.clone(),
            Type::Tuple(items) => items.get(index).cloned().unwrap_or_else(Type::any),
            _ => Type::any(),
        }
    }

    /// Resolves a type annotation.
    pub fn type_from_node(&self, node: &TsType) -> TypeRef {
        match node {
            TsType::TsKeywordType(keyword) => Rc::new(match keyword.kind {
                TsKeywordTypeKind::TsAnyKeyword | TsKeywordTypeKind::TsIntrinsicKeyword => {
                    Type::Any
                }
                TsKeywordTypeKind::TsUnknownKeyword => Type::Unknown,
                TsKeywordTypeKind::TsNumberKeyword => Type::Number,
                TsKeywordTypeKind::TsObjectKeyword => Type::NonPrimitive,
                TsKeywordTypeKind::TsBooleanKeyword => Type::Boolean,
                TsKeywordTypeKind::TsBigIntKeyword => Type::BigInt,
                TsKeywordTypeKind::TsStringKeyword => Type::String,
                TsKeywordTypeKind::TsSymbolKeyword => Type::Symbol,
                TsKeywordTypeKind::TsVoidKeyword => Type::Void,
                TsKeywordTypeKind::TsUndefinedKeyword => Type::Undefined,
                TsKeywordTypeKind::TsNullKeyword => Type::Null,
                TsKeywordTypeKind::TsNeverKeyword => Type::Never,
            }),
            TsType::TsThisType(_) => Type::any(),
            TsType::TsFnOrConstructorType(swc_ecma_ast::TsFnOrConstructorType::TsFnType(f)) => {
                Rc::new(Type::Function(vec![self.signature_from_ts(
                    &f.params,
                    f.type_params.as_deref(),
                    Some(&f.type_ann),
                )]))
            }
            TsType::TsFnOrConstructorType(
                swc_ecma_ast::TsFnOrConstructorType::TsConstructorType(c),
            ) => {
                Rc::new(Type::Object(ObjectType {
                    constructs: vec![self.signature_from_ts(
                        &c.params,
                        c.type_params.as_deref(),
                        Some(&c.type_ann),
                    )],
                    ..Default::default()
                }))
            }
            TsType::TsTypeRef(reference) => {
                self.resolve_type_reference(&reference.type_name, reference.type_params.as_deref())
            }
            TsType::TsTypeQuery(query) => match &query.expr_name {
                TsTypeQueryExpr::TsEntityName(name) => self.type_of_entity(name),
                TsTypeQueryExpr::Import(_) => Type::any(),
            },
            TsType::TsTypeLit(literal) => {
                Rc::new(Type::Object(self.type_elements(&literal.members)))
            }
            TsType::TsArrayType(array) => {
                Rc::new(Type::Array(self.type_from_node(&array.elem_type)))
            }
            TsType::TsTupleType(tuple) => Rc::new(Type::Tuple(
                tuple
                    .elem_types
                    .iter()
                    .map(|elem| self.type_from_node(&elem.ty))
                    .collect(),
            )),
            TsType::TsOptionalType(optional) => self.type_from_node(&optional.type_ann),
            TsType::TsRestType(rest) => self.type_from_node(&rest.type_ann),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                Type::union(union.types.iter().map(|t| self.type_from_node(t)))
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => Rc::new(Type::Intersection(
                intersection
                    .types
                    .iter()
                    .map(|t| self.type_from_node(t))
                    .collect(),
            )),
            TsType::TsParenthesizedType(paren) => self.type_from_node(&paren.type_ann),
            TsType::TsTypeOperator(operator) => match operator.op {
                TsTypeOperatorOp::ReadOnly => self.type_from_node(&operator.type_ann),
                TsTypeOperatorOp::KeyOf => Rc::new(Type::String),
                TsTypeOperatorOp::Unique => Rc::new(Type::Symbol),
            },
            TsType::TsIndexedAccessType(access) => {
                let object = self.type_from_node(&access.obj_type);
                match &*access.index_type {
                    TsType::TsLitType(literal) => match &literal.lit {
                        TsLit::Str(key) => {
                            self.property_type(&object, &key.value).unwrap_or_else(Type::any)
                        }
                        TsLit::Number(_) => self.element_type(&object, 0),
                        _ => Type::any(),
                    },
                    TsType::TsKeywordType(keyword)
                        if keyword.kind == TsKeywordTypeKind::TsNumberKeyword =>
                    {
                        self.element_type(&object, 0)
                    }
                    _ => Type::any(),
                }
            }
            TsType::TsLitType(literal) => Rc::new(match literal.lit {
                TsLit::Number(_) => Type::Number,
                TsLit::Str(_) | TsLit::Tpl(_) => Type::String,
                TsLit::Bool(_) => Type::Boolean,
                TsLit::BigInt(_) => Type::BigInt,
            }),
            TsType::TsTypePredicate(_) => Rc::new(Type::Boolean),
            TsType::TsConditionalType(_)
            | TsType::TsInferType(_)
            | TsType::TsMappedType(_)
            | TsType::TsImportType(_) => Type::any(),
        }
    }

    fn resolve_type_reference(
        &self,
        name: &TsEntityName,
        type_args: Option<&TsTypeParamInstantiation>,
    ) -> TypeRef {
        let args: Vec<TypeRef> = type_args
            .map(|args| args.params.iter().map(|t| self.type_from_node(t)).collect())
            .unwrap_or_default();
        let ids = match name {
            TsEntityName::Ident(ident) => self.lookup(&ident.sym, ident.span, true),
            TsEntityName::TsQualifiedName(qualified) => self
                .namespace_targets(&qualified.left)
                .into_iter()
                .flat_map(|target| self.namespace_declarations(target, &qualified.right.sym, true))
                .collect(),
        };
        self.instantiate_named_type(&entity_text(name), &ids, args)
    }

    fn instantiate_named_type(&self, name: &str, ids: &[DeclId], args: Vec<TypeRef>) -> TypeRef {
        let ids: Vec<DeclId> = ids
            .iter()
            .flat_map(|&id| self.aliased_declarations(id))
            .filter(|&id| self.is_type(id))
            .collect();

        if (name == "Array" || name == "ReadonlyArray") && args.len() == 1 {
            return Rc::new(Type::Array(args[0].clone()));
        }

        match ids.first().map(|&id| (id, self.declaration(id))) {
            Some((_, Declaration::TypeParameter { name })) => {
                Rc::new(Type::TypeParam(name.clone()))
            }
            Some((id, Declaration::TypeAlias { decl, .. })) => {
                if !self.resolving.borrow_mut().insert(id) {
                    return Type::reference(name, Vec::new(), args);
                }
                let map = self.type_param_map(decl.type_params.as_deref(), &args);
                let target = types::substitute(&self.type_from_node(&decl.type_ann), &map);
                self.resolving.borrow_mut().remove(&id);

                match &*target {
                    Type::Object(object) if object.alias.is_none() => {
                        let printed = Type::reference(name, Vec::new(), args).to_string();
                        Rc::new(Type::Object(ObjectType {
                            alias: Some(printed),
                            ..object.clone()
                        }))
                    }
                    _ => target,
                }
            }
            Some((_, Declaration::Interface { .. } | Declaration::Class { .. })) => {
                let decls = ids
                    .iter()
                    .copied()
                    .filter(|&id| {
                        matches!(
                            self.declaration(id),
                            Declaration::Interface { .. } | Declaration::Class { .. }
                        )
                    })
                    .collect();
                Type::reference(name, decls, args)
            }
            Some((_, Declaration::Enum { .. })) => Type::reference(name, Vec::new(), Vec::new()),
            Some((_, Declaration::Namespace { .. } | Declaration::Import { .. })) => Type::any(),
            // Unresolved names keep the name they were written with.
            _ => Type::reference(name, Vec::new(), args),
        }
    }

    fn type_param_map(
        &self,
        params: Option<&TsTypeParamDecl>,
        args: &[TypeRef],
    ) -> HashMap<String, TypeRef> {
        let mut map = HashMap::new();
        for (index, param) in params.into_iter().flat_map(|p| &p.params).enumerate() {
            let ty = args.get(index).cloned().unwrap_or_else(|| {
                param
                    .default
                    .as_ref()
                    .map_or_else(Type::any, |default| self.type_from_node(default))
            });
            map.insert(param.name.sym.to_string(), ty);
        }
        map
    }

    /// Namespaces a (possibly qualified) name refers to.
    fn namespace_targets(&self, name: &TsEntityName) -> Vec<NamespaceTarget> {
        let ids: Vec<DeclId> = match name {
            TsEntityName::Ident(ident) => {
                let mut ids = self.lookup(&ident.sym, ident.span, false);
                ids.extend(self.lookup(&ident.sym, ident.span, true));
                ids
            }
            TsEntityName::TsQualifiedName(qualified) => self
                .namespace_targets(&qualified.left)
                .into_iter()
                .flat_map(|target| self.namespace_declarations(target, &qualified.right.sym, false))
                .collect(),
        };

        let mut targets = Vec::new();
        for id in ids.into_iter().flat_map(|id| self.aliased_declarations(id)) {
            let target = match self.declaration(id) {
                Declaration::Namespace { scope, .. } => Some(NamespaceTarget::Scope(*scope)),
                Declaration::Enum { .. } => Some(NamespaceTarget::Enum(id)),
                Declaration::Import {
                    imported: Imported::Namespace,
                    module,
                    file,
                    ..
                } => self.resolve_module(*file, module).map(NamespaceTarget::Module),
                _ => None,
            };
            if let Some(target) = target {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }

    fn namespace_declarations(
        &self,
        target: NamespaceTarget,
        name: &str,
        types: bool,
    ) -> Vec<DeclId> {
        let found = match target {
            NamespaceTarget::Scope(scope) => {
                let scope = &self.program.scopes[scope];
                let table = if types { &scope.types } else { &scope.values };
                table.get(name).cloned().unwrap_or_default()
            }
            NamespaceTarget::Module(module) => self.export_declarations(module, name),
            NamespaceTarget::Enum(_) => Vec::new(),
        };
        found
            .into_iter()
            .flat_map(|id| self.aliased_declarations(id))
            .filter(|&id| if types { self.is_type(id) } else { self.is_value(id) })
            .collect()
    }

    /// Value type of `typeof name` / `typeof ns.name`.
    fn type_of_entity(&self, name: &TsEntityName) -> TypeRef {
        match name {
            TsEntityName::Ident(ident) => {
                self.type_of_value(&self.lookup(&ident.sym, ident.span, false))
            }
            TsEntityName::TsQualifiedName(qualified) => {
                let left = match &qualified.left {
                    TsEntityName::Ident(ident) => {
                        self.type_of_value(&self.lookup(&ident.sym, ident.span, false))
                    }
                    nested => self.type_of_entity(nested),
                };
                self.property_type(&left, &qualified.right.sym)
                    .unwrap_or_else(Type::any)
            }
        }
    }

    fn type_elements(&self, elements: &[TsTypeElement]) -> ObjectType {
        let mut object = ObjectType::default();
        for element in elements {
            match element {
                TsTypeElement::TsPropertySignature(property) => {
                    let Some(name) = member_key(&property.key, property.computed) else {
                        continue;
                    };
                    object.members.push(Member {
                        optional: property.optional,
                        ..Member::new(name, self.annotation_type(property.type_ann.as_deref()))
                    });
                }
                TsTypeElement::TsGetterSignature(getter) => {
                    let Some(name) = member_key(&getter.key, getter.computed) else {
                        continue;
                    };
                    object
                        .members
                        .push(Member::new(name, self.annotation_type(getter.type_ann.as_deref())));
                }
                TsTypeElement::TsMethodSignature(method) => {
                    let Some(name) = member_key(&method.key, method.computed) else {
                        continue;
                    };
                    let signature = self.signature_from_ts(
                        &method.params,
                        method.type_params.as_deref(),
                        method.type_ann.as_deref(),
                    );
                    add_method(&mut object.members, name, signature, method.optional);
                }
                TsTypeElement::TsCallSignatureDecl(call) => {
                    object.calls.push(self.signature_from_ts(
                        &call.params,
                        call.type_params.as_deref(),
                        call.type_ann.as_deref(),
                    ))
                }
                TsTypeElement::TsConstructSignatureDecl(construct) => {
                    object.constructs.push(self.signature_from_ts(
                        &construct.params,
                        construct.type_params.as_deref(),
                        construct.type_ann.as_deref(),
                    ))
                }
                TsTypeElement::TsSetterSignature(_) | TsTypeElement::TsIndexSignature(_) => {}
            }
        }
        object
    }

    fn annotation_type(&self, annotation: Option<&TsTypeAnn>) -> TypeRef {
        annotation.map_or_else(Type::any, |ann| self.type_from_node(&ann.type_ann))
    }

    fn signature_from_ts(
        &self,
        params: &[TsFnParam],
        type_params: Option<&TsTypeParamDecl>,
        ret: Option<&TsTypeAnn>,
    ) -> Rc<Signature> {
        let params = params
            .iter()
            .map(|param| match param {
                TsFnParam::Ident(binding) => Param {
                    name: binding.id.sym.to_string(),
                    ty: self.annotation_type(binding.type_ann.as_deref()),
                    optional: binding.id.optional,
                    rest: false,
                },
                TsFnParam::Rest(rest) => Param {
                    name: pattern_name(&rest.arg),
                    ty: self.annotation_type(rest.type_ann.as_deref()),
                    optional: true,
                    rest: true,
                },
                TsFnParam::Object(object) => Param {
                    name: "__0".to_string(),
                    ty: self.annotation_type(object.type_ann.as_deref()),
                    optional: object.optional,
                    rest: false,
                },
                TsFnParam::Array(array) => Param {
                    name: "__0".to_string(),
                    ty: self.annotation_type(array.type_ann.as_deref()),
                    optional: array.optional,
                    rest: false,
                },
            })
            .collect();
        Rc::new(Signature {
            type_params: type_param_names(type_params),
            params,
            ret: self.annotation_type(ret),
        })
    }

    fn param_of(&self, pat: &Pat) -> Param {
        let (inner, has_default) = match pat {
            Pat::Assign(assign) => (&*assign.left, Some(&*assign.right)),
            other => (other, None),
        };
        let rest = matches!(inner, Pat::Rest(_));
        let ty = match (pat_annotation(inner), has_default) {
            (Some(annotation), _) => self.type_from_node(annotation),
            (None, Some(default)) => self.type_of_expr(default),
            (None, None) if rest => Rc::new(Type::Array(Type::any())),
            (None, None) => Type::any(),
        };
        let optional = has_default.is_some()
            || rest
            || matches!(inner, Pat::Ident(binding) if binding.id.optional);
        Param {
            name: pattern_name(inner),
            ty,
            optional,
            rest,
        }
    }

    /// Signature of a function declaration, expression or method.
    pub fn signature_of_function(&self, function: &Function) -> Rc<Signature> {
        let ret = match &function.return_type {
            Some(annotation) => self.type_from_node(&annotation.type_ann),
            None => match &function.body {
                Some(body) => self.infer_return(
                    function.span,
                    Body::Block(body),
                    function.is_async,
                    function.is_generator,
                ),
                None => Type::any(),
            },
        };
        Rc::new(Signature {
            type_params: type_param_names(function.type_params.as_deref()),
            params: function.params.iter().map(|p| self.param_of(&p.pat)).collect(),
            ret,
        })
    }

    /// Signature of an arrow function.
    pub fn signature_of_arrow(&self, arrow: &ArrowExpr) -> Rc<Signature> {
        let ret = match &arrow.return_type {
            Some(annotation) => self.type_from_node(&annotation.type_ann),
            None => {
                let body = match &*arrow.body {
                    BlockStmtOrExpr::BlockStmt(block) => Body::Block(block),
                    BlockStmtOrExpr::Expr(expr) => Body::Expr(expr),
                };
                self.infer_return(arrow.span, body, arrow.is_async, arrow.is_generator)
            }
        };
        Rc::new(Signature {
            type_params: type_param_names(arrow.type_params.as_deref()),
            params: arrow.params.iter().map(|p| self.param_of(p)).collect(),
            ret,
        })
    }

    /// Return type of a body without annotation: the union of its returned
    /// expressions, wrapped in `Promise` for async functions.
    fn infer_return(
        &self,
        span: Span,
        body: Body<'_>,
        is_async: bool,
        is_generator: bool,
    ) -> TypeRef {
        if is_generator {
            return Type::any();
        }
        if !self.inferring.borrow_mut().insert(span.lo) {
            return Type::any();
        }
        let ty = match body {
            Body::Expr(expr) => self.type_of_expr(expr),
            Body::Block(block) => {
                let returns = walker::own_returns(block);
                if returns.is_empty() {
                    Rc::new(Type::Void)
                } else {
                    Type::union(returns.iter().map(|ret| match ret {
                        Some(expr) => self.type_of_expr(expr),
                        None => Rc::new(Type::Void),
                    }))
                }
            }
        };
        self.inferring.borrow_mut().remove(&span.lo);

        if is_async {
            let awaited = self.awaited(&ty);
            self.named_global("Promise", vec![awaited])
        } else {
            ty
        }
    }

    /// Unwraps `Promise<T>` to `T`.
    pub fn awaited(&self, ty: &TypeRef) -> TypeRef {
        match &**ty {
            Type::Reference { name, args, .. }
                if (name == "Promise" || name == "PromiseLike") && args.len() == 1 =>
            {
                self.awaited(&args[0])
            }
            Type::Union(items) => Type::union(items.iter().map(|t| self.awaited(t))),
            _ => ty.clone(),
        }
    }

    /// Properties of a type, with their types and originating value expressions.
    pub fn properties_of(&self, ty: &TypeRef) -> Vec<Member> {
        self.members_inner(ty, 0)
    }

    fn members_inner(&self, ty: &TypeRef, depth: usize) -> Vec<Member> {
        if depth > MAX_DEPTH {
            return Vec::new();
        }
        match &**ty {
            Type::Object(object) => object.members.clone(),
            Type::Reference { decls, args, .. } => self.declared_object(decls, args, depth).members,
            Type::Array(el) => self.global_members("Array", vec![el.clone()], depth),
            Type::Tuple(items) => {
                self.global_members("Array", vec![Type::union(items.iter().cloned())], depth)
            }
            Type::String => self.global_members("String", Vec::new(), depth),
            Type::Number => self.global_members("Number", Vec::new(), depth),
            Type::Boolean => self.global_members("Boolean", Vec::new(), depth),
            Type::Function(_) => self.global_members("Function", Vec::new(), depth),
            Type::Union(items) => {
                let parts: Vec<Vec<Member>> = items
                    .iter()
                    .filter(|t| !matches!(***t, Type::Null | Type::Undefined))
                    .map(|t| self.members_inner(t, depth + 1))
                    .collect();
                let Some((first, rest)) = parts.split_first() else {
                    return Vec::new();
                };
                first
                    .iter()
                    .filter(|m| rest.iter().all(|other| other.iter().any(|o| o.name == m.name)))
                    .map(|m| Member {
                        ty: Type::union(
                            std::iter::once(m.ty.clone()).chain(
                                rest.iter()
                                    .filter_map(|other| other.iter().find(|o| o.name == m.name))
                                    .map(|o| o.ty.clone()),
                            ),
                        ),
                        ..m.clone()
                    })
                    .collect()
            }
            Type::Intersection(items) => {
                let mut members: Vec<Member> = Vec::new();
                for item in items {
                    for member in self.members_inner(item, depth + 1) {
                        if !members.iter().any(|m| m.name == member.name) {
                            members.push(member);
                        }
                    }
                }
                members
            }
            Type::Constructor { decls, .. } => self.static_members(decls, depth),
            Type::Namespace { target, .. } => self.namespace_members(*target),
            _ => Vec::new(),
        }
    }

    fn global_members(&self, name: &str, args: Vec<TypeRef>, depth: usize) -> Vec<Member> {
        self.declared_object(&self.global_types(name), &args, depth + 1)
            .members
    }

    /// Merged shape of interface and class declarations instantiated with `args`.
    fn declared_object(&self, decls: &[DeclId], args: &[TypeRef], depth: usize) -> ObjectType {
        let mut merged = ObjectType::default();
        if depth > MAX_DEPTH {
            return merged;
        }

        let mut bases = Vec::new();
        for &id in decls {
            match self.declaration(id) {
                Declaration::Interface { decl, .. } => {
                    let map = self.type_param_map(decl.type_params.as_deref(), args);
                    let object = self.type_elements(&decl.body.body);
                    merge_object(&mut merged, object, &map);
                    for heritage in &decl.extends {
                        if let Expr::Ident(base) = &*heritage.expr {
                            let base_args = heritage
                                .type_args
                                .as_ref()
                                .map(|a| a.params.iter().map(|t| self.type_from_node(t)).collect())
                                .unwrap_or_default();
                            let ids = self.lookup(&base.sym, base.span, true);
                            let base_type = self.instantiate_named_type(&base.sym, &ids, base_args);
                            bases.push(types::substitute(&base_type, &map));
                        }
                    }
                }
                Declaration::Class { class, .. } => {
                    let map = self.type_param_map(class.type_params.as_deref(), args);
                    let object = ObjectType {
                        members: self.class_members(class, false),
                        ..Default::default()
                    };
                    merge_object(&mut merged, object, &map);
                    if let Some(base) = self.super_class_type(class) {
                        bases.push(types::substitute(&base, &map));
                    }
                }
                _ => {}
            }
        }

        for base in bases {
            for member in self.members_inner(&base, depth + 1) {
                if !merged.members.iter().any(|m| m.name == member.name) {
                    merged.members.push(member);
                }
            }
        }
        merged
    }

    /// Instance type of a class's `extends` clause.
    fn super_class_type(&self, class: &Class) -> Option<TypeRef> {
        let Expr::Ident(base) = &**class.super_class.as_ref()? else {
            return None;
        };
        let args = class
            .super_type_params
            .as_ref()
            .map(|a| a.params.iter().map(|t| self.type_from_node(t)).collect())
            .unwrap_or_default();
        let ids = self.lookup(&base.sym, base.span, true);
        Some(self.instantiate_named_type(&base.sym, &ids, args))
    }

    fn class_members(&self, class: &Class, statics: bool) -> Vec<Member> {
        let mut members = Vec::new();
        for member in &class.body {
            match member {
                ClassMember::ClassProp(prop) if prop.is_static == statics => {
                    let Some(name) = prop_key(&prop.key) else {
                        continue;
                    };
                    let ty = match (&prop.type_ann, &prop.value) {
                        (Some(annotation), _) => self.type_from_node(&annotation.type_ann),
                        (None, Some(value)) => self.type_of_expr(value),
                        (None, None) => Type::any(),
                    };
                    members.push(Member {
                        optional: prop.is_optional,
                        ..Member::new(name, ty)
                    });
                }
                ClassMember::Method(method) if method.is_static == statics => {
                    let Some(name) = prop_key(&method.key) else {
                        continue;
                    };
                    let signature = self.signature_of_function(&method.function);
                    match method.kind {
                        MethodKind::Method => {
                            add_method(&mut members, name, signature, method.is_optional)
                        }
                        MethodKind::Getter => {
                            members.push(Member::new(name, signature.ret.clone()))
                        }
                        MethodKind::Setter => {}
                    }
                }
                _ => {}
            }
        }
        members
    }

    fn static_members(&self, decls: &[DeclId], depth: usize) -> Vec<Member> {
        let mut members: Vec<Member> = Vec::new();
        for &id in decls {
            let Declaration::Class { class, .. } = self.declaration(id) else {
                continue;
            };
            members.extend(self.class_members(class, true));
            if depth < MAX_DEPTH {
                if let Some(Expr::Ident(base)) = class.super_class.as_deref() {
                    let base_type = self.type_of_value(&self.lookup(&base.sym, base.span, false));
                    for member in self.members_inner(&base_type, depth + 1) {
                        if !members.iter().any(|m| m.name == member.name) {
                            members.push(member);
                        }
                    }
                }
            }
        }
        members
    }

    fn namespace_members(&self, target: NamespaceTarget) -> Vec<Member> {
        match target {
            NamespaceTarget::Scope(scope) => self.program.scopes[scope]
                .values
                .iter()
                .map(|(name, ids)| Member::new(name.clone(), self.type_of_value(ids)))
                .collect(),
            NamespaceTarget::Module(module) => self.program.modules[module]
                .exports
                .keys()
                .map(|name| {
                    let ids: Vec<DeclId> = self
                        .export_declarations(module, name)
                        .into_iter()
                        .flat_map(|id| self.aliased_declarations(id))
                        .filter(|&id| self.is_value(id))
                        .collect();
                    Member::new(name.clone(), self.type_of_value(&ids))
                })
                .collect(),
            NamespaceTarget::Enum(id) => {
                let Declaration::Enum { decl, .. } = self.declaration(id) else {
                    return Vec::new();
                };
                decl.members
                    .iter()
                    .map(|member| {
                        let name = match &member.id {
                            TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                            TsEnumMemberId::Str(s) => s.value.to_string(),
                        };
                        let is_string =
                            matches!(member.init.as_deref(), Some(Expr::Lit(Lit::Str(_))));
                        let ty = if is_string { Type::String } else { Type::Number };
                        Member::new(name, Rc::new(ty))
                    })
                    .collect()
            }
        }
    }

    /// Type of property `name` of `ty`.
    pub fn property_type(&self, ty: &TypeRef, name: &str) -> Option<TypeRef> {
        match &**ty {
            Type::Any | Type::Unknown => Some(Type::any()),
            Type::Namespace {
                target: target @ (NamespaceTarget::Scope(_) | NamespaceTarget::Module(_)),
                ..
            } => {
                let ids: Vec<DeclId> = self
                    .namespace_declarations(*target, name, false)
                    .into_iter()
                    .filter(|&id| self.is_value(id))
                    .collect();
                (!ids.is_empty()).then(|| self.type_of_value(&ids))
            }
            Type::Union(items) => {
                let found: Vec<TypeRef> = items
                    .iter()
                    .filter(|t| !matches!(***t, Type::Null | Type::Undefined))
                    .filter_map(|t| self.property_type(t, name))
                    .collect();
                (!found.is_empty()).then(|| Type::union(found))
            }
            _ => self
                .properties_of(ty)
                .into_iter()
                .find(|member| member.name == name)
                .map(|member| member.ty),
        }
    }

    /// Call signatures of a type.
    pub fn call_signatures(&self, ty: &TypeRef) -> Vec<Rc<Signature>> {
        match &**ty {
            Type::Function(signatures) => signatures.clone(),
            Type::Object(object) => object.calls.clone(),
            Type::Reference { decls, args, .. } => self.declared_object(decls, args, 0).calls,
            Type::Union(items) => items
                .iter()
                .map(|t| self.call_signatures(t))
                .find(|signatures| !signatures.is_empty())
                .unwrap_or_default(),
            Type::Intersection(items) => {
                items.iter().flat_map(|t| self.call_signatures(t)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Construct signatures of a type (`new X(...)`).
    pub fn construct_signatures(&self, ty: &TypeRef) -> Vec<Rc<Signature>> {
        match &**ty {
            Type::Constructor { name, decls } => self.class_constructors(name, decls, 0),
            Type::Object(object) => object.constructs.clone(),
            Type::Reference { decls, args, .. } => self.declared_object(decls, args, 0).constructs,
            _ => Vec::new(),
        }
    }

    fn class_constructors(&self, name: &str, decls: &[DeclId], depth: usize) -> Vec<Rc<Signature>> {
        let Some(class) = decls.iter().find_map(|&id| match self.declaration(id) {
            Declaration::Class { class, .. } => Some(class),
            _ => None,
        }) else {
            return Vec::new();
        };

        let type_params = type_param_names(class.type_params.as_deref());
        let instance = Type::reference(
            name,
            decls.to_vec(),
            type_params
                .iter()
                .map(|p| Rc::new(Type::TypeParam(p.clone())))
                .collect(),
        );

        let constructors: Vec<Rc<Signature>> = class
            .body
            .iter()
            .filter_map(|member| match member {
                ClassMember::Constructor(constructor) => Some(Rc::new(Signature {
                    type_params: type_params.clone(),
                    params: constructor
                        .params
                        .iter()
                        .map(|param| match param {
                            ParamOrTsParamProp::Param(param) => self.param_of(&param.pat),
                            ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                                TsParamPropParam::Ident(binding) => {
                                    self.param_of(&Pat::Ident(binding.clone()))
                                }
                                TsParamPropParam::Assign(assign) => {
                                    self.param_of(&Pat::Assign(assign.clone()))
                                }
                            },
                        })
                        .collect(),
                    ret: instance.clone(),
                })),
                _ => None,
            })
            .collect();

        if !constructors.is_empty() {
            return constructors;
        }

        // Without its own constructor a class takes its base class's parameters.
        if depth < MAX_DEPTH {
            if let Some(Expr::Ident(base)) = class.super_class.as_deref() {
                let base_ids: Vec<DeclId> = self
                    .lookup(&base.sym, base.span, false)
                    .into_iter()
                    .flat_map(|id| self.aliased_declarations(id))
                    .collect();
                let inherited = self.class_constructors(&base.sym, &base_ids, depth + 1);
                if !inherited.is_empty() {
                    return inherited
                        .iter()
                        .map(|sig| {
                            Rc::new(Signature {
                                type_params: type_params.clone(),
                                params: sig.params.clone(),
                                ret: instance.clone(),
                            })
                        })
                        .collect();
                }
            }
        }

        vec![Rc::new(Signature {
            type_params,
            params: Vec::new(),
            ret: instance,
        })]
    }
}

fn merge_object(target: &mut ObjectType, object: ObjectType, map: &HashMap<String, TypeRef>) {
    let substituted = types::substitute(&Rc::new(Type::Object(object)), map);
    let Type::Object(object) = &*substituted else {
        return;
    };
    for member in &object.members {
        match target.members.iter_mut().find(|m| m.name == member.name) {
            Some(existing) => {
                if let (Type::Function(a), Type::Function(b)) = (&*existing.ty, &*member.ty) {
                    let merged: Vec<Rc<Signature>> = a.iter().chain(b.iter()).cloned().collect();
                    existing.ty = Rc::new(Type::Function(merged));
                }
            }
            None => target.members.push(member.clone()),
        }
    }
    target.calls.extend(object.calls.iter().cloned());
    target.constructs.extend(object.constructs.iter().cloned());
}

fn add_method(members: &mut Vec<Member>, name: String, signature: Rc<Signature>, optional: bool) {
    if let Some(existing) = members.iter_mut().find(|m| m.name == name) {
        if let Type::Function(signatures) = &*existing.ty {
            let mut signatures = signatures.clone();
            signatures.push(signature);
            existing.ty = Rc::new(Type::Function(signatures));
        }
        return;
    }
    members.push(Member {
        optional,
        ..Member::new(name, Rc::new(Type::Function(vec![signature])))
    });
}

fn type_param_names(params: Option<&TsTypeParamDecl>) -> Vec<String> {
    params
        .into_iter()
        .flat_map(|p| &p.params)
        .map(|p| p.name.sym.to_string())
        .collect()
}

fn pattern_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(binding) => binding.id.sym.to_string(),
        Pat::Rest(rest) => pattern_name(&rest.arg),
        Pat::Assign(assign) => pattern_name(&assign.left),
        _ => "__0".to_string(),
    }
}

fn member_key(key: &Expr, computed: bool) -> Option<String> {
    match key {
        Expr::Ident(ident) if !computed => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Lit(Lit::Num(n)) => Some(n.value.to_string()),
        _ => None,
    }
}

fn prop_key(key: &PropName) -> Option<String> {
    crate::extractor::futen::prop_name(key)
}

fn entity_text(name: &TsEntityName) -> String {
    match name {
        TsEntityName::Ident(ident) => ident.sym.to_string(),
        TsEntityName::TsQualifiedName(qualified) => {
            format!("{}.{}", entity_text(&qualified.left), qualified.right.sym)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{Decl, ModuleItem, Stmt};

    fn parse(sources: &[(&str, &str)]) -> Vec<ParsedFile> {
        let parser = AstParser::new();
        let prelude = prelude();
        let mut files = vec![parser.parse_source(&prelude.name, &prelude.content).unwrap()];
        for (name, content) in sources {
            files.push(parser.parse_source(name, content).unwrap());
        }
        files
    }

    fn initializer<'f>(file: &'f ParsedFile, name: &str) -> &'f Expr {
        for item in &file.module.body {
            let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = item else {
                continue;
            };
            for declarator in &var.decls {
                if let Pat::Ident(binding) = &declarator.name {
                    if &*binding.id.sym == name {
                        return declarator.init.as_deref().unwrap();
                    }
                }
            }
        }
        panic!("no variable named {}", name);
    }

    fn type_of(checker: &Checker, file: &ParsedFile, name: &str) -> String {
        checker.type_to_string(&checker.type_of_expr(initializer(file, name)))
    }

    #[test]
    fn test_builtin_expression_types() {
        let files = parse(&[(
            "generated.ts",
            "const a = Response.json({ a: 1 });\n\
             const b = Math.random();\n\
             const c = new Blob(['x']);\n\
             const d = [1, 2];\n\
             const e = { a: 'x', b: [true] };\n\
             const f = /x/;\n\
             const g = [];\n\
             const h = 'a' + 1;",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());
        let file = &files[1];

        assert_eq!(type_of(&checker, file, "a"), "Response");
        assert_eq!(type_of(&checker, file, "b"), "number");
        assert_eq!(type_of(&checker, file, "c"), "Blob");
        assert_eq!(type_of(&checker, file, "d"), "number[]");
        assert_eq!(type_of(&checker, file, "e"), "{ a: string; b: boolean[]; }");
        assert_eq!(type_of(&checker, file, "f"), "RegExp");
        assert_eq!(type_of(&checker, file, "g"), "never[]");
        assert_eq!(type_of(&checker, file, "h"), "string");
    }

    #[test]
    fn test_generic_call_is_instantiated_from_arguments() {
        let files = parse(&[(
            "generated.ts",
            "interface Box<T> { value: T; }\n\
             function wrap<T>(value: T): Box<T> { return { value }; }\n\
             const b = wrap({ id: 1 });\n\
             const n = [1, 2].map((x: number) => String(x));",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());
        let file = &files[1];

        assert_eq!(type_of(&checker, file, "b"), "Box<{ id: number; }>");
        assert_eq!(type_of(&checker, file, "n"), "string[]");

        let boxed = checker.type_of_expr(initializer(file, "b"));
        let arguments = type_arguments(&boxed);
        let members = checker.properties_of(&arguments[0]);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "id");
        assert!(members[0].origin.is_some());
    }

    #[test]
    fn test_async_return_type_is_inferred() {
        let files = parse(&[(
            "generated.ts",
            "async function load() { \
             if (Math.random()) { return { ok: true }; } return { ok: false }; }\n\
             const p = load();\n\
             const q = await load();",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());
        let file = &files[1];

        assert_eq!(type_of(&checker, file, "p"), "Promise<{ ok: boolean; }>");
        assert_eq!(type_of(&checker, file, "q"), "{ ok: boolean; }");
    }

    #[test]
    fn test_imports_resolve_across_project_files() {
        let files = parse(&[
            (
                "/project/models.ts",
                "export interface User { id: number; name: string; }\n\
                 export function getUser(): User { return { id: 1, name: 'a' }; }",
            ),
            (
                "/project/generated.ts",
                "import { getUser } from './models';\nconst u = getUser();",
            ),
        ]);
        let checker = Checker::new(&files, &IndexMap::new());
        let file = &files[2];

        let user = checker.type_of_expr(initializer(file, "u"));
        assert_eq!(user.to_string(), "User");
        assert_eq!(symbol_name(&user), Some("User".to_string()));
        let names: Vec<String> = checker.properties_of(&user).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_package_types_entry_is_resolved() {
        let files = parse(&[
            (
                "kit/dist/index.d.ts",
                "export declare class Payload { size: number; }\n\
                 export declare function payload(): Payload;",
            ),
            (
                "generated.ts",
                "import { payload } from 'kit';\nconst p = payload();\nconst s = p.size;",
            ),
        ]);
        let mut package_types = IndexMap::new();
        package_types.insert("kit".to_string(), "kit/dist/index.d.ts".to_string());
        let checker = Checker::new(&files, &package_types);
        let file = &files[2];

        assert_eq!(type_of(&checker, file, "p"), "Payload");
        assert_eq!(type_of(&checker, file, "s"), "number");
    }

    #[test]
    fn test_unresolved_type_names_are_kept() {
        let files = parse(&[(
            "generated.ts",
            "declare function file(path: string): BunFile;\nconst f = file('a');",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());

        let ty = checker.type_of_expr(initializer(&files[1], "f"));
        assert_eq!(ty.to_string(), "BunFile");
        assert!(checker.properties_of(&ty).is_empty());
    }

    #[test]
    fn test_destructured_binding_type() {
        let files = parse(&[(
            "generated.ts",
            "const { id, rest = 'x' } = { id: 1, name: 'x' };\nconst a = id;\nconst b = rest;",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());

        assert_eq!(type_of(&checker, &files[1], "a"), "number");
        assert_eq!(type_of(&checker, &files[1], "b"), "string");
    }

    #[test]
    fn test_circular_initializers_resolve_to_any() {
        let files = parse(&[("generated.ts", "const a = b;\nconst b = a;")]);
        let checker = Checker::new(&files, &IndexMap::new());

        assert_eq!(type_of(&checker, &files[1], "a"), "any");
    }

    #[test]
    fn test_overloads_use_declarations_without_body() {
        let files = parse(&[(
            "generated.ts",
            "function pick(a: string): string;\n\
             function pick(a: number, b: number): number;\n\
             function pick(a: any, b?: any): any { return a; }\n\
             const one = pick('x');\n\
             const two = pick(1, 2);",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());

        assert_eq!(type_of(&checker, &files[1], "one"), "string");
        assert_eq!(type_of(&checker, &files[1], "two"), "number");
    }

    #[test]
    fn test_namespace_members_and_aliases() {
        let files = parse(&[(
            "generated.ts",
            "declare namespace Kit { interface Item { id: number; } function item(): Item; }\n\
             type Pair = { left: string; right: string };\n\
             declare function pair(): Pair;\n\
             const i = Kit.item();\n\
             const p = pair();",
        )]);
        let checker = Checker::new(&files, &IndexMap::new());

        assert_eq!(type_of(&checker, &files[1], "i"), "Item");
        assert_eq!(type_of(&checker, &files[1], "p"), "Pair");
    }
}
