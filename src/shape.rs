//! Value shape resolution.
//!
//! Classifies returned expressions into [`Property`] trees the schema generator can
//! turn into schemas. Resolution is shallow: identifiers are followed through their
//! declaration, and whatever cannot be classified becomes the printed name of its
//! static type.

use crate::checker::binder::{DeclId, Declaration};
use crate::checker::{symbol_name, type_arguments, Checker, Type};
use crate::extractor::futen::prop_name;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use swc_common::Spanned;
use swc_ecma_ast::{
    ArrowExpr, CallExpr, Callee, Expr, ExprOrSpread, Function, Ident, Lit, NewExpr, ObjectLit,
    ObjectPatProp, Pat, Prop, PropOrSpread,
};

/// Inferred shape of a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Property {
    /// No value could be determined
    Absent,
    String(String),
    Number(f64),
    Boolean(bool),
    Structured(IndexMap<String, Property>),
    Sequence(Vec<Property>),
    ReturnType(ReturnTypeObject),
}

/// A named value produced by a call or construction, with its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnTypeObject {
    pub return_type: String,
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
}

impl ReturnTypeObject {
    pub fn new(return_type: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            return_type: return_type.into(),
            properties,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: Option<String>) -> Self {
        self.caller = caller;
        self
    }
}

impl Property {
    pub fn as_return_type(&self) -> Option<&ReturnTypeObject> {
        match self {
            Property::ReturnType(object) => Some(object),
            _ => None,
        }
    }
}

/// Resolves expressions of the synthetic program into [`Property`] values.
pub struct ShapeResolver<'c, 'a> {
    checker: &'c Checker<'a>,
    /// Declarations being resolved; a declaration met again resolves to `Absent`
    visiting: Vec<DeclId>,
}

impl<'c, 'a> ShapeResolver<'c, 'a> {
    pub fn new(checker: &'c Checker<'a>) -> Self {
        Self {
            checker,
            visiting: Vec::new(),
        }
    }

    /// Shape of the value of one `return` statement.
    ///
    /// Calls are described by the type they evaluate to, their arguments and their
    /// callee; constructions by the constructed name and arguments. Anything else is
    /// described by its type alone. Returns `None` for a construction without an
    /// argument list.
    pub fn resolve_return(&mut self, expr: &Expr) -> Option<Property> {
        let object = match expr {
            Expr::Paren(paren) => return self.resolve_return(&paren.expr),
            Expr::Call(call) => {
                let return_type = self.checker.type_of_expr(expr).to_string();
                ReturnTypeObject::new(return_type, self.parse_arguments(&call.args))
                    .with_caller(self.callee_text(call))
            }
            Expr::New(new) => {
                let args = new.args.as_ref()?;
                ReturnTypeObject::new(self.text_of(&new.callee), self.parse_arguments(args))
            }
            _ => ReturnTypeObject::new(self.checker.type_of_expr(expr).to_string(), Vec::new()),
        };
        Some(Property::ReturnType(object))
    }

    /// Shape of an arbitrary expression.
    pub fn parse_value(&mut self, expr: &Expr) -> Property {
        match expr {
            Expr::Lit(Lit::Str(s)) => Property::String(s.value.to_string()),
            Expr::Lit(Lit::Num(n)) => Property::Number(n.value),
            Expr::Lit(Lit::Bool(b)) => Property::Boolean(b.value),
            Expr::Lit(Lit::Regex(_)) => {
                Property::ReturnType(ReturnTypeObject::new("RegExp", Vec::new()))
            }
            Expr::Object(object) => Property::Structured(self.parse_object_literal(object)),
            Expr::Await(await_expr) => self.parse_value(&await_expr.arg),
            Expr::Call(call) => self.parse_call_expression(call),
            Expr::Arrow(arrow) => self.parse_arrow(arrow),
            Expr::Fn(function) => self.parse_function(&function.function),
            Expr::Ident(ident) => self.parse_identifier(ident),
            Expr::Array(array) => Property::Sequence(
                array
                    .elems
                    .iter()
                    .map(|elem| match elem {
                        Some(elem) if elem.spread.is_none() => self.parse_value(&elem.expr),
                        Some(elem) => self.type_name(&elem.expr),
                        None => Property::Absent,
                    })
                    .collect(),
            ),
            Expr::New(new) => self.parse_new_expression(new),
            Expr::Member(member) => self.type_name(&member.obj),
            Expr::Paren(paren) => self.parse_value(&paren.expr),
            _ => self.type_name(expr),
        }
    }

    fn type_name(&self, expr: &Expr) -> Property {
        Property::String(self.checker.type_of_expr(expr).to_string())
    }

    fn text_of(&self, expr: &Expr) -> String {
        self.checker
            .source_text(expr.span())
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn callee_text(&self, call: &CallExpr) -> Option<String> {
        match &call.callee {
            Callee::Expr(callee) => Some(self.text_of(callee)),
            _ => None,
        }
    }

    fn parse_arguments(&mut self, args: &[ExprOrSpread]) -> Vec<Property> {
        args.iter().map(|arg| self.parse_value(&arg.expr)).collect()
    }

    fn parse_object_literal(&mut self, object: &ObjectLit) -> IndexMap<String, Property> {
        let mut result = IndexMap::new();
        for prop in &object.props {
            match prop {
                PropOrSpread::Prop(prop) => match &**prop {
                    Prop::KeyValue(kv) => {
                        if let Some(name) = prop_name(&kv.key) {
                            let value = self.parse_value(&kv.value);
                            result.insert(name, value);
                        }
                    }
                    Prop::Shorthand(ident) => {
                        let value = self.parse_identifier(ident);
                        result.insert(ident.sym.to_string(), value);
                    }
                    _ => {}
                },
                PropOrSpread::Spread(spread) => {
                    // Only literal objects are merged.
                    if let Expr::Object(inner) = &*spread.expr {
                        let merged = self.parse_object_literal(inner);
                        result.extend(merged);
                    }
                }
            }
        }
        result
    }

    /// Resolves a call through its signature.
    ///
    /// A generic return type (`Promise<T>`, `Wrapper<T>`) is expanded into the
    /// properties of its first type argument; otherwise the arguments are resolved
    /// positionally.
    fn parse_call_expression(&mut self, call: &CallExpr) -> Property {
        let Some(signature) = self.checker.resolved_signature(call) else {
            return Property::Absent;
        };
        let caller = self.callee_text(call);

        let Some(return_type) = symbol_name(&signature.ret) else {
            let Callee::Expr(callee) = &call.callee else {
                return Property::Absent;
            };
            let callee_type = self.checker.type_of_expr(callee);
            let Some(first) = self.checker.call_signatures(&callee_type).into_iter().next() else {
                return Property::Absent;
            };
            let properties = self.parse_arguments(&call.args);
            return Property::ReturnType(
                ReturnTypeObject::new(first.ret.to_string(), properties).with_caller(caller),
            );
        };

        let properties = match type_arguments(&signature.ret).first() {
            Some(argument) => {
                let members = match &**argument {
                    Type::String | Type::Number | Type::Boolean | Type::BigInt | Type::Symbol => {
                        Vec::new()
                    }
                    _ => self.checker.properties_of(argument),
                };
                members
                    .into_iter()
                    .map(|member| {
                        let value = match &member.origin {
                            Some(origin) => self.parse_value(origin),
                            None => Property::Absent,
                        };
                        Property::Structured(IndexMap::from([(member.name, value)]))
                    })
                    .collect()
            }
            None => self.parse_arguments(&call.args),
        };
        Property::ReturnType(ReturnTypeObject::new(return_type, properties).with_caller(caller))
    }

    fn parse_new_expression(&mut self, new: &NewExpr) -> Property {
        let Some(args) = &new.args else {
            return Property::Absent;
        };
        let properties = self.parse_arguments(args);
        Property::ReturnType(ReturnTypeObject::new(self.text_of(&new.callee), properties))
    }

    fn parse_arrow(&mut self, arrow: &ArrowExpr) -> Property {
        let signature = self.checker.signature_of_arrow(arrow);
        let properties = arrow
            .params
            .iter()
            .map(|param| self.parse_binding_name(param))
            .collect();
        Property::ReturnType(ReturnTypeObject::new(signature.ret.to_string(), properties))
    }

    fn parse_function(&mut self, function: &Function) -> Property {
        let signature = self.checker.signature_of_function(function);
        let properties = function
            .params
            .iter()
            .map(|param| self.parse_binding_name(&param.pat))
            .collect();
        Property::ReturnType(ReturnTypeObject::new(signature.ret.to_string(), properties))
    }

    fn parse_binding_name(&mut self, pat: &Pat) -> Property {
        match pat {
            Pat::Ident(binding) => self.parse_identifier(&binding.id),
            Pat::Assign(assign) => self.parse_binding_name(&assign.left),
            Pat::Rest(rest) => self.parse_binding_name(&rest.arg),
            Pat::Object(object) => Property::Sequence(
                object
                    .props
                    .iter()
                    .map(|prop| match prop {
                        ObjectPatProp::KeyValue(kv) => self.parse_binding_name(&kv.value),
                        ObjectPatProp::Assign(assign) => {
                            let key: &Ident = &assign.key;
                            self.parse_identifier(key)
                        }
                        ObjectPatProp::Rest(rest) => self.parse_binding_name(&rest.arg),
                    })
                    .collect(),
            ),
            _ => Property::Absent,
        }
    }

    /// Follows an identifier to its first declaration.
    fn parse_identifier(&mut self, ident: &Ident) -> Property {
        match self.checker.declarations_of(ident).first() {
            Some(&id) => self.parse_declaration(id),
            None => Property::Absent,
        }
    }

    fn parse_declaration(&mut self, id: DeclId) -> Property {
        if self.visiting.contains(&id) {
            debug!("Declaration {} refers to itself", id);
            return Property::Absent;
        }
        self.visiting.push(id);

        let checker = self.checker;
        let property = match checker.declaration(id) {
            Declaration::Variable { declarator, .. } => match &declarator.init {
                Some(init) => self.parse_value(init),
                None => Property::Absent,
            },
            Declaration::Binding { .. } => {
                Property::String(checker.type_of_declaration(id).to_string())
            }
            Declaration::Import { .. } => match checker.aliased_declarations(id).first() {
                Some(&target) => self.parse_declaration(target),
                None => Property::Absent,
            },
            _ => Property::Absent,
        };

        self.visiting.pop();
        property
    }
}
