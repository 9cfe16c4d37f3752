//! Type model of the checker.

use super::binder::{DeclId, ScopeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use swc_ecma_ast::Expr;

pub type TypeRef = Rc<Type>;

/// A resolved TypeScript type.
///
/// Literal types are widened to their primitive on construction; the checker never
/// needs to tell `"a"` from `string`.
#[derive(Debug, Clone)]
pub enum Type {
    /// Unresolved or explicitly `any`
    Any,
    Unknown,
    Never,
    Void,
    Undefined,
    Null,
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    /// The `object` keyword
    NonPrimitive,
    /// A named class, interface or unresolved type name with its type arguments
    Reference {
        name: String,
        decls: Vec<DeclId>,
        args: Vec<TypeRef>,
    },
    /// Anonymous object type (literal or type literal)
    Object(ObjectType),
    Array(TypeRef),
    Tuple(Vec<TypeRef>),
    Union(Vec<TypeRef>),
    Intersection(Vec<TypeRef>),
    /// A callable value; overloads in declaration order
    Function(Vec<Rc<Signature>>),
    /// The value side of a class (`typeof C`)
    Constructor { name: String, decls: Vec<DeclId> },
    /// A namespace, enum or module object (`typeof N`)
    Namespace { name: String, target: NamespaceTarget },
    TypeParam(String),
}

/// What a namespace type exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceTarget {
    /// Declarations of a namespace block
    Scope(ScopeId),
    /// Exports of a module
    Module(usize),
    /// Members of an enum declaration
    Enum(DeclId),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectType {
    pub members: Vec<Member>,
    pub calls: Vec<Rc<Signature>>,
    pub constructs: Vec<Rc<Signature>>,
    /// Printed name when the object came from a type alias
    pub alias: Option<String>,
}

/// A property of an object-like type.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
    /// Value expression the property was declared with, for object literal members
    pub origin: Option<Rc<Expr>>,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            origin: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub ret: TypeRef,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
    pub rest: bool,
}

impl Signature {
    /// Whether `count` arguments can be passed.
    pub fn accepts(&self, count: usize) -> bool {
        let required = self
            .params
            .iter()
            .filter(|p| !p.optional && !p.rest)
            .count();
        let rest = self.params.iter().any(|p| p.rest);
        count >= required && (rest || count <= self.params.len())
    }

    pub fn substitute(&self, map: &HashMap<String, TypeRef>) -> Signature {
        Signature {
            type_params: self
                .type_params
                .iter()
                .filter(|name| !map.contains_key(*name))
                .cloned()
                .collect(),
            params: self
                .params
                .iter()
                .map(|p| Param {
                    ty: substitute(&p.ty, map),
                    ..p.clone()
                })
                .collect(),
            ret: substitute(&self.ret, map),
        }
    }
}

impl Type {
    pub fn any() -> TypeRef {
        Rc::new(Type::Any)
    }

    pub fn reference(name: impl Into<String>, decls: Vec<DeclId>, args: Vec<TypeRef>) -> TypeRef {
        Rc::new(Type::Reference {
            name: name.into(),
            decls,
            args,
        })
    }

    /// Builds a union: nested unions are flattened, duplicates (by printed form) and
    /// `never` are dropped, a single constituent is returned as is.
    pub fn union(types: impl IntoIterator<Item = TypeRef>) -> TypeRef {
        let mut flat: Vec<TypeRef> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut push = |ty: TypeRef, flat: &mut Vec<TypeRef>| {
            if matches!(*ty, Type::Never) {
                return;
            }
            let printed = ty.to_string();
            if !seen.contains(&printed) {
                seen.push(printed);
                flat.push(ty);
            }
        };
        for ty in types {
            match &*ty {
                Type::Union(members) => {
                    for member in members {
                        push(member.clone(), &mut flat);
                    }
                }
                _ => push(ty, &mut flat),
            }
        }
        match flat.len() {
            0 => Rc::new(Type::Never),
            1 => flat.remove(0),
            _ => Rc::new(Type::Union(flat)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any | Type::Unknown)
    }

    /// Whether a type parameter occurs anywhere in the type.
    pub fn has_type_params(&self) -> bool {
        match self {
            Type::TypeParam(_) => true,
            Type::Reference { args, .. } => args.iter().any(|a| a.has_type_params()),
            Type::Array(el) => el.has_type_params(),
            Type::Tuple(items) | Type::Union(items) | Type::Intersection(items) => {
                items.iter().any(|t| t.has_type_params())
            }
            Type::Object(object) => object.members.iter().any(|m| m.ty.has_type_params()),
            Type::Function(sigs) => sigs
                .iter()
                .any(|s| {
                    s.ret.has_type_params() || s.params.iter().any(|p| p.ty.has_type_params())
                }),
            _ => false,
        }
    }

    /// Removes `null` and `undefined` constituents.
    pub fn non_nullable(ty: &TypeRef) -> TypeRef {
        match &**ty {
            Type::Union(members) => Type::union(
                members
                    .iter()
                    .filter(|m| !matches!(***m, Type::Null | Type::Undefined))
                    .cloned(),
            ),
            _ => ty.clone(),
        }
    }
}

/// Name of the symbol behind a type, if it has one.
///
/// Named references and arrays (`Array`) have one; anonymous object and function
/// types do not.
pub fn symbol_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Reference { name, .. } => Some(name.clone()),
        Type::Array(_) => Some("Array".to_string()),
        Type::Constructor { name, .. } | Type::Namespace { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Type arguments of a generic reference (`Promise<T>` -> `[T]`, `T[]` -> `[T]`).
pub fn type_arguments(ty: &Type) -> Vec<TypeRef> {
    match ty {
        Type::Reference { args, .. } => args.clone(),
        Type::Array(el) => vec![el.clone()],
        _ => Vec::new(),
    }
}

/// Replaces type parameters by the types they are mapped to.
pub fn substitute(ty: &TypeRef, map: &HashMap<String, TypeRef>) -> TypeRef {
    if map.is_empty() {
        return ty.clone();
    }
    match &**ty {
        Type::TypeParam(name) => map.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Reference { name, decls, args } => Type::reference(
            name.clone(),
            decls.clone(),
            args.iter().map(|a| substitute(a, map)).collect(),
        ),
        Type::Array(el) => Rc::new(Type::Array(substitute(el, map))),
        Type::Tuple(items) => {
            Rc::new(Type::Tuple(items.iter().map(|t| substitute(t, map)).collect()))
        }
        Type::Union(items) => Type::union(items.iter().map(|t| substitute(t, map))),
        Type::Intersection(items) => Rc::new(Type::Intersection(
            items.iter().map(|t| substitute(t, map)).collect(),
        )),
        Type::Object(object) => Rc::new(Type::Object(ObjectType {
            members: object
                .members
                .iter()
                .map(|m| Member {
                    ty: substitute(&m.ty, map),
                    ..m.clone()
                })
                .collect(),
            calls: object.calls.iter().map(|s| Rc::new(s.substitute(map))).collect(),
            constructs: object
                .constructs
                .iter()
                .map(|s| Rc::new(s.substitute(map)))
                .collect(),
            alias: object.alias.clone(),
        })),
        Type::Function(sigs) => Rc::new(Type::Function(
            sigs.iter().map(|s| Rc::new(s.substitute(map))).collect(),
        )),
        _ => ty.clone(),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Unknown => f.write_str("unknown"),
            Type::Never => f.write_str("never"),
            Type::Void => f.write_str("void"),
            Type::Undefined => f.write_str("undefined"),
            Type::Null => f.write_str("null"),
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Boolean => f.write_str("boolean"),
            Type::BigInt => f.write_str("bigint"),
            Type::Symbol => f.write_str("symbol"),
            Type::NonPrimitive => f.write_str("object"),
            Type::Reference { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    write!(f, "<{}>", join(args, ", "))?;
                }
                Ok(())
            }
            Type::Object(object) => {
                if let Some(alias) = &object.alias {
                    return f.write_str(alias);
                }
                if object.members.is_empty() && object.calls.is_empty() {
                    return f.write_str("{}");
                }
                if object.members.is_empty() && object.calls.len() == 1 {
                    return write_signature(f, &object.calls[0]);
                }
                f.write_str("{ ")?;
                for call in &object.calls {
                    write!(f, "(")?;
                    write_params(f, &call.params)?;
                    write!(f, "): {}; ", call.ret)?;
                }
                for member in &object.members {
                    write!(
                        f,
                        "{}{}: {}; ",
                        member.name,
                        if member.optional { "?" } else { "" },
                        member.ty
                    )?;
                }
                f.write_str("}")
            }
            Type::Array(el) => match &**el {
                Type::Union(_) | Type::Intersection(_) | Type::Function(_) => {
                    write!(f, "({})[]", el)
                }
                _ => write!(f, "{}[]", el),
            },
            Type::Tuple(items) => write!(f, "[{}]", join(items, ", ")),
            Type::Union(items) => f.write_str(&join(items, " | ")),
            Type::Intersection(items) => f.write_str(&join(items, " & ")),
            Type::Function(sigs) => match sigs.first() {
                Some(sig) => write_signature(f, sig),
                None => f.write_str("Function"),
            },
            Type::Constructor { name, .. } | Type::Namespace { name, .. } => {
                write!(f, "typeof {}", name)
            }
            Type::TypeParam(name) => f.write_str(name),
        }
    }
}

fn join(types: &[TypeRef], separator: &str) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(
            f,
            "{}{}{}: {}",
            if param.rest { "..." } else { "" },
            param.name,
            if param.optional { "?" } else { "" },
            param.ty
        )?;
    }
    Ok(())
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    if !sig.type_params.is_empty() {
        write!(f, "<{}>", sig.type_params.join(", "))?;
    }
    f.write_str("(")?;
    write_params(f, &sig.params)?;
    write!(f, ") => {}", sig.ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(ty: Type) -> TypeRef {
        Rc::new(ty)
    }

    #[test]
    fn test_print_like_typescript() {
        let response = Type::reference("Response", vec![], vec![]);
        let promise = Type::reference("Promise", vec![], vec![response]);
        assert_eq!(promise.to_string(), "Promise<Response>");

        let array = Rc::new(Type::Array(prim(Type::String)));
        assert_eq!(array.to_string(), "string[]");

        let union_array =
            Rc::new(Type::Array(Type::union([prim(Type::String), prim(Type::Number)])));
        assert_eq!(union_array.to_string(), "(string | number)[]");

        let object = Type::Object(ObjectType {
            members: vec![
                Member::new("id", prim(Type::Number)),
                Member {
                    optional: true,
                    ..Member::new("name", prim(Type::String))
                },
            ],
            ..Default::default()
        });
        assert_eq!(object.to_string(), "{ id: number; name?: string; }");

        let function = Type::Function(vec![Rc::new(Signature {
            type_params: vec![],
            params: vec![Param {
                name: "body".into(),
                ty: prim(Type::Any),
                optional: true,
                rest: false,
            }],
            ret: Type::reference("Response", vec![], vec![]),
        })]);
        assert_eq!(function.to_string(), "(body?: any) => Response");
    }

    #[test]
    fn test_union_flattens_and_dedupes() {
        let nested = Type::union([prim(Type::String), prim(Type::Number)]);
        let ty = Type::union([nested, prim(Type::String), prim(Type::Never)]);
        assert_eq!(ty.to_string(), "string | number");

        let single = Type::union([prim(Type::Boolean), prim(Type::Boolean)]);
        assert!(matches!(*single, Type::Boolean));
    }

    #[test]
    fn test_substitute_type_params() {
        let generic = Type::reference("Box", vec![], vec![prim(Type::TypeParam("T".into()))]);
        let mut map = HashMap::new();
        map.insert("T".to_string(), prim(Type::Number));

        assert_eq!(substitute(&generic, &map).to_string(), "Box<number>");
        assert!(generic.has_type_params());
        assert!(!substitute(&generic, &map).has_type_params());
    }

    #[test]
    fn test_symbol_names() {
        assert_eq!(symbol_name(&Type::Array(prim(Type::String))).as_deref(), Some("Array"));
        assert_eq!(symbol_name(&Type::Number), None);
        assert_eq!(symbol_name(&Type::Object(ObjectType::default())), None);
    }

    #[test]
    fn test_signature_arity() {
        let sig = Signature {
            type_params: vec![],
            params: vec![
                Param { name: "a".into(), ty: prim(Type::Any), optional: false, rest: false },
                Param { name: "b".into(), ty: prim(Type::Any), optional: true, rest: false },
            ],
            ret: prim(Type::Void),
        };
        assert!(!sig.accepts(0));
        assert!(sig.accepts(1));
        assert!(sig.accepts(2));
        assert!(!sig.accepts(3));
    }
}
