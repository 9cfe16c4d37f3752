//! Expression typing and call resolution.

use super::{Checker, Member, ObjectType, Signature, Type, TypeRef};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;
use swc_ecma_ast::{
    BinaryOp, CallExpr, Callee, Expr, ExprOrSpread, Lit, MemberExpr, MemberProp, NewExpr,
    OptChainBase, Prop, PropOrSpread, TsTypeParamInstantiation, UnaryOp,
};

impl<'a> Checker<'a> {
    /// Type of an expression.
    pub fn type_of_expr(&self, expr: &Expr) -> TypeRef {
        match expr {
            Expr::Lit(lit) => match lit {
                Lit::Str(_) => Rc::new(Type::String),
                Lit::Num(_) => Rc::new(Type::Number),
                Lit::Bool(_) => Rc::new(Type::Boolean),
                Lit::BigInt(_) => Rc::new(Type::BigInt),
                Lit::Null(_) => Rc::new(Type::Null),
                Lit::Regex(_) => self.named_global("RegExp", Vec::new()),
                Lit::JSXText(_) => Rc::new(Type::String),
            },
            Expr::Tpl(_) | Expr::TaggedTpl(_) => Rc::new(Type::String),
            Expr::Array(array) => {
                let elements: Vec<TypeRef> = array
                    .elems
                    .iter()
                    .flatten()
                    .map(|elem| {
                        let ty = self.type_of_expr(&elem.expr);
                        match (&elem.spread, &*ty) {
                            (Some(_), Type::Array(el)) => el.clone(),
                            (Some(_), _) => Type::any(),
                            (None, _) => ty,
                        }
                    })
                    .collect();
                if elements.is_empty() {
                    Rc::new(Type::Array(Rc::new(Type::Never)))
                } else {
                    Rc::new(Type::Array(Type::union(elements)))
                }
            }
            Expr::Object(object) => {
                let mut members: IndexMap<String, Member> = IndexMap::new();
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Spread(spread) => {
                            for member in self.properties_of(&self.type_of_expr(&spread.expr)) {
                                members.insert(member.name.clone(), member);
                            }
                        }
                        PropOrSpread::Prop(prop) => {
                            if let Some(member) = self.object_member(prop) {
                                members.insert(member.name.clone(), member);
                            }
                        }
                    }
                }
                Rc::new(Type::Object(ObjectType {
                    members: members.into_values().collect(),
                    ..Default::default()
                }))
            }
            Expr::Fn(function) => {
                Rc::new(Type::Function(vec![self.signature_of_function(&function.function)]))
            }
            Expr::Arrow(arrow) => Rc::new(Type::Function(vec![self.signature_of_arrow(arrow)])),
            Expr::Unary(unary) => Rc::new(match unary.op {
                UnaryOp::TypeOf => Type::String,
                UnaryOp::Bang | UnaryOp::Delete => Type::Boolean,
                UnaryOp::Void => Type::Undefined,
                UnaryOp::Minus | UnaryOp::Plus | UnaryOp::Tilde => Type::Number,
            }),
            Expr::Update(_) => Rc::new(Type::Number),
            Expr::Bin(bin) => match bin.op {
                BinaryOp::Add => {
                    let left = self.type_of_expr(&bin.left);
                    let right = self.type_of_expr(&bin.right);
                    match (&*left, &*right) {
                        (Type::String, _) | (_, Type::String) => Rc::new(Type::String),
                        (Type::Number, Type::Number) => Rc::new(Type::Number),
                        _ => Type::any(),
                    }
                }
                BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::Exp
                | BinaryOp::LShift
                | BinaryOp::RShift
                | BinaryOp::ZeroFillRShift
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor => Rc::new(Type::Number),
                BinaryOp::EqEq
                | BinaryOp::NotEq
                | BinaryOp::EqEqEq
                | BinaryOp::NotEqEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::In
                | BinaryOp::InstanceOf => Rc::new(Type::Boolean),
                BinaryOp::LogicalOr | BinaryOp::NullishCoalescing => {
                    let left = Type::non_nullable(&self.type_of_expr(&bin.left));
                    Type::union([left, self.type_of_expr(&bin.right)])
                }
                BinaryOp::LogicalAnd => self.type_of_expr(&bin.right),
            },
            Expr::Assign(assign) => self.type_of_expr(&assign.right),
            Expr::Seq(seq) => seq
                .exprs
                .last()
                .map_or_else(Type::any, |last| self.type_of_expr(last)),
            Expr::Cond(cond) => {
                Type::union([self.type_of_expr(&cond.cons), self.type_of_expr(&cond.alt)])
            }
            Expr::Member(member) => self.type_of_member(member),
            Expr::Call(call) => self
                .resolved_signature(call)
                .map_or_else(Type::any, |signature| signature.ret.clone()),
            Expr::New(new) => self
                .resolved_construct_signature(new)
                .map_or_else(Type::any, |signature| signature.ret.clone()),
            Expr::Ident(ident) => {
                let ids = self.declarations_of(ident);
                if ids.is_empty() && &*ident.sym == "undefined" {
                    return Rc::new(Type::Undefined);
                }
                self.type_of_value(&ids)
            }
            Expr::Await(await_expr) => self.awaited(&self.type_of_expr(&await_expr.arg)),
            Expr::Paren(paren) => self.type_of_expr(&paren.expr),
            Expr::TsAs(cast) => self.type_from_node(&cast.type_ann),
            Expr::TsTypeAssertion(cast) => self.type_from_node(&cast.type_ann),
            Expr::TsSatisfies(satisfies) => self.type_of_expr(&satisfies.expr),
            Expr::TsConstAssertion(assertion) => self.type_of_expr(&assertion.expr),
            Expr::TsNonNull(non_null) => Type::non_nullable(&self.type_of_expr(&non_null.expr)),
            Expr::TsInstantiation(instantiation) => self.type_of_expr(&instantiation.expr),
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => {
                    let ty = self.type_of_member(member);
                    Type::union([ty, Rc::new(Type::Undefined)])
                }
                OptChainBase::Call(call) => {
                    let callee = Type::non_nullable(&self.type_of_expr(&call.callee));
                    let ret = self
                        .choose_signature(
                            &self.call_signatures(&callee),
                            &call.args,
                            call.type_args.as_deref(),
                        )
                        .map_or_else(Type::any, |signature| signature.ret.clone());
                    Type::union([ret, Rc::new(Type::Undefined)])
                }
            },
            _ => Type::any(),
        }
    }

    fn object_member(&self, prop: &Prop) -> Option<Member> {
        match prop {
            Prop::KeyValue(kv) => {
                let name = super::prop_key(&kv.key)?;
                Some(Member {
                    origin: Some(Rc::new((*kv.value).clone())),
                    ..Member::new(name, self.type_of_expr(&kv.value))
                })
            }
            Prop::Shorthand(ident) => {
                let value = Expr::Ident(ident.clone());
                Some(Member {
                    origin: Some(Rc::new(value.clone())),
                    ..Member::new(ident.sym.to_string(), self.type_of_expr(&value))
                })
            }
            Prop::Method(method) => Some(Member::new(
                super::prop_key(&method.key)?,
                Rc::new(Type::Function(vec![self.signature_of_function(&method.function)])),
            )),
            Prop::Getter(getter) => {
                let ty = match (&getter.type_ann, &getter.body) {
                    (Some(annotation), _) => self.type_from_node(&annotation.type_ann),
                    (None, Some(body)) => {
                        self.infer_return(getter.span, super::Body::Block(body), false, false)
                    }
                    (None, None) => Type::any(),
                };
                Some(Member::new(super::prop_key(&getter.key)?, ty))
            }
            Prop::Assign(_) | Prop::Setter(_) => None,
        }
    }

    fn type_of_member(&self, member: &MemberExpr) -> TypeRef {
        let object = self.type_of_expr(&member.obj);
        match &member.prop {
            MemberProp::Ident(ident) => self
                .property_type(&object, &ident.sym)
                .unwrap_or_else(Type::any),
            MemberProp::Computed(computed) => match &*computed.expr {
                Expr::Lit(Lit::Str(key)) => self
                    .property_type(&object, &key.value)
                    .unwrap_or_else(Type::any),
                _ => match &*object {
                    Type::Array(el) => el.clone(),
                    Type::Tuple(items) => Type::union(items.iter().cloned()),
                    _ => Type::any(),
                },
            },
            MemberProp::PrivateName(_) => Type::any(),
        }
    }

    /// Signature a call expression resolves to, with type arguments inferred and
    /// substituted.
    pub fn resolved_signature(&self, call: &CallExpr) -> Option<Rc<Signature>> {
        let Callee::Expr(callee) = &call.callee else {
            return None;
        };
        let callee = self.type_of_expr(callee);
        self.choose_signature(
            &self.call_signatures(&callee),
            &call.args,
            call.type_args.as_deref(),
        )
    }

    /// Construct signature a `new` expression resolves to.
    pub fn resolved_construct_signature(&self, new: &NewExpr) -> Option<Rc<Signature>> {
        let callee = self.type_of_expr(&new.callee);
        let args = new.args.as_deref().unwrap_or_default();
        self.choose_signature(
            &self.construct_signatures(&callee),
            args,
            new.type_args.as_deref(),
        )
    }

    /// Picks the first signature that accepts the argument count, falling back to the
    /// first one, and instantiates it.
    fn choose_signature(
        &self,
        signatures: &[Rc<Signature>],
        args: &[ExprOrSpread],
        type_args: Option<&TsTypeParamInstantiation>,
    ) -> Option<Rc<Signature>> {
        let signature = signatures
            .iter()
            .find(|signature| signature.accepts(args.len()))
            .or_else(|| signatures.first())?;
        Some(self.instantiate(signature, args, type_args))
    }

    fn instantiate(
        &self,
        signature: &Rc<Signature>,
        args: &[ExprOrSpread],
        type_args: Option<&TsTypeParamInstantiation>,
    ) -> Rc<Signature> {
        if signature.type_params.is_empty() {
            return signature.clone();
        }

        let mut map = HashMap::new();
        match type_args {
            Some(explicit) => {
                for (name, ty) in signature.type_params.iter().zip(&explicit.params) {
                    map.insert(name.clone(), self.type_from_node(ty));
                }
            }
            None => {
                for (index, param) in signature.params.iter().enumerate() {
                    if param.rest {
                        let element = match &*param.ty {
                            Type::Array(el) => el.clone(),
                            _ => param.ty.clone(),
                        };
                        for arg in args.iter().skip(index) {
                            self.infer_from(&element, &self.type_of_expr(&arg.expr), &mut map);
                        }
                        break;
                    }
                    let Some(arg) = args.get(index) else {
                        break;
                    };
                    self.infer_from(&param.ty, &self.type_of_expr(&arg.expr), &mut map);
                }
            }
        }

        for name in &signature.type_params {
            map.entry(name.clone())
                .or_insert_with(|| Rc::new(Type::Unknown));
        }
        Rc::new(signature.substitute(&map))
    }

    /// Infers type parameters of `param` from an argument of type `arg`. The first
    /// inference for a parameter wins.
    fn infer_from(&self, param: &TypeRef, arg: &TypeRef, map: &mut HashMap<String, TypeRef>) {
        if !param.has_type_params() {
            return;
        }
        match (&**param, &**arg) {
            (Type::TypeParam(name), _) => {
                map.entry(name.clone()).or_insert_with(|| arg.clone());
            }
            (
                Type::Reference {
                    name: expected,
                    args: params,
                    ..
                },
                Type::Reference {
                    name: actual,
                    args: actuals,
                    ..
                },
            ) if expected == actual => {
                for (param, actual) in params.iter().zip(actuals) {
                    self.infer_from(param, actual, map);
                }
            }
            (Type::Reference { name, args: params, .. }, Type::Array(el))
                if params.len() == 1
                    && matches!(name.as_str(), "ArrayLike" | "ReadonlyArray" | "Iterable") =>
            {
                self.infer_from(&params[0], el, map);
            }
            (Type::Array(param), Type::Array(el)) => self.infer_from(param, el, map),
            (Type::Array(param), Type::Tuple(items)) => {
                self.infer_from(param, &Type::union(items.iter().cloned()), map)
            }
            (Type::Union(params), _) => {
                let generic: Vec<&TypeRef> =
                    params.iter().filter(|p| p.has_type_params()).collect();
                if let [single] = generic.as_slice() {
                    self.infer_from(single, &Type::non_nullable(arg), map);
                }
            }
            (Type::Object(object), _) => {
                for member in &object.members {
                    if !member.ty.has_type_params() {
                        continue;
                    }
                    if let Some(actual) = self.property_type(arg, &member.name) {
                        self.infer_from(&member.ty, &actual, map);
                    }
                }
            }
            (Type::Function(params), Type::Function(actuals)) => {
                if let (Some(param), Some(actual)) = (params.first(), actuals.first()) {
                    for (p, a) in param.params.iter().zip(&actual.params) {
                        self.infer_from(&p.ty, &a.ty, map);
                    }
                    self.infer_from(&param.ret, &actual.ret, map);
                }
            }
            _ => {}
        }
    }
}
