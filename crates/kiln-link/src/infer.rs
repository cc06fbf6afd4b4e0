//! Generic argument inference.
//!
//! Inference is positional structural matching, not unification. Slots are
//! filled in this order, and a slot once filled is never overwritten by a
//! later step:
//!
//! 1. every slot is seeded with its parameter's default, if any;
//! 2. explicitly written generic arguments overwrite the leading slots;
//! 3. each explicit (non-implicit) formal parameter type is matched against
//!    the corresponding argument type, and the return type against the
//!    expected type when the call site has one.
//!
//! Slots still empty afterward are reported back as unresolved and hold
//! `Unknown`. Defaults may mention earlier parameters (`<T, U = Box<T>>`)
//! and are closed over the final arguments.

use kiln_ast::{GenericParamId, Type, TypeKind};

use crate::relate::{TypeEnv, concrete, expand};
use crate::subst::substitute;

/// A formal parameter of a generic callee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Formal<'db> {
    pub ty: Type<'db>,
    /// Compiler-supplied parameters take no part in inference.
    pub implicit: bool,
}

/// What inference needs to know about the callee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericSignature<'db> {
    pub params: Vec<GenericParamId>,
    /// Parallel to `params`.
    pub defaults: Vec<Option<Type<'db>>>,
    pub formals: Vec<Formal<'db>>,
    pub ret: Option<Type<'db>>,
}

/// What inference needs to know about the call site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallSite<'db> {
    /// Types of the arguments for the explicit formals, in order.
    pub arg_types: Vec<Type<'db>>,
    /// Type the call's result is expected to have, if known.
    pub expected: Option<Type<'db>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inferred<'db> {
    /// One argument per generic parameter. Unresolved slots hold `Unknown`.
    pub args: Vec<Type<'db>>,
    /// Parameters that could not be inferred, in declaration order.
    pub unresolved: Vec<GenericParamId>,
}

impl Inferred<'_> {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

pub fn infer<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    sig: &GenericSignature<'db>,
    explicit: &[Type<'db>],
    site: &CallSite<'db>,
) -> Inferred<'db> {
    let mut slots: Vec<Option<Type<'db>>> = sig
        .params
        .iter()
        .enumerate()
        .map(|(i, _)| sig.defaults.get(i).copied().flatten())
        .collect();
    let mut from_default: Vec<bool> = slots.iter().map(Option::is_some).collect();

    for ((slot, is_default), arg) in slots.iter_mut().zip(&mut from_default).zip(explicit) {
        *slot = Some(*arg);
        *is_default = false;
    }

    let mut matcher = ShapeMatcher {
        db,
        env,
        params: &sig.params,
        slots: &mut slots,
    };
    let explicit_formals = sig.formals.iter().filter(|f| !f.implicit);
    for (formal, actual) in explicit_formals.zip(&site.arg_types) {
        matcher.match_shape(formal.ty, *actual);
    }
    if let (Some(ret), Some(expected)) = (sig.ret, site.expected) {
        matcher.match_shape(ret, expected);
    }

    // Close defaults over the other arguments. A default that still
    // mentions an unfilled parameter is itself unresolved.
    let filled: Vec<Type<'db>> = slots
        .iter()
        .zip(&sig.params)
        .map(|(slot, p)| slot.unwrap_or_else(|| Type::param(db, *p)))
        .collect();
    let unfilled: Vec<GenericParamId> = slots
        .iter()
        .zip(&sig.params)
        .filter(|(slot, _)| slot.is_none())
        .map(|(_, p)| *p)
        .collect();
    let mut args = Vec::with_capacity(slots.len());
    let mut unresolved = Vec::new();
    for ((slot, is_default), param) in slots.iter().zip(&from_default).zip(&sig.params) {
        let resolved = match slot {
            Some(ty) if *is_default => Some(substitute(db, *ty, &sig.params, &filled))
                .filter(|ty| !mentions_any(db, *ty, &unfilled)),
            other => *other,
        };
        match resolved {
            Some(ty) => args.push(ty),
            None => {
                args.push(Type::unknown(db));
                unresolved.push(*param);
            }
        }
    }
    Inferred { args, unresolved }
}

fn mentions_any<'db>(
    db: &'db dyn salsa::Database,
    ty: Type<'db>,
    params: &[GenericParamId],
) -> bool {
    let mut found = smallvec::SmallVec::<[GenericParamId; 4]>::new();
    ty.collect_params(db, &mut found);
    found.iter().any(|p| params.contains(p))
}

struct ShapeMatcher<'a, 'db> {
    db: &'db dyn salsa::Database,
    env: &'a dyn TypeEnv<'db>,
    params: &'a [GenericParamId],
    slots: &'a mut [Option<Type<'db>>],
}

impl<'db> ShapeMatcher<'_, 'db> {
    /// Walk `formal` and `actual` in lockstep and fill the empty slot of
    /// every own parameter found at a position where `actual` has a type.
    fn match_shape(&mut self, formal: Type<'db>, actual: Type<'db>) {
        if actual.is_unknown(self.db) {
            return;
        }
        match formal.kind(self.db) {
            TypeKind::Param(p) => {
                if let Some(i) = self.params.iter().position(|q| q == p)
                    && self.slots[i].is_none()
                {
                    self.slots[i] = Some(concrete(self.db, actual));
                }
            }
            TypeKind::Linked { decl, args } => {
                let actual = expand(self.db, self.env, actual);
                if let TypeKind::Linked {
                    decl: actual_decl,
                    args: actual_args,
                } = actual.kind(self.db)
                    && actual_decl == decl
                    && actual_args.len() == args.len()
                {
                    for (f, a) in args.iter().zip(actual_args) {
                        self.match_shape(*f, *a);
                    }
                }
            }
            TypeKind::Pointer(inner) => {
                if let TypeKind::Pointer(a) = actual.kind(self.db) {
                    self.match_shape(*inner, *a);
                }
            }
            TypeKind::Reference(inner) => match actual.kind(self.db) {
                TypeKind::Reference(a) => self.match_shape(*inner, *a),
                // Implicit borrow: `&T` against a value of type `X` gives `T = X`.
                _ => self.match_shape(*inner, actual),
            },
            TypeKind::Array { elem, .. } => {
                if let TypeKind::Array { elem: a, .. } = actual.kind(self.db) {
                    self.match_shape(*elem, *a);
                }
            }
            TypeKind::Function { params, ret } => {
                if let TypeKind::Function {
                    params: actual_params,
                    ret: actual_ret,
                } = actual.kind(self.db)
                    && actual_params.len() == params.len()
                {
                    for (f, a) in params.iter().zip(actual_params) {
                        self.match_shape(*f, *a);
                    }
                    self.match_shape(*ret, *actual_ret);
                }
            }
            TypeKind::Primitive(_) | TypeKind::Literal(_) | TypeKind::Unknown => {}
        }
    }
}
