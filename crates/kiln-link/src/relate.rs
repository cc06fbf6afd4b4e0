//! Structural type relations.
//!
//! Everything here is a pure function of its inputs. Declared-type facts
//! that the relations depend on (alias targets, union members, nominal
//! `implements` lists) come from a [`TypeEnv`].

use kiln_ast::{DeclId, LiteralKind, Primitive, Type, TypeKind};

/// Declared-type facts consulted by the relations.
pub trait TypeEnv<'db> {
    /// Target of a type alias, with the alias's parameters replaced by
    /// `args`. `None` if `decl` is not an alias.
    fn alias_target(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        args: &[Type<'db>],
    ) -> Option<Type<'db>>;

    /// Member types of a union, with the union's parameters replaced by
    /// `args`. `None` if `decl` is not a union.
    fn union_members(
        &self,
        db: &'db dyn salsa::Database,
        decl: DeclId,
        args: &[Type<'db>],
    ) -> Option<Vec<Type<'db>>>;

    /// Whether `decl` declares that it implements `interface`.
    fn implements(&self, decl: DeclId, interface: DeclId) -> bool;
}

/// An environment with no aliases, unions or interfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyEnv;

impl<'db> TypeEnv<'db> for EmptyEnv {
    fn alias_target(
        &self,
        _: &'db dyn salsa::Database,
        _: DeclId,
        _: &[Type<'db>],
    ) -> Option<Type<'db>> {
        None
    }

    fn union_members(
        &self,
        _: &'db dyn salsa::Database,
        _: DeclId,
        _: &[Type<'db>],
    ) -> Option<Vec<Type<'db>>> {
        None
    }

    fn implements(&self, _: DeclId, _: DeclId) -> bool {
        false
    }
}

/// Alias chains longer than this are treated as cyclic and left unexpanded.
const MAX_ALIAS_DEPTH: usize = 32;

/// Expand type aliases at the head of `ty`.
pub fn expand<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    ty: Type<'db>,
) -> Type<'db> {
    let mut current = ty;
    for _ in 0..MAX_ALIAS_DEPTH {
        match current.kind(db) {
            TypeKind::Linked { decl, args } => match env.alias_target(db, *decl, args) {
                Some(target) => current = target,
                None => return current,
            },
            _ => return current,
        }
    }
    current
}

/// Structural identity.
///
/// Linked types are the same iff they name the same declaration with
/// pairwise-same arguments, after alias expansion.
pub fn is_same<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    a: Type<'db>,
    b: Type<'db>,
) -> bool {
    same(db, env, a, b, false)
}

/// Whether every argument list entry is pairwise [`is_same`].
pub fn all_same<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    a: &[Type<'db>],
    b: &[Type<'db>],
) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_same(db, env, *x, *y))
}

fn same<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    a: Type<'db>,
    b: Type<'db>,
    lenient: bool,
) -> bool {
    if a == b {
        return true;
    }
    let a = expand(db, env, a);
    let b = expand(db, env, b);
    if a == b {
        return true;
    }
    match (a.kind(db), b.kind(db)) {
        (TypeKind::Unknown, _) | (_, TypeKind::Unknown) => lenient,
        (
            TypeKind::Linked {
                decl: da,
                args: aa,
            },
            TypeKind::Linked {
                decl: db_,
                args: ab,
            },
        ) => {
            da == db_
                && aa.len() == ab.len()
                && aa
                    .iter()
                    .zip(ab)
                    .all(|(x, y)| same(db, env, *x, *y, lenient))
        }
        (TypeKind::Pointer(x), TypeKind::Pointer(y))
        | (TypeKind::Reference(x), TypeKind::Reference(y)) => same(db, env, *x, *y, lenient),
        (
            TypeKind::Array { elem: ea, len: la },
            TypeKind::Array { elem: eb, len: lb },
        ) => la == lb && same(db, env, *ea, *eb, lenient),
        (
            TypeKind::Function {
                params: pa,
                ret: ra,
            },
            TypeKind::Function {
                params: pb,
                ret: rb,
            },
        ) => {
            pa.len() == pb.len()
                && pa.iter().zip(pb).all(|(x, y)| same(db, env, *x, *y, lenient))
                && same(db, env, *ra, *rb, lenient)
        }
        // Interning makes equal primitives, literals and params identical,
        // which the `a == b` checks above already covered.
        _ => false,
    }
}

/// Whether a value of type `actual` may be bound where `expected` is
/// required.
///
/// Accepts, beyond [`is_same`]: literal unwrapping, implicit integer and
/// float widening, implicit borrow (`&T` accepts `T`), union membership and
/// `Unknown` on either side.
pub fn satisfies<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    expected: Type<'db>,
    actual: Type<'db>,
) -> bool {
    if same(db, env, expected, actual, true) {
        return true;
    }
    let expected = expand(db, env, expected);
    let actual = expand(db, env, actual);
    match (expected.kind(db), actual.kind(db)) {
        (TypeKind::Unknown, _) | (_, TypeKind::Unknown) => true,
        (TypeKind::Primitive(e), TypeKind::Literal(lit)) => literal_fits(*e, *lit),
        (TypeKind::Primitive(e), TypeKind::Primitive(a)) => widens(*a, *e),
        (TypeKind::Reference(inner), a) if !matches!(a, TypeKind::Reference(_)) => {
            satisfies(db, env, *inner, actual)
        }
        (TypeKind::Linked { decl, args }, _) => match env.union_members(db, *decl, args) {
            Some(members) => members.iter().any(|m| satisfies(db, env, *m, actual)),
            None => false,
        },
        _ => false,
    }
}

/// Whether `arg` meets the minimum bound `bound` of a generic parameter:
/// either it satisfies the bound type directly (union membership included)
/// or it names a declaration that implements the bound interface.
pub fn satisfies_bound<'db>(
    db: &'db dyn salsa::Database,
    env: &dyn TypeEnv<'db>,
    bound: Type<'db>,
    arg: Type<'db>,
) -> bool {
    if satisfies(db, env, bound, arg) {
        return true;
    }
    let bound = expand(db, env, bound);
    let arg = expand(db, env, arg);
    match (bound.kind(db), arg.kind(db)) {
        (TypeKind::Linked { decl: iface, .. }, TypeKind::Linked { decl, .. }) => {
            env.implements(*decl, *iface)
        }
        _ => false,
    }
}

/// The type a literal takes when nothing more specific is expected.
pub fn concrete<'db>(db: &'db dyn salsa::Database, ty: Type<'db>) -> Type<'db> {
    match ty.kind(db) {
        TypeKind::Literal(LiteralKind::Int) => Type::int(db),
        TypeKind::Literal(LiteralKind::Float) => Type::primitive(db, Primitive::FLOAT),
        TypeKind::Literal(LiteralKind::Str) => Type::str(db),
        _ => ty,
    }
}

fn literal_fits(expected: Primitive, lit: LiteralKind) -> bool {
    matches!(
        (expected, lit),
        (Primitive::Int { .. } | Primitive::Float { .. }, LiteralKind::Int)
            | (Primitive::Float { .. }, LiteralKind::Float)
            | (Primitive::Str, LiteralKind::Str)
    )
}

/// Implicit widening from `from` to `to`.
fn widens(from: Primitive, to: Primitive) -> bool {
    match (from, to) {
        (
            Primitive::Int {
                bits: fb,
                signed: fs,
            },
            Primitive::Int {
                bits: tb,
                signed: ts,
            },
        ) => (fs == ts && tb >= fb) || (!fs && ts && tb > fb),
        (Primitive::Float { bits: fb }, Primitive::Float { bits: tb }) => tb >= fb,
        _ => from == to,
    }
}
