//! Semantic types and source type annotations.
//!
//! - `TypeExpr`: a type annotation as written in source, referring to other
//!   declarations by name. Produced by the parser, never mutated.
//! - `Type`: a linked, interned type. Produced by the linker from a
//!   `TypeExpr` and shared by every later phase.
//!
//! Types inside a generic declaration are kept in *open* form: they mention
//! the declaration's own parameters through [`TypeKind::Param`]. A concrete
//! iteration closes them by substitution.

use kiln_core::{Span, Symbol};
use smallvec::SmallVec;

use crate::ids::{DeclId, GenericParamId, TypeExprId};

/// A linked type.
#[salsa::interned(debug)]
pub struct Type<'db> {
    #[returns(ref)]
    pub kind: TypeKind<'db>,
}

/// The different kinds of types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum TypeKind<'db> {
    /// Builtin scalar type.
    Primitive(Primitive),
    /// Type of a literal expression before it meets an expected type.
    Literal(LiteralKind),
    /// A generic parameter of some generic declaration.
    Param(GenericParamId),
    /// A declared type (struct, variant, interface, union, alias) with its
    /// generic arguments.
    Linked {
        decl: DeclId,
        args: Vec<Type<'db>>,
    },
    Pointer(Type<'db>),
    Reference(Type<'db>),
    Array {
        elem: Type<'db>,
        len: Option<u64>,
    },
    Function {
        params: Vec<Type<'db>>,
        ret: Type<'db>,
    },
    /// Placeholder after an error; compatible with everything.
    Unknown,
}

/// Builtin scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum Primitive {
    Void,
    Bool,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Str,
}

impl Primitive {
    pub const INT: Primitive = Primitive::Int {
        bits: 64,
        signed: true,
    };
    pub const FLOAT: Primitive = Primitive::Float { bits: 64 };

    /// Look up a builtin type by its source name.
    pub fn from_name(name: &str) -> Option<Primitive> {
        let prim = match name {
            "void" => Primitive::Void,
            "bool" => Primitive::Bool,
            "str" => Primitive::Str,
            "int" | "i64" => Primitive::INT,
            "i8" => Primitive::Int { bits: 8, signed: true },
            "i16" => Primitive::Int { bits: 16, signed: true },
            "i32" => Primitive::Int { bits: 32, signed: true },
            "u8" => Primitive::Int { bits: 8, signed: false },
            "u16" => Primitive::Int { bits: 16, signed: false },
            "u32" => Primitive::Int { bits: 32, signed: false },
            "u64" => Primitive::Int { bits: 64, signed: false },
            "float" | "f64" => Primitive::FLOAT,
            "f32" => Primitive::Float { bits: 32 },
            _ => return None,
        };
        Some(prim)
    }
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Primitive::Void => write!(f, "void"),
            Primitive::Bool => write!(f, "bool"),
            Primitive::Str => write!(f, "str"),
            Primitive::Int {
                bits: 64,
                signed: true,
            } => write!(f, "int"),
            Primitive::Int { bits, signed: true } => write!(f, "i{bits}"),
            Primitive::Int {
                bits,
                signed: false,
            } => write!(f, "u{bits}"),
            Primitive::Float { bits: 64 } => write!(f, "float"),
            Primitive::Float { bits } => write!(f, "f{bits}"),
        }
    }
}

/// Literal expression types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, salsa::Update)]
pub enum LiteralKind {
    Int,
    Float,
    Str,
}

impl<'db> Type<'db> {
    pub fn primitive(db: &'db dyn salsa::Database, prim: Primitive) -> Self {
        Type::new(db, TypeKind::Primitive(prim))
    }

    pub fn int(db: &'db dyn salsa::Database) -> Self {
        Type::primitive(db, Primitive::INT)
    }

    pub fn bool(db: &'db dyn salsa::Database) -> Self {
        Type::primitive(db, Primitive::Bool)
    }

    pub fn str(db: &'db dyn salsa::Database) -> Self {
        Type::primitive(db, Primitive::Str)
    }

    pub fn void(db: &'db dyn salsa::Database) -> Self {
        Type::primitive(db, Primitive::Void)
    }

    pub fn literal(db: &'db dyn salsa::Database, lit: LiteralKind) -> Self {
        Type::new(db, TypeKind::Literal(lit))
    }

    pub fn param(db: &'db dyn salsa::Database, param: GenericParamId) -> Self {
        Type::new(db, TypeKind::Param(param))
    }

    pub fn linked(db: &'db dyn salsa::Database, decl: DeclId, args: Vec<Type<'db>>) -> Self {
        Type::new(db, TypeKind::Linked { decl, args })
    }

    pub fn unknown(db: &'db dyn salsa::Database) -> Self {
        Type::new(db, TypeKind::Unknown)
    }

    pub fn is_unknown(self, db: &'db dyn salsa::Database) -> bool {
        matches!(self.kind(db), TypeKind::Unknown)
    }

    /// Whether the type mentions any generic parameter.
    pub fn is_open(self, db: &'db dyn salsa::Database) -> bool {
        let mut params = SmallVec::<[GenericParamId; 4]>::new();
        self.collect_params(db, &mut params);
        !params.is_empty()
    }

    /// Whether the type contains an `Unknown` placeholder anywhere.
    pub fn contains_unknown(self, db: &'db dyn salsa::Database) -> bool {
        match self.kind(db) {
            TypeKind::Unknown => true,
            TypeKind::Primitive(_) | TypeKind::Literal(_) | TypeKind::Param(_) => false,
            TypeKind::Linked { args, .. } => args.iter().any(|a| a.contains_unknown(db)),
            TypeKind::Pointer(inner) | TypeKind::Reference(inner) => inner.contains_unknown(db),
            TypeKind::Array { elem, .. } => elem.contains_unknown(db),
            TypeKind::Function { params, ret } => {
                params.iter().any(|p| p.contains_unknown(db)) || ret.contains_unknown(db)
            }
        }
    }

    /// Append every generic parameter mentioned by the type, in first-seen
    /// order and without duplicates.
    pub fn collect_params(
        self,
        db: &'db dyn salsa::Database,
        out: &mut SmallVec<[GenericParamId; 4]>,
    ) {
        match self.kind(db) {
            TypeKind::Param(p) => {
                if !out.contains(p) {
                    out.push(*p);
                }
            }
            TypeKind::Linked { args, .. } => {
                for arg in args {
                    arg.collect_params(db, out);
                }
            }
            TypeKind::Pointer(inner) | TypeKind::Reference(inner) => {
                inner.collect_params(db, out)
            }
            TypeKind::Array { elem, .. } => elem.collect_params(db, out),
            TypeKind::Function { params, ret } => {
                for p in params {
                    p.collect_params(db, out);
                }
                ret.collect_params(db, out);
            }
            TypeKind::Primitive(_) | TypeKind::Literal(_) | TypeKind::Unknown => {}
        }
    }
}

/// Type annotation as written in source code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeExpr {
    pub span: Span,
    pub kind: TypeExprKind,
}

/// Kinds of type annotations in source code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExprKind {
    /// A possibly qualified name with generic arguments: `int`, `Box<T>`,
    /// `collections::List<T>`.
    Named {
        path: Vec<Symbol>,
        args: Vec<TypeExprId>,
    },
    /// `*T`
    Pointer(TypeExprId),
    /// `&T`
    Reference(TypeExprId),
    /// `[T; N]` or `[T]`
    Array {
        elem: TypeExprId,
        len: Option<u64>,
    },
    /// `fn(A, B) -> R`
    Function {
        params: Vec<TypeExprId>,
        ret: TypeExprId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn test_interning_is_structural() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let decl = DeclId::new(0);
        let a = Type::linked(db, decl, vec![Type::int(db)]);
        let b = Type::linked(db, decl, vec![Type::int(db)]);
        assert_eq!(a, b);
        assert_ne!(a, Type::linked(db, decl, vec![Type::str(db)]));
    }

    #[test]
    fn test_collect_params_dedups() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let t = Type::param(db, GenericParamId::new(0));
        let u = Type::param(db, GenericParamId::new(1));
        let func = Type::new(
            db,
            TypeKind::Function {
                params: vec![t, Type::new(db, TypeKind::Pointer(u))],
                ret: t,
            },
        );
        let mut params = SmallVec::new();
        func.collect_params(db, &mut params);
        assert_eq!(
            params.as_slice(),
            &[GenericParamId::new(0), GenericParamId::new(1)]
        );
        assert!(func.is_open(db));
        assert!(!Type::int(db).is_open(db));
    }

    #[test]
    fn test_primitive_names() {
        assert_eq!(Primitive::from_name("int"), Some(Primitive::INT));
        assert_eq!(
            Primitive::from_name("u8"),
            Some(Primitive::Int {
                bits: 8,
                signed: false
            })
        );
        assert_eq!(Primitive::from_name("Box"), None);
        assert_eq!(Primitive::Int { bits: 32, signed: true }.to_string(), "i32");
        assert_eq!(Primitive::FLOAT.to_string(), "float");
    }
}
