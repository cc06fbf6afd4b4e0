//! Entity references for the arena-allocated AST.
//!
//! Each ref type is a thin `u32` wrapper providing type-safe indexing into
//! the `PrimaryMap` storage owned by [`Ast`](crate::Ast). Handles are stable
//! for the lifetime of the compilation unit and are what every later phase
//! uses as node identity.

use cranelift_entity::entity_impl;

/// Reference to a declaration (variable, function, struct, namespace, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct DeclId(u32);
entity_impl!(DeclId, "decl");

/// Reference to an expression node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct ExprId(u32);
entity_impl!(ExprId, "expr");

/// Reference to a statement node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct StmtId(u32);
entity_impl!(StmtId, "stmt");

/// Reference to a block (a scoped statement list).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct BlockId(u32);
entity_impl!(BlockId, "block");

/// Reference to a type annotation as written in source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct TypeExprId(u32);
entity_impl!(TypeExprId, "tyexpr");

/// Reference to a generic parameter of some generic declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, salsa::Update)]
pub struct GenericParamId(u32);
entity_impl!(GenericParamId, "generic");
