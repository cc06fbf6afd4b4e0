//! Arena AST and semantic types for the Kiln front end.

pub mod ast;
pub mod builder;
pub mod decl;
pub mod expr;
pub mod ids;
pub mod types;

pub use ast::{Ast, MalformedAst};
pub use builder::AstBuilder;
pub use decl::{
    DeclKind, Declaration, FieldDecl, FunctionDecl, GenericParameter, InterfaceDecl,
    NamespaceDecl, Ownership, ParameterDecl, StructDecl, TypeAliasDecl, UnionDecl, VariableDecl,
    VariantCase, VariantDecl,
};
pub use expr::{
    BinaryOp, Block, Expr, ExprKind, IfArm, Stmt, StmtKind, SwitchCase, UnaryOp,
};
pub use ids::{BlockId, DeclId, ExprId, GenericParamId, StmtId, TypeExprId};
pub use types::{LiteralKind, Primitive, Type, TypeExpr, TypeExprKind, TypeKind};
