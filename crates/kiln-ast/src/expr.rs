//! Expression and statement nodes.

use kiln_core::{Span, Symbol};

use crate::ids::{BlockId, DeclId, ExprId, StmtId, TypeExprId};

/// An expression node.
#[derive(Clone, Debug)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    BoolLit(bool),
    /// Unqualified name reference.
    Name(Symbol),
    /// Qualified name reference: `math::max`.
    Path(Vec<Symbol>),
    /// `callee<generic_args>(args)`
    Call {
        callee: ExprId,
        generic_args: Vec<TypeExprId>,
        args: Vec<ExprId>,
    },
    /// `Type<args> { field: value, ... }`
    Construct {
        ty: TypeExprId,
        fields: Vec<(Symbol, ExprId)>,
    },
    /// `base.field`
    Member { base: ExprId, field: Symbol },
    /// `&place`: borrows without moving.
    AddressOf(ExprId),
    Unary { op: UnaryOp, operand: ExprId },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// A statement node.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    /// `let decl = init;` where `decl` is a `DeclKind::Variable`.
    Let { decl: DeclId, init: Option<ExprId> },
    Assign { target: ExprId, value: ExprId },
    Expr(ExprId),
    Return(Option<ExprId>),
    /// `if c0 { .. } else if c1 { .. } else { .. }`
    If {
        arms: Vec<IfArm>,
        else_body: Option<BlockId>,
    },
    /// `static if cond { .. } else { .. }`: the condition is evaluated at
    /// compile time when possible and the losing arm is not linked.
    StaticIf {
        cond: ExprId,
        then_body: BlockId,
        else_body: Option<BlockId>,
    },
    Switch {
        scrutinee: ExprId,
        cases: Vec<SwitchCase>,
    },
    While { cond: ExprId, body: BlockId },
    Block(BlockId),
}

#[derive(Clone, Debug)]
pub struct IfArm {
    pub cond: ExprId,
    pub body: BlockId,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub span: Span,
    /// Empty for the `default` case.
    pub values: Vec<ExprId>,
    pub body: BlockId,
    pub is_default: bool,
}

/// A scoped list of statements.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub span: Span,
    pub stmts: Vec<StmtId>,
}
