//! Arena storage for one compilation unit.
//!
//! All nodes are owned by [`Ast`] and addressed by entity refs. Nodes are
//! never freed individually; the whole arena is dropped with the unit.

use cranelift_entity::PrimaryMap;

use crate::decl::{DeclKind, Declaration, GenericParameter};
use crate::expr::{Block, Expr, ExprKind, Stmt, StmtKind};
use crate::ids::{BlockId, DeclId, ExprId, GenericParamId, StmtId, TypeExprId};
use crate::types::{TypeExpr, TypeExprKind};

/// An AST for one translation unit.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    pub(crate) decls: PrimaryMap<DeclId, Declaration>,
    pub(crate) exprs: PrimaryMap<ExprId, Expr>,
    pub(crate) stmts: PrimaryMap<StmtId, Stmt>,
    pub(crate) blocks: PrimaryMap<BlockId, Block>,
    pub(crate) type_exprs: PrimaryMap<TypeExprId, TypeExpr>,
    pub(crate) generic_params: PrimaryMap<GenericParamId, GenericParameter>,
    /// Top-level declarations in source order.
    pub(crate) items: Vec<DeclId>,
}

/// A handle that does not point at a node of the expected shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedAst {
    pub what: &'static str,
    pub node: String,
}

impl std::fmt::Display for MalformedAst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.what, self.node)
    }
}

impl Ast {
    pub fn items(&self) -> &[DeclId] {
        &self.items
    }

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id]
    }

    pub fn generic_param(&self, id: GenericParamId) -> &GenericParameter {
        &self.generic_params[id]
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls.iter()
    }

    /// Check that every handle stored in a node points at an existing node
    /// of the right kind.
    ///
    /// The linker indexes the arena directly once this has passed, so a
    /// parser bug surfaces here as an error instead of as a panic deep in a
    /// later phase.
    pub fn validate(&self) -> Result<(), MalformedAst> {
        for &item in &self.items {
            self.check_decl(item, "top-level item")?;
        }
        for (id, decl) in self.decls.iter() {
            if let Some(parent) = decl.parent {
                self.check_decl(parent, "declaration parent")?;
            }
            for &param in decl.generics() {
                self.check_generic(param)?;
            }
            match &decl.kind {
                DeclKind::Variable(var) => {
                    if let Some(ty) = var.ty {
                        self.check_type_expr(ty)?;
                    }
                }
                DeclKind::Parameter(param) => self.check_type_expr(param.ty)?,
                DeclKind::Function(func) => {
                    for &param in &func.params {
                        self.check_decl(param, "function parameter")?;
                        if !matches!(self.decls[param].kind, DeclKind::Parameter(_)) {
                            return Err(malformed("function parameter is not a parameter", id));
                        }
                    }
                    if let Some(ret) = func.ret {
                        self.check_type_expr(ret)?;
                    }
                    if let Some(body) = func.body {
                        self.check_block(body)?;
                    }
                }
                DeclKind::Struct(s) => {
                    for field in &s.fields {
                        self.check_type_expr(field.ty)?;
                    }
                    for &iface in &s.implements {
                        self.check_type_expr(iface)?;
                    }
                }
                DeclKind::Variant(v) => {
                    for case in &v.cases {
                        if let Some(payload) = case.payload {
                            self.check_type_expr(payload)?;
                        }
                    }
                }
                DeclKind::Interface(i) => {
                    for &method in &i.methods {
                        self.check_decl(method, "interface method")?;
                        if self.decls[method].as_function().is_none() {
                            return Err(malformed("interface method is not a function", id));
                        }
                    }
                }
                DeclKind::Union(u) => {
                    for &member in &u.members {
                        self.check_type_expr(member)?;
                    }
                }
                DeclKind::TypeAlias(a) => self.check_type_expr(a.target)?,
                DeclKind::GenericParam(param) => self.check_generic(*param)?,
                DeclKind::Namespace(ns) => {
                    for &member in &ns.members {
                        self.check_decl(member, "namespace member")?;
                    }
                }
            }
        }
        for (_, stmt) in self.stmts.iter() {
            self.check_stmt_children(&stmt.kind)?;
        }
        for (_, expr) in self.exprs.iter() {
            self.check_expr_children(&expr.kind)?;
        }
        for (_, ty) in self.type_exprs.iter() {
            match &ty.kind {
                TypeExprKind::Named { args, .. } => {
                    for &arg in args {
                        self.check_type_expr(arg)?;
                    }
                }
                TypeExprKind::Pointer(inner) | TypeExprKind::Reference(inner) => {
                    self.check_type_expr(*inner)?
                }
                TypeExprKind::Array { elem, .. } => self.check_type_expr(*elem)?,
                TypeExprKind::Function { params, ret } => {
                    for &p in params {
                        self.check_type_expr(p)?;
                    }
                    self.check_type_expr(*ret)?;
                }
            }
        }
        Ok(())
    }

    fn check_stmt_children(&self, kind: &StmtKind) -> Result<(), MalformedAst> {
        match kind {
            StmtKind::Let { decl, init } => {
                self.check_decl(*decl, "let binding")?;
                if !matches!(self.decls[*decl].kind, DeclKind::Variable(_)) {
                    return Err(malformed("let binding is not a variable", *decl));
                }
                if let Some(init) = init {
                    self.check_expr(*init)?;
                }
            }
            StmtKind::Assign { target, value } => {
                self.check_expr(*target)?;
                self.check_expr(*value)?;
            }
            StmtKind::Expr(e) => self.check_expr(*e)?,
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(*value)?;
                }
            }
            StmtKind::If { arms, else_body } => {
                for arm in arms {
                    self.check_expr(arm.cond)?;
                    self.check_block(arm.body)?;
                }
                if let Some(body) = else_body {
                    self.check_block(*body)?;
                }
            }
            StmtKind::StaticIf {
                cond,
                then_body,
                else_body,
            } => {
                self.check_expr(*cond)?;
                self.check_block(*then_body)?;
                if let Some(body) = else_body {
                    self.check_block(*body)?;
                }
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.check_expr(*scrutinee)?;
                for case in cases {
                    for &value in &case.values {
                        self.check_expr(value)?;
                    }
                    self.check_block(case.body)?;
                }
            }
            StmtKind::While { cond, body } => {
                self.check_expr(*cond)?;
                self.check_block(*body)?;
            }
            StmtKind::Block(body) => self.check_block(*body)?,
        }
        Ok(())
    }

    fn check_expr_children(&self, kind: &ExprKind) -> Result<(), MalformedAst> {
        match kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::StrLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Name(_) => {}
            ExprKind::Path(path) => {
                if path.is_empty() {
                    return Err(MalformedAst {
                        what: "empty path expression",
                        node: String::new(),
                    });
                }
            }
            ExprKind::Call {
                callee,
                generic_args,
                args,
            } => {
                self.check_expr(*callee)?;
                for &ty in generic_args {
                    self.check_type_expr(ty)?;
                }
                for &arg in args {
                    self.check_expr(arg)?;
                }
            }
            ExprKind::Construct { ty, fields } => {
                self.check_type_expr(*ty)?;
                for (_, value) in fields {
                    self.check_expr(*value)?;
                }
            }
            ExprKind::Member { base, .. } => self.check_expr(*base)?,
            ExprKind::AddressOf(inner) => self.check_expr(*inner)?,
            ExprKind::Unary { operand, .. } => self.check_expr(*operand)?,
            ExprKind::Binary { lhs, rhs, .. } => {
                self.check_expr(*lhs)?;
                self.check_expr(*rhs)?;
            }
        }
        Ok(())
    }

    fn check_decl(&self, id: DeclId, what: &'static str) -> Result<(), MalformedAst> {
        if self.decls.is_valid(id) {
            Ok(())
        } else {
            Err(malformed(what, id))
        }
    }

    fn check_expr(&self, id: ExprId) -> Result<(), MalformedAst> {
        if self.exprs.is_valid(id) {
            Ok(())
        } else {
            Err(malformed("missing expression", id))
        }
    }

    fn check_block(&self, id: BlockId) -> Result<(), MalformedAst> {
        if !self.blocks.is_valid(id) {
            return Err(malformed("missing block", id));
        }
        for &stmt in &self.blocks[id].stmts {
            if !self.stmts.is_valid(stmt) {
                return Err(malformed("missing statement", stmt));
            }
        }
        Ok(())
    }

    fn check_type_expr(&self, id: TypeExprId) -> Result<(), MalformedAst> {
        if self.type_exprs.is_valid(id) {
            Ok(())
        } else {
            Err(malformed("missing type annotation", id))
        }
    }

    fn check_generic(&self, id: GenericParamId) -> Result<(), MalformedAst> {
        if !self.generic_params.is_valid(id) {
            return Err(malformed("missing generic parameter", id));
        }
        let param = &self.generic_params[id];
        self.check_decl(param.owner, "generic parameter owner")?;
        self.check_decl(param.decl, "generic parameter declaration")?;
        if let Some(bound) = param.bound {
            self.check_type_expr(bound)?;
        }
        if let Some(default) = param.default {
            self.check_type_expr(default)?;
        }
        Ok(())
    }
}

fn malformed(what: &'static str, node: impl std::fmt::Display) -> MalformedAst {
    MalformedAst {
        what,
        node: node.to_string(),
    }
}
