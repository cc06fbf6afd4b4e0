//! Body pass: statements, blocks and branch-aware move tracking.

use kiln_ast::{
    BlockId, DeclId, DeclKind, ExprId, IfArm, Ownership, StmtId, StmtKind, SwitchCase, Type,
    TypeKind,
};
use kiln_core::{CompilationPhase, DiagnosticKind, Span};

use super::expr::Access;
use super::types::TypeUse;
use super::{BodyCx, Linker};
use crate::comptime::{ComptimeEnv, ConstValue};
use crate::error::{LinkError, LinkResult};
use crate::moves::{MoveChain, MoveTracker};
use crate::query::ScheduledDrop;
use crate::relate::{concrete, expand, satisfies};
use crate::signature::OwnershipInfo;

impl<'db> Linker<'_, 'db> {
    pub fn link_bodies(&mut self) -> LinkResult<()> {
        let _span = tracing::debug_span!("link_bodies", functions = self.bodies.len()).entered();
        for decl in self.bodies.clone() {
            let body = self
                .ast
                .decl(decl)
                .as_function()
                .and_then(|f| f.body)
                .ok_or_else(|| LinkError::unexpected_decl(decl, "function with a body"))?;
            self.in_namespaces(decl, |this| this.link_function(decl, body));
        }
        Ok(())
    }

    fn link_function(&mut self, func: DeclId, body: BlockId) {
        let ast = self.ast;
        let _span = tracing::trace_span!("link_function", name = %self.name_of(func)).entered();
        let host = self.generic_host(func);
        let generics = self.generic_frame(func);
        let generic_token = self.scopes.scope_start_with(&generics);
        let params_token = self.scopes.scope_start();
        let params = ast
            .decl(func)
            .as_function()
            .map(|f| f.params.clone())
            .unwrap_or_default();
        for &param in &params {
            self.scopes.declare(self.name_of(param), param);
        }
        let ret = self
            .program
            .sigs
            .function(func)
            .map_or_else(|| Type::void(self.db), |sig| sig.ret);
        let mut cx = BodyCx {
            host,
            ret,
            moves: MoveTracker::new(self.policy),
            locals: vec![params.clone()],
        };
        self.link_block(&mut cx, body);
        self.schedule_drops(&cx, body, &params);
        self.scopes.scope_end(params_token);
        self.scopes.scope_end(generic_token);
    }

    pub(super) fn link_block(&mut self, cx: &mut BodyCx<'db>, block: BlockId) {
        let ast = self.ast;
        let token = self.scopes.scope_start();
        cx.locals.push(Vec::new());
        for &stmt in &ast.block(block).stmts {
            self.link_stmt(cx, stmt);
        }
        let locals = cx.locals.pop().unwrap_or_default();
        self.schedule_drops(cx, block, &locals);
        self.scopes.scope_end(token);
    }

    /// Record the destructor calls due when `block` exits, innermost
    /// binding first. Bindings moved out of, even partially, are not
    /// dropped.
    fn schedule_drops(&mut self, cx: &BodyCx<'db>, block: BlockId, locals: &[DeclId]) {
        for &local in locals.iter().rev() {
            if cx.moves.is_moved_any(local) {
                continue;
            }
            let Some(ty) = self.program.sigs.decl_type(local) else {
                continue;
            };
            let TypeKind::Linked { decl: strukt, .. } = expand(self.db, &self.program.sigs, ty)
                .kind(self.db)
                .clone()
            else {
                continue;
            };
            match self.program.sigs.ownership(strukt) {
                OwnershipInfo::Copy => {}
                OwnershipInfo::Owned {
                    destructor: Some(destructor),
                } => {
                    self.program
                        .drops
                        .entry(block)
                        .or_default()
                        .push(ScheduledDrop {
                            decl: local,
                            destructor,
                        });
                }
                OwnershipInfo::Owned { destructor: None } => {
                    // An unresolvable destructor name was already reported.
                    let named = matches!(
                        self.ast.decl(strukt).as_struct().map(|s| &s.ownership),
                        Some(Ownership::Owned {
                            destructor: Some(_)
                        })
                    );
                    if named {
                        continue;
                    }
                    let (var, ty_name) = (self.name_of(local), self.name_of(strukt));
                    let span = self.ast.decl(local).span;
                    self.report(
                        DiagnosticKind::MissingDestructor,
                        CompilationPhase::MoveChecking,
                        span,
                        format!("`{var}` of owned type `{ty_name}` leaves scope but `{ty_name}` has no destructor"),
                    );
                }
            }
        }
    }

    /// Link alternative arms. Each arm starts from the moves in effect
    /// before the construct; what happens afterward is decided by the
    /// configured [`BranchMovePolicy`](crate::config::BranchMovePolicy).
    fn link_arms(&mut self, cx: &mut BodyCx<'db>, arms: &[BlockId], exhaustive: bool) {
        let mut branch = cx.moves.begin_branch();
        for &arm in arms {
            self.link_block(cx, arm);
            cx.moves.end_arm(&mut branch);
        }
        cx.moves.end_branch(branch, exhaustive);
    }

    fn link_stmt(&mut self, cx: &mut BodyCx<'db>, stmt: StmtId) {
        let ast = self.ast;
        let span = ast.stmt(stmt).span;
        match &ast.stmt(stmt).kind {
            StmtKind::Let { decl, init } => self.link_let(cx, *decl, *init, span),
            StmtKind::Assign { target, value } => self.link_assign(cx, *target, *value),
            StmtKind::Expr(expr) => {
                let ty = self.link_expr(cx, *expr, None, Access::Read);
                self.consume(cx, *expr, ty);
            }
            StmtKind::Return(value) => self.link_return(cx, *value, span),
            StmtKind::If { arms, else_body } => self.link_if(cx, arms, *else_body),
            StmtKind::StaticIf {
                cond,
                then_body,
                else_body,
            } => self.link_static_if(cx, stmt, *cond, *then_body, *else_body),
            StmtKind::Switch { scrutinee, cases } => self.link_switch(cx, *scrutinee, cases),
            StmtKind::While { cond, body } => {
                self.link_cond(cx, *cond);
                self.link_arms(cx, &[*body], false);
            }
            StmtKind::Block(block) => self.link_block(cx, *block),
        }
    }

    fn link_let(&mut self, cx: &mut BodyCx<'db>, decl: DeclId, init: Option<ExprId>, span: Span) {
        let ast = self.ast;
        let DeclKind::Variable(var) = &ast.decl(decl).kind else {
            return;
        };
        let declared = var.ty.map(|t| self.link_type(t, cx.host, TypeUse::Use));
        let ty = match (declared, init) {
            (Some(declared), Some(init)) => {
                let hint = (!declared.is_open(self.db)).then_some(declared);
                let actual = self.link_expr(cx, init, hint, Access::Read);
                self.expect_type(declared, actual, ast.expr(init).span);
                self.settle_literal(init, actual, declared);
                self.consume(cx, init, actual);
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init)) => {
                let actual = self.link_expr(cx, init, None, Access::Read);
                let ty = concrete(self.db, actual);
                self.program.known_types.insert(init, ty);
                self.consume(cx, init, actual);
                ty
            }
            (None, None) => {
                let name = self.name_of(decl);
                self.report(
                    DiagnosticKind::InferenceFailure,
                    CompilationPhase::Inference,
                    span,
                    format!("cannot infer the type of `{name}` without a type or initializer"),
                );
                Type::unknown(self.db)
            }
        };
        self.program.sigs.decl_types.insert(decl, ty);
        if var.comptime
            && let Some(init) = init
        {
            self.evaluate_comptime(decl, init);
        }
        // Declared after the initializer so `let x = x;` reads the outer `x`.
        self.scopes.declare(self.name_of(decl), decl);
        if let Some(frame) = cx.locals.last_mut() {
            frame.push(decl);
        }
        // A fresh binding is never moved, even if an older one reused its
        // declaration in a loop.
        cx.moves.mark_unmoved(&MoveChain::root(decl));
    }

    fn evaluate_comptime(&mut self, decl: DeclId, init: ExprId) {
        let env = ComptimeEnv {
            ast: self.ast,
            linked: &self.program.linked,
            constants: &self.program.constants,
        };
        if let Some(value) = self.evaluator.evaluate(init, &env) {
            tracing::trace!(decl = %decl, %value, "comptime binding");
            self.program.constants.insert(decl, value);
        }
    }

    fn link_assign(&mut self, cx: &mut BodyCx<'db>, target: ExprId, value: ExprId) {
        let target_ty = self.link_expr(cx, target, None, Access::Place);
        let hint = (!target_ty.is_open(self.db)).then_some(target_ty);
        let value_ty = self.link_expr(cx, value, hint, Access::Read);
        self.expect_type(target_ty, value_ty, self.ast.expr(value).span);
        self.settle_literal(value, value_ty, target_ty);
        self.consume(cx, value, value_ty);
        if let Some(chain) = self.place_chain(target) {
            cx.moves.mark_unmoved(&chain);
        }
    }

    fn link_return(&mut self, cx: &mut BodyCx<'db>, value: Option<ExprId>, span: Span) {
        let ret = cx.ret;
        let Some(value) = value else {
            if !satisfies(self.db, &self.program.sigs, ret, Type::void(self.db)) {
                let shown = self.show(ret);
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("missing return value of type `{shown}`"),
                );
            }
            return;
        };
        let hint = (!ret.is_open(self.db)).then_some(ret);
        let ty = self.link_expr(cx, value, hint, Access::Read);
        if !satisfies(self.db, &self.program.sigs, ret, ty) {
            let (expected, found) = (self.show(ret), self.show(ty));
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                self.ast.expr(value).span,
                format!("expected return type `{expected}`, found `{found}`"),
            );
        }
        self.settle_literal(value, ty, ret);
        self.consume(cx, value, ty);
    }

    fn link_if(&mut self, cx: &mut BodyCx<'db>, arms: &[IfArm], else_body: Option<BlockId>) {
        for arm in arms {
            self.link_cond(cx, arm.cond);
        }
        let blocks: Vec<BlockId> = arms.iter().map(|a| a.body).chain(else_body).collect();
        self.link_arms(cx, &blocks, else_body.is_some());
    }

    fn link_static_if(
        &mut self,
        cx: &mut BodyCx<'db>,
        stmt: StmtId,
        cond: ExprId,
        then_body: BlockId,
        else_body: Option<BlockId>,
    ) {
        self.link_cond(cx, cond);
        let env = ComptimeEnv {
            ast: self.ast,
            linked: &self.program.linked,
            constants: &self.program.constants,
        };
        let value = self.evaluator.evaluate(cond, &env);
        match value.as_ref().map(ConstValue::as_bool) {
            Some(Some(taken)) => {
                tracing::debug!(%stmt, taken, "static if decided");
                self.program.static_branches.insert(stmt, taken);
                if taken {
                    self.link_block(cx, then_body);
                } else if let Some(else_body) = else_body {
                    self.link_block(cx, else_body);
                }
            }
            Some(None) => {
                let found = value.map(|v| v.to_string()).unwrap_or_default();
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    self.ast.expr(cond).span,
                    format!("`static if` condition must evaluate to a `bool`, found `{found}`"),
                );
                let blocks: Vec<BlockId> = [then_body].into_iter().chain(else_body).collect();
                self.link_arms(cx, &blocks, else_body.is_some());
            }
            None => {
                let blocks: Vec<BlockId> = [then_body].into_iter().chain(else_body).collect();
                self.link_arms(cx, &blocks, else_body.is_some());
            }
        }
    }

    fn link_switch(&mut self, cx: &mut BodyCx<'db>, scrutinee: ExprId, cases: &[SwitchCase]) {
        let scrutinee_ty = self.link_expr(cx, scrutinee, None, Access::Read);
        let scrutinee_ty = concrete(self.db, scrutinee_ty);
        let hint = (!scrutinee_ty.is_open(self.db)).then_some(scrutinee_ty);
        let mut blocks = Vec::with_capacity(cases.len());
        let mut has_default = false;
        for case in cases {
            if case.is_default {
                if has_default {
                    self.report(
                        DiagnosticKind::StructuralAmbiguity,
                        CompilationPhase::TypeChecking,
                        case.span,
                        "multiple `default` cases in switch",
                    );
                    continue;
                }
                has_default = true;
            }
            for &value in &case.values {
                let ty = self.link_expr(cx, value, hint, Access::Read);
                if !satisfies(self.db, &self.program.sigs, scrutinee_ty, ty) {
                    let (found, expected) = (self.show(ty), self.show(scrutinee_ty));
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        CompilationPhase::TypeChecking,
                        self.ast.expr(value).span,
                        format!("case value of type `{found}` does not match switch type `{expected}`"),
                    );
                }
                self.settle_literal(value, ty, scrutinee_ty);
            }
            blocks.push(case.body);
        }
        self.link_arms(cx, &blocks, has_default);
    }

    fn link_cond(&mut self, cx: &mut BodyCx<'db>, cond: ExprId) {
        let bool_ty = Type::bool(self.db);
        let ty = self.link_expr(cx, cond, Some(bool_ty), Access::Read);
        if !satisfies(self.db, &self.program.sigs, bool_ty, ty) {
            let found = self.show(ty);
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                self.ast.expr(cond).span,
                format!("condition must be `bool`, found `{found}`"),
            );
        }
    }

    /// Report `actual` not fitting where `expected` is required.
    pub(super) fn expect_type(&mut self, expected: Type<'db>, actual: Type<'db>, span: Span) -> bool {
        if satisfies(self.db, &self.program.sigs, expected, actual) {
            return true;
        }
        let (expected, found) = (self.show(expected), self.show(actual));
        self.report(
            DiagnosticKind::TypeMismatch,
            CompilationPhase::TypeChecking,
            span,
            format!("expected `{expected}`, found `{found}`"),
        );
        false
    }

    /// A literal bound to a closed scalar type takes that type.
    pub(super) fn settle_literal(&mut self, expr: ExprId, actual: Type<'db>, expected: Type<'db>) {
        if !matches!(actual.kind(self.db), TypeKind::Literal(_)) {
            return;
        }
        let expected = expand(self.db, &self.program.sigs, expected);
        let settled = match expected.kind(self.db) {
            TypeKind::Primitive(_) => expected,
            TypeKind::Reference(inner)
                if matches!(inner.kind(self.db), TypeKind::Primitive(_)) =>
            {
                *inner
            }
            _ => return,
        };
        self.program.known_types.insert(expr, settled);
    }
}

