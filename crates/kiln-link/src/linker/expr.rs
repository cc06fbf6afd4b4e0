//! Body pass: expressions, calls and struct literals.

use kiln_ast::{
    BinaryOp, DeclId, DeclKind, ExprId, ExprKind, LiteralKind, Primitive, Type, TypeExprId,
    TypeExprKind, TypeKind, UnaryOp,
};
use kiln_core::{CompilationPhase, DiagnosticKind, Span, Symbol};

use super::types::{TypeUse, path_string};
use super::{BodyCx, Linker};
use crate::cursor::CursorHost;
use crate::infer::{CallSite, Inferred, infer};
use crate::moves::MoveChain;
use crate::query::{Instance, Usage, UsageSite};
use crate::relate::{concrete, expand, satisfies};
use crate::subst::substitute;

/// How an expression's value is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Access {
    /// The value is read; reading a moved place is an error.
    Read,
    /// The expression names a place that is written to or projected from.
    Place,
}

impl<'db> Linker<'_, 'db> {
    /// Link `expr` and record its type. `expected` is a closed type the
    /// context wants, used to guide generic inference.
    pub(super) fn link_expr(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        expected: Option<Type<'db>>,
        access: Access,
    ) -> Type<'db> {
        let ast = self.ast;
        let node = ast.expr(expr);
        let db = self.db;
        let ty = match &node.kind {
            ExprKind::IntLit(_) => Type::literal(db, LiteralKind::Int),
            ExprKind::FloatLit(_) => Type::literal(db, LiteralKind::Float),
            ExprKind::StrLit(_) => Type::literal(db, LiteralKind::Str),
            ExprKind::BoolLit(_) => Type::bool(db),
            ExprKind::Name(name) => {
                self.link_name(cx, expr, std::slice::from_ref(name), access, node.span)
            }
            ExprKind::Path(path) => self.link_name(cx, expr, path, access, node.span),
            ExprKind::Call {
                callee,
                generic_args,
                args,
            } => self.link_call(cx, expr, *callee, generic_args, args, expected, node.span),
            ExprKind::Construct { ty, fields } => {
                self.link_construct(cx, expr, *ty, fields, expected, node.span)
            }
            ExprKind::Member { base, field } => {
                self.link_member(cx, expr, *base, *field, access, node.span)
            }
            ExprKind::AddressOf(place) => {
                let hint = expected.and_then(|e| match e.kind(db) {
                    TypeKind::Reference(inner) => Some(*inner),
                    _ => None,
                });
                let inner = self.link_expr(cx, *place, hint, Access::Read);
                Type::new(db, TypeKind::Reference(concrete(db, inner)))
            }
            ExprKind::Unary { op, operand } => {
                self.link_unary(cx, *op, *operand, expected, node.span)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.link_binary(cx, *op, *lhs, *rhs, expected, node.span)
            }
        };
        self.program.known_types.insert(expr, ty);
        ty
    }

    fn link_name(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        path: &[Symbol],
        access: Access,
        span: Span,
    ) -> Type<'db> {
        let ast = self.ast;
        let shown = path_string(path);
        let Some(decl) = self.resolve_path(path) else {
            self.report(
                DiagnosticKind::UnresolvedSymbol,
                CompilationPhase::NameResolution,
                span,
                format!("unresolved name `{shown}`"),
            );
            return Type::unknown(self.db);
        };
        self.program.linked.insert(expr, decl);
        match &ast.decl(decl).kind {
            DeclKind::Variable(_) | DeclKind::Parameter(_) => {
                if access == Access::Read {
                    self.check_moved(cx, &MoveChain::root(decl), span);
                }
                self.program
                    .sigs
                    .decl_type(decl)
                    .unwrap_or_else(|| Type::unknown(self.db))
            }
            DeclKind::Function(func) => {
                if func.generics.is_empty()
                    && let Some(sig) = self.program.sigs.function(decl)
                {
                    return sig.as_type(self.db);
                }
                self.report(
                    DiagnosticKind::InferenceFailure,
                    CompilationPhase::Inference,
                    span,
                    format!("cannot infer generic arguments of `{shown}` used as a value"),
                );
                Type::unknown(self.db)
            }
            DeclKind::Namespace(_) => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("`{shown}` is a namespace, not a value"),
                );
                Type::unknown(self.db)
            }
            DeclKind::Struct(_)
            | DeclKind::Variant(_)
            | DeclKind::Interface(_)
            | DeclKind::Union(_)
            | DeclKind::TypeAlias(_)
            | DeclKind::GenericParam(_) => {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("`{shown}` is a type, not a value"),
                );
                Type::unknown(self.db)
            }
        }
    }

    fn check_moved(&mut self, cx: &BodyCx<'db>, chain: &MoveChain, span: Span) {
        let Some(moved_at) = cx.moves.check_use(chain) else {
            return;
        };
        let place = self.show_chain(chain);
        self.report(
            DiagnosticKind::UseAfterMove,
            CompilationPhase::MoveChecking,
            span,
            format!("use of moved value `{place}` (moved at {moved_at})"),
        );
    }

    fn show_chain(&self, chain: &MoveChain) -> String {
        let mut out = self.name_of(chain.root).to_string();
        for field in &chain.path {
            out.push('.');
            out.push_str(&field.to_string());
        }
        out
    }

    fn link_member(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        base: ExprId,
        field: Symbol,
        access: Access,
        span: Span,
    ) -> Type<'db> {
        let db = self.db;
        let base_ty = self.link_expr(cx, base, None, Access::Place);
        if access == Access::Read
            && let Some(chain) = self.place_chain(expr)
        {
            self.check_moved(cx, &chain, span);
        }
        let mut ty = expand(db, &self.program.sigs, base_ty);
        if let TypeKind::Pointer(inner) | TypeKind::Reference(inner) = ty.kind(db) {
            ty = expand(db, &self.program.sigs, *inner);
        }
        match ty.kind(db) {
            TypeKind::Unknown => ty,
            TypeKind::Linked { decl, args } if self.program.sigs.fields(*decl).is_some() => {
                if let Some(field_ty) = self.program.sigs.field_type(db, *decl, args, field) {
                    return field_ty;
                }
                let shown = self.show(ty);
                self.report(
                    DiagnosticKind::UnresolvedSymbol,
                    CompilationPhase::NameResolution,
                    span,
                    format!("no field `{field}` on `{shown}`"),
                );
                Type::unknown(db)
            }
            _ => {
                let shown = self.show(ty);
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("type `{shown}` has no field `{field}`"),
                );
                Type::unknown(db)
            }
        }
    }

    /// The place an expression names, if it is a binding or a field path
    /// below one.
    pub(super) fn place_chain(&self, expr: ExprId) -> Option<MoveChain> {
        match &self.ast.expr(expr).kind {
            ExprKind::Name(_) | ExprKind::Path(_) => {
                let decl = *self.program.linked.get(&expr)?;
                self.ast
                    .decl(decl)
                    .is_value_binding()
                    .then(|| MoveChain::root(decl))
            }
            ExprKind::Member { base, field } => Some(self.place_chain(*base)?.field(*field)),
            _ => None,
        }
    }

    /// A value of type `ty` is passed on by value: if it is owned and
    /// `expr` names a place, the place is moved out of.
    pub(super) fn consume(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        ty: Type<'db>,
    ) -> Option<MoveChain> {
        if !self.program.sigs.is_owned(self.db, ty) {
            return None;
        }
        let chain = self.place_chain(expr)?;
        cx.moves.mark_moved(chain.clone(), self.ast.expr(expr).span);
        Some(chain)
    }

    fn link_unary(
        &mut self,
        cx: &mut BodyCx<'db>,
        op: UnaryOp,
        operand: ExprId,
        expected: Option<Type<'db>>,
        span: Span,
    ) -> Type<'db> {
        let db = self.db;
        match op {
            UnaryOp::Not => {
                let bool_ty = Type::bool(db);
                let ty = self.link_expr(cx, operand, Some(bool_ty), Access::Read);
                if !satisfies(db, &self.program.sigs, bool_ty, ty) {
                    let found = self.show(ty);
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        CompilationPhase::TypeChecking,
                        span,
                        format!("cannot apply `!` to `{found}`"),
                    );
                }
                bool_ty
            }
            UnaryOp::Neg => {
                let ty = self.link_expr(cx, operand, expected, Access::Read);
                if !self.is_numeric(ty) {
                    let found = self.show(ty);
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        CompilationPhase::TypeChecking,
                        span,
                        format!("cannot apply `-` to `{found}`"),
                    );
                }
                ty
            }
        }
    }

    fn is_numeric(&self, ty: Type<'db>) -> bool {
        match expand(self.db, &self.program.sigs, ty).kind(self.db) {
            TypeKind::Primitive(Primitive::Int { .. } | Primitive::Float { .. })
            | TypeKind::Literal(LiteralKind::Int | LiteralKind::Float)
            | TypeKind::Param(_)
            | TypeKind::Unknown => true,
            _ => false,
        }
    }

    fn link_binary(
        &mut self,
        cx: &mut BodyCx<'db>,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        expected: Option<Type<'db>>,
        span: Span,
    ) -> Type<'db> {
        let db = self.db;
        let bool_ty = Type::bool(db);
        if op.is_logical() {
            for operand in [lhs, rhs] {
                let ty = self.link_expr(cx, operand, Some(bool_ty), Access::Read);
                if !satisfies(db, &self.program.sigs, bool_ty, ty) {
                    let found = self.show(ty);
                    self.report(
                        DiagnosticKind::TypeMismatch,
                        CompilationPhase::TypeChecking,
                        self.ast.expr(operand).span,
                        format!("operand of `{}` must be `bool`, found `{found}`", op_symbol(op)),
                    );
                }
            }
            return bool_ty;
        }

        let lhs_hint = if op.is_comparison() { None } else { expected };
        let lhs_ty = self.link_expr(cx, lhs, lhs_hint, Access::Read);
        let lhs_literal = matches!(lhs_ty.kind(db), TypeKind::Literal(_));
        let rhs_hint = (!lhs_literal && !lhs_ty.is_open(db)).then_some(lhs_ty);
        let rhs_ty = self.link_expr(cx, rhs, rhs_hint, Access::Read);
        let rhs_literal = matches!(rhs_ty.kind(db), TypeKind::Literal(_));

        let sigs = &self.program.sigs;
        if !satisfies(db, sigs, lhs_ty, rhs_ty) && !satisfies(db, sigs, rhs_ty, lhs_ty) {
            let (l, r) = (self.show(lhs_ty), self.show(rhs_ty));
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                span,
                format!("cannot apply `{}` to `{l}` and `{r}`", op_symbol(op)),
            );
            return if op.is_comparison() {
                bool_ty
            } else {
                Type::unknown(db)
            };
        }
        if lhs_literal && !rhs_literal {
            self.settle_literal(lhs, lhs_ty, rhs_ty);
        } else if rhs_literal && !lhs_literal {
            self.settle_literal(rhs, rhs_ty, lhs_ty);
        }
        match op.is_comparison() {
            true => bool_ty,
            false if lhs_literal => rhs_ty,
            false => lhs_ty,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn link_call(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        callee: ExprId,
        generic_args: &[TypeExprId],
        args: &[ExprId],
        expected: Option<Type<'db>>,
        span: Span,
    ) -> Type<'db> {
        let ast = self.ast;
        let db = self.db;
        let target = match &ast.expr(callee).kind {
            ExprKind::Name(name) => self.resolve_path(std::slice::from_ref(name)),
            ExprKind::Path(path) => self.resolve_path(path),
            _ => None,
        }
        .filter(|d| ast.decl(*d).as_function().is_some() && !self.ignored.contains(d));
        let Some(func) = target else {
            return self.link_indirect_call(cx, callee, args, span);
        };
        self.program.linked.insert(callee, func);
        let Some(sig) = self.program.sigs.function(func).cloned() else {
            return Type::unknown(db);
        };
        let name = self.name_of(func);
        let formals: Vec<Type<'db>> = sig.explicit_params().map(|p| p.ty).collect();
        if formals.len() != args.len() {
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                span,
                format!(
                    "`{name}` takes {} argument{} but {} were supplied",
                    formals.len(),
                    if formals.len() == 1 { "" } else { "s" },
                    args.len()
                ),
            );
            for &arg in args {
                self.link_expr(cx, arg, None, Access::Read);
            }
            return Type::unknown(db);
        }

        let arg_types: Vec<Type<'db>> = formals
            .iter()
            .zip(args)
            .map(|(formal, arg)| {
                let hint = (!formal.is_open(db)).then_some(*formal);
                self.link_expr(cx, *arg, hint, Access::Read)
            })
            .collect();
        let mut explicit: Vec<Type<'db>> = generic_args
            .iter()
            .map(|t| self.link_type(*t, cx.host, TypeUse::Use))
            .collect();

        let generics = self.program.sigs.generics(func).to_vec();
        if generics.is_empty() {
            if !explicit.is_empty() {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("`{name}` is not generic"),
                );
            }
            self.program.usages.insert(
                UsageSite::Expr(expr),
                Usage {
                    decl: func,
                    instance: Instance::NonGeneric,
                },
            );
            self.bind_args(cx, args, &arg_types, &formals);
            return sig.ret;
        }

        self.check_explicit_count(func, &mut explicit, generics.len(), span);
        let Some(call_sig) = self.program.sigs.call_signature(func) else {
            return Type::unknown(db);
        };
        let site = CallSite {
            arg_types: arg_types.clone(),
            expected: expected.filter(|e| !e.is_open(db)),
        };
        let inferred = infer(db, &self.program.sigs, &call_sig, &explicit, &site);
        self.finish_inference(func, &inferred, span);
        let instance = self.use_generic(cx.host, func, inferred.args.clone(), span);
        self.program.usages.insert(
            UsageSite::Expr(expr),
            Usage {
                decl: func,
                instance,
            },
        );
        let params: Vec<Type<'db>> = formals
            .iter()
            .map(|f| substitute(db, *f, &generics, &inferred.args))
            .collect();
        self.bind_in_instance(cx, func, instance, args, &arg_types, &params);
        substitute(db, sig.ret, &generics, &inferred.args)
    }

    /// Call through a value of function type.
    fn link_indirect_call(
        &mut self,
        cx: &mut BodyCx<'db>,
        callee: ExprId,
        args: &[ExprId],
        span: Span,
    ) -> Type<'db> {
        let db = self.db;
        let callee_ty = self.link_expr(cx, callee, None, Access::Read);
        let (params, ret) = match expand(db, &self.program.sigs, callee_ty).kind(db) {
            TypeKind::Function { params, ret } if params.len() == args.len() => {
                (params.clone(), *ret)
            }
            TypeKind::Function { params, .. } => {
                let shown = self.show(callee_ty);
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!(
                        "`{shown}` takes {} arguments but {} were supplied",
                        params.len(),
                        args.len()
                    ),
                );
                for &arg in args {
                    self.link_expr(cx, arg, None, Access::Read);
                }
                return Type::unknown(db);
            }
            TypeKind::Unknown => {
                for &arg in args {
                    self.link_expr(cx, arg, None, Access::Read);
                }
                return Type::unknown(db);
            }
            _ => {
                let shown = self.show(callee_ty);
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("expression of type `{shown}` is not callable"),
                );
                for &arg in args {
                    self.link_expr(cx, arg, None, Access::Read);
                }
                return Type::unknown(db);
            }
        };
        let arg_types: Vec<Type<'db>> = params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let hint = (!param.is_open(db)).then_some(*param);
                self.link_expr(cx, *arg, hint, Access::Read)
            })
            .collect();
        self.bind_args(cx, args, &arg_types, &params);
        ret
    }

    fn link_construct(
        &mut self,
        cx: &mut BodyCx<'db>,
        expr: ExprId,
        ty: TypeExprId,
        fields: &[(Symbol, ExprId)],
        expected: Option<Type<'db>>,
        span: Span,
    ) -> Type<'db> {
        let ast = self.ast;
        let db = self.db;
        let TypeExprKind::Named { path, args: type_args } = &ast.type_expr(ty).kind else {
            self.report(
                DiagnosticKind::TypeMismatch,
                CompilationPhase::TypeChecking,
                span,
                "struct literal must name a struct",
            );
            self.link_field_values(cx, fields);
            return Type::unknown(db);
        };
        let shown = path_string(path);
        let resolved = self.resolve_path(path);
        let Some(strukt) = resolved.filter(|d| self.program.sigs.fields(*d).is_some()) else {
            let (kind, message) = match resolved {
                None => (DiagnosticKind::UnresolvedSymbol, format!("unresolved type `{shown}`")),
                Some(_) => (DiagnosticKind::TypeMismatch, format!("`{shown}` is not a struct")),
            };
            self.report(kind, CompilationPhase::NameResolution, span, message);
            self.link_field_values(cx, fields);
            return Type::unknown(db);
        };
        self.program.linked.insert(expr, strukt);
        let declared = self
            .program
            .sigs
            .fields(strukt)
            .map(<[_]>::to_vec)
            .unwrap_or_default();
        let generics = self.program.sigs.generics(strukt).to_vec();
        let mut explicit: Vec<Type<'db>> = type_args
            .iter()
            .map(|t| self.link_type(*t, cx.host, TypeUse::Use))
            .collect();
        self.check_explicit_count(strukt, &mut explicit, generics.len(), span);
        let fully_explicit = explicit.len() == generics.len();

        let mut values = Vec::with_capacity(fields.len());
        let mut formals = Vec::with_capacity(fields.len());
        let mut value_types = Vec::with_capacity(fields.len());
        for &(name, value) in fields {
            let Some(&(_, formal)) = declared.iter().find(|(n, _)| *n == name) else {
                self.report(
                    DiagnosticKind::UnresolvedSymbol,
                    CompilationPhase::NameResolution,
                    ast.expr(value).span,
                    format!("no field `{name}` in struct `{shown}`"),
                );
                self.link_expr(cx, value, None, Access::Read);
                continue;
            };
            let hint = fully_explicit
                .then(|| substitute(db, formal, &generics, &explicit))
                .filter(|t| !t.is_open(db));
            value_types.push(self.link_expr(cx, value, hint, Access::Read));
            values.push(value);
            formals.push(formal);
        }
        for (name, _) in &declared {
            if !fields.iter().any(|(n, _)| n == name) {
                self.report(
                    DiagnosticKind::TypeMismatch,
                    CompilationPhase::TypeChecking,
                    span,
                    format!("missing field `{name}` in `{shown}` literal"),
                );
            }
        }

        if generics.is_empty() {
            self.program.usages.insert(
                UsageSite::Expr(expr),
                Usage {
                    decl: strukt,
                    instance: Instance::NonGeneric,
                },
            );
            self.bind_args(cx, &values, &value_types, &formals);
            return Type::linked(db, strukt, Vec::new());
        }

        let sig = self.program.sigs.construct_signature(db, strukt, &formals);
        let site = CallSite {
            arg_types: value_types.clone(),
            expected: expected.filter(|e| !e.is_open(db)),
        };
        let inferred = infer(db, &self.program.sigs, &sig, &explicit, &site);
        self.finish_inference(strukt, &inferred, span);
        let instance = self.use_generic(cx.host, strukt, inferred.args.clone(), span);
        self.program.usages.insert(
            UsageSite::Expr(expr),
            Usage {
                decl: strukt,
                instance,
            },
        );
        let params: Vec<Type<'db>> = formals
            .iter()
            .map(|f| substitute(db, *f, &generics, &inferred.args))
            .collect();
        self.bind_in_instance(cx, strukt, instance, &values, &value_types, &params);
        Type::linked(db, strukt, inferred.args)
    }

    fn link_field_values(&mut self, cx: &mut BodyCx<'db>, fields: &[(Symbol, ExprId)]) {
        for &(_, value) in fields {
            self.link_expr(cx, value, None, Access::Read);
        }
    }

    fn check_explicit_count(
        &mut self,
        decl: DeclId,
        explicit: &mut Vec<Type<'db>>,
        expected: usize,
        span: Span,
    ) {
        if explicit.len() <= expected {
            return;
        }
        let name = self.name_of(decl);
        self.report(
            DiagnosticKind::TypeMismatch,
            CompilationPhase::Inference,
            span,
            format!(
                "`{name}` takes {expected} generic argument{} but {} were supplied",
                if expected == 1 { "" } else { "s" },
                explicit.len()
            ),
        );
        explicit.truncate(expected);
    }

    fn finish_inference(&mut self, decl: DeclId, inferred: &Inferred<'db>, span: Span) {
        let name = self.name_of(decl);
        for &param in &inferred.unresolved {
            let param_name = self.ast.generic_param(param).name;
            self.report(
                DiagnosticKind::InferenceFailure,
                CompilationPhase::Inference,
                span,
                format!("could not infer generic argument for parameter `{param_name}` of `{name}`"),
            );
        }
        self.check_bounds(decl, &inferred.args, span);
    }

    /// Check arguments against the selected instance's parameter types.
    /// A fixed iteration is active while its arguments are bound.
    fn bind_in_instance(
        &mut self,
        cx: &mut BodyCx<'db>,
        decl: DeclId,
        instance: Instance,
        args: &[ExprId],
        arg_types: &[Type<'db>],
        params: &[Type<'db>],
    ) {
        match instance {
            Instance::Iteration(index) => {
                let mut active = self.activate(decl, index);
                active.bind_args(cx, args, arg_types, params);
            }
            Instance::NonGeneric | Instance::Dependent(_) | Instance::Unresolved => {
                self.bind_args(cx, args, arg_types, params)
            }
        }
    }

    fn bind_args(
        &mut self,
        cx: &mut BodyCx<'db>,
        args: &[ExprId],
        arg_types: &[Type<'db>],
        params: &[Type<'db>],
    ) {
        // Arguments were read before any of them moved. Replay the moves in
        // evaluation order so a place passed twice is caught, unless the
        // read already reported it.
        let places: Vec<Option<MoveChain>> = args
            .iter()
            .map(|&arg| {
                self.place_chain(arg)
                    .filter(|chain| cx.moves.check_use(chain).is_none())
            })
            .collect();
        let mut consumed: Vec<MoveChain> = Vec::new();
        for (((&arg, &actual), &param), place) in
            args.iter().zip(arg_types).zip(params).zip(places)
        {
            let span = self.ast.expr(arg).span;
            self.expect_type(param, actual, span);
            self.settle_literal(arg, actual, param);
            if let Some(chain) = place
                && consumed.iter().any(|c| c.overlaps(&chain))
            {
                self.check_moved(cx, &chain, span);
            }
            // Reference parameters borrow.
            if !matches!(param.kind(self.db), TypeKind::Reference(_))
                && let Some(chain) = self.consume(cx, arg, actual)
            {
                consumed.push(chain);
            }
        }
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}
