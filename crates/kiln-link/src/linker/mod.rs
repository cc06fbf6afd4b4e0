//! Two-phase linker.
//!
//! Resolves names to declarations, links type annotations, drives generic
//! instantiation and tracks moves, recording everything in a
//! [`LinkedProgram`].
//!
//! ## Phases
//!
//! - `declare`: every top-level name and namespace member is declared, then
//!   every signature is linked (generic bounds and defaults, parameter and
//!   return types, fields, variant payloads, union members, alias targets,
//!   destructors).
//! - `stmt` and `expr`: function bodies are linked in source order, each
//!   with its own [`BodyCx`].
//!
//! No body is looked at before every signature is linked, so a body may
//! refer to any declaration of the unit regardless of order.

mod declare;
mod expr;
mod stmt;
mod types;

use std::collections::HashSet;

use kiln_ast::{Ast, DeclId, DeclKind, GenericParamId, Type};
use kiln_core::{CompilationPhase, Diagnostic, DiagnosticKind, DiagnosticSink, Span, Symbol};

use crate::comptime::ComptimeEvaluator;
use crate::config::{BranchMovePolicy, LinkConfig, Limits};
use crate::cursor::{CursorHost, CursorTable};
use crate::error::LinkResult;
use crate::moves::MoveTracker;
use crate::propagate::{Instantiator, LimitLog};
use crate::query::{Instance, LinkedProgram};
use crate::scope::{NamespaceScopes, Scope, SymbolTable};

pub struct Linker<'a, 'db> {
    db: &'db dyn salsa::Database,
    ast: &'a Ast,
    limits: Limits,
    policy: BranchMovePolicy,
    evaluator: &'a mut dyn ComptimeEvaluator,
    sink: &'a mut dyn DiagnosticSink,
    scopes: SymbolTable,
    namespaces: NamespaceScopes,
    /// Duplicate function definitions; never linked.
    ignored: HashSet<DeclId>,
    /// Functions with bodies, in source order.
    bodies: Vec<DeclId>,
    /// Diagnostics are dropped while set.
    quiet: bool,
    limit_log: LimitLog,
    program: LinkedProgram<'db>,
}

/// Per-function state of the body pass.
struct BodyCx<'db> {
    /// Generic declaration whose parameters the body may mention.
    host: Option<DeclId>,
    ret: Type<'db>,
    moves: MoveTracker,
    /// Locals declared in each open block, innermost last.
    locals: Vec<Vec<DeclId>>,
}

impl<'a, 'db> Linker<'a, 'db> {
    pub fn new(
        db: &'db dyn salsa::Database,
        ast: &'a Ast,
        config: LinkConfig,
        evaluator: &'a mut dyn ComptimeEvaluator,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            db,
            ast,
            limits: config.limits(db),
            policy: config.branch_moves(db),
            evaluator,
            sink,
            scopes: SymbolTable::new(),
            namespaces: NamespaceScopes::default(),
            ignored: HashSet::new(),
            bodies: Vec::new(),
            quiet: false,
            limit_log: LimitLog::default(),
            program: LinkedProgram::default(),
        }
    }

    /// Run both phases.
    pub fn link(mut self) -> LinkResult<LinkedProgram<'db>> {
        self.ast.validate()?;
        self.declare_items()?;
        self.link_bodies()?;
        Ok(self.finish())
    }

    pub fn finish(self) -> LinkedProgram<'db> {
        self.program
    }

    fn report(
        &mut self,
        kind: DiagnosticKind,
        phase: CompilationPhase,
        span: Span,
        message: impl Into<String>,
    ) {
        if self.quiet {
            return;
        }
        self.sink
            .report(Diagnostic::error(kind, phase, span, message));
    }

    /// Run `f` without reporting diagnostics.
    fn quietly<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was = std::mem::replace(&mut self.quiet, true);
        let result = f(self);
        self.quiet = was;
        result
    }

    fn name_of(&self, decl: DeclId) -> Symbol {
        self.ast.decl(decl).name
    }

    fn show(&self, ty: Type<'db>) -> String {
        crate::query::display_type(self.db, self.ast, ty)
    }

    fn instantiator(&mut self) -> Instantiator<'_, 'db> {
        Instantiator {
            db: self.db,
            env: &self.program.sigs,
            registry: &mut self.program.registry,
            limits: self.limits,
            limit_log: &mut self.limit_log,
            sink: &mut *self.sink,
        }
    }

    /// The generic declaration whose parameters are in scope inside
    /// `decl`: the declaration itself, or the interface a method belongs
    /// to.
    fn generic_host(&self, decl: DeclId) -> Option<DeclId> {
        let d = self.ast.decl(decl);
        if d.is_generic() {
            return Some(decl);
        }
        let parent = d.parent?;
        let p = self.ast.decl(parent);
        (matches!(p.kind, DeclKind::Interface(_)) && p.is_generic()).then_some(parent)
    }

    /// Frame binding the generic parameter names visible in `decl`.
    fn generic_frame(&self, decl: DeclId) -> Scope {
        let mut frame = Scope::new();
        let d = self.ast.decl(decl);
        let outer = d
            .parent
            .filter(|p| matches!(self.ast.decl(*p).kind, DeclKind::Interface(_)));
        for owner in outer.into_iter().chain([decl]) {
            for param in self.ast.decl(owner).generics() {
                let gp = self.ast.generic_param(*param);
                frame.insert(gp.name, gp.decl);
            }
        }
        frame
    }

    /// Run `f` with the member frames of every namespace enclosing `decl`
    /// open, outermost first.
    fn in_namespaces<R>(&mut self, decl: DeclId, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut chain = Vec::new();
        let mut current = self.ast.decl(decl).parent;
        while let Some(parent) = current {
            if matches!(self.ast.decl(parent).kind, DeclKind::Namespace(_)) {
                chain.push(parent);
            }
            current = self.ast.decl(parent).parent;
        }
        let mut tokens = Vec::with_capacity(chain.len());
        for ns in chain.iter().rev() {
            let frame = self.namespaces.scope(*ns).cloned().unwrap_or_default();
            tokens.push(self.scopes.scope_start_with(&frame));
        }
        let result = f(self);
        for token in tokens.into_iter().rev() {
            self.scopes.scope_end(token);
        }
        result
    }

    /// Resolve a possibly qualified name. Leading segments must name
    /// namespaces.
    fn resolve_path(&self, path: &[Symbol]) -> Option<DeclId> {
        let (first, rest) = path.split_first()?;
        let mut decl = self.scopes.find(*first)?;
        for segment in rest {
            if !matches!(self.ast.decl(decl).kind, DeclKind::Namespace(_)) {
                return None;
            }
            decl = self.namespaces.find(decl, *segment)?;
        }
        Some(decl)
    }

    /// Select the instance of generic `decl` for `args`: an iteration when
    /// the arguments are closed, a subscription to `host` when they
    /// mention its parameters.
    fn use_generic(
        &mut self,
        host: Option<DeclId>,
        decl: DeclId,
        args: Vec<Type<'db>>,
        span: Span,
    ) -> Instance {
        if args.iter().any(|a| a.contains_unknown(self.db)) {
            return Instance::Unresolved;
        }
        if args.iter().any(|a| a.is_open(self.db)) {
            let Some(host) = host else {
                return Instance::Unresolved;
            };
            let host_params: Vec<GenericParamId> = self.ast.decl(host).generics().to_vec();
            let sub = self
                .instantiator()
                .subscribe(host, &host_params, decl, args, span);
            return Instance::Dependent(sub);
        }
        match self.instantiator().instantiate(decl, args, span) {
            Some(index) => Instance::Iteration(index),
            None => Instance::Unresolved,
        }
    }
}

impl CursorHost for Linker<'_, '_> {
    fn cursors(&self) -> &CursorTable {
        self.program.cursors()
    }

    fn cursors_mut(&mut self) -> &mut CursorTable {
        self.program.cursors_mut()
    }
}

#[cfg(test)]
mod tests;
