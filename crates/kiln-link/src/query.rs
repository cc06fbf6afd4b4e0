//! The linked program and the queries later phases run against it.
//!
//! Types recorded inside a generic declaration stay in open form. Queries
//! close them over an iteration, taken either from the active cursors
//! (`known_type`, `call_iteration`) or from an explicit
//! [`IterationContext`] (`known_type_in`, `call_iteration_in`).

use std::collections::HashMap;
use std::fmt::Write as _;

use kiln_ast::{
    Ast, BlockId, DeclId, ExprId, GenericParamId, LiteralKind, StmtId, Type, TypeExprId, TypeKind,
};
use smallvec::SmallVec;

use crate::comptime::ConstValue;
use crate::cursor::{CursorHost, CursorTable, IterationContext};
use crate::registry::{InstantiationRegistry, Iteration, IterationIndex, SubscriberId};
use crate::signature::Signatures;
use crate::subst::substitute;

/// A place in the source that names a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UsageSite {
    /// A call or struct literal.
    Expr(ExprId),
    /// A type annotation.
    Type(TypeExprId),
}

/// Which instance of a declaration a usage refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instance {
    /// The declaration is not generic.
    NonGeneric,
    /// Closed arguments: a fixed iteration.
    Iteration(IterationIndex),
    /// Arguments mention the enclosing generic declaration's parameters;
    /// the iteration depends on the host's iteration.
    Dependent(SubscriberId),
    /// Arguments could not be determined or a limit stopped instantiation.
    Unresolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Usage {
    pub decl: DeclId,
    pub instance: Instance,
}

/// A value that must be destroyed when its block exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledDrop {
    pub decl: DeclId,
    pub destructor: DeclId,
}

#[derive(Debug, Default)]
pub struct LinkedProgram<'db> {
    pub(crate) sigs: Signatures<'db>,
    pub(crate) registry: InstantiationRegistry<'db>,
    pub(crate) linked: HashMap<ExprId, DeclId>,
    pub(crate) known_types: HashMap<ExprId, Type<'db>>,
    pub(crate) usages: HashMap<UsageSite, Usage>,
    pub(crate) drops: HashMap<BlockId, Vec<ScheduledDrop>>,
    pub(crate) static_branches: HashMap<StmtId, bool>,
    pub(crate) constants: HashMap<DeclId, ConstValue>,
}

impl<'db> LinkedProgram<'db> {
    pub fn signatures(&self) -> &Signatures<'db> {
        &self.sigs
    }

    pub fn registry(&self) -> &InstantiationRegistry<'db> {
        &self.registry
    }

    /// The declaration a name, path, call or struct literal resolved to.
    pub fn linked_declaration(&self, expr: ExprId) -> Option<DeclId> {
        self.linked.get(&expr).copied()
    }

    /// Type of `expr` closed over the active iterations.
    pub fn known_type(&self, db: &'db dyn salsa::Database, expr: ExprId) -> Option<Type<'db>> {
        let ty = *self.known_types.get(&expr)?;
        Some(self.close(db, ty, |decl| self.active_of(decl)))
    }

    /// Type of `expr` closed over the iterations selected by `ctx`.
    pub fn known_type_in(
        &self,
        db: &'db dyn salsa::Database,
        expr: ExprId,
        ctx: &IterationContext,
    ) -> Option<Type<'db>> {
        let ty = *self.known_types.get(&expr)?;
        Some(self.close(db, ty, |decl| ctx.iteration_of(decl)))
    }

    /// Declared type of a parameter or local, closed over the active
    /// iterations.
    pub fn type_of_decl(&self, db: &'db dyn salsa::Database, decl: DeclId) -> Option<Type<'db>> {
        let ty = self.sigs.decl_type(decl)?;
        Some(self.close(db, ty, |owner| self.active_of(owner)))
    }

    pub fn active_iteration(&self, decl: DeclId) -> Option<IterationIndex> {
        self.active_of(decl)
    }

    pub fn iteration_args(&self, decl: DeclId, index: IterationIndex) -> Option<&[Type<'db>]> {
        self.registry
            .iteration(decl, index)
            .map(|it| it.args.as_slice())
    }

    pub fn iterations(&self, decl: DeclId) -> impl Iterator<Item = &Iteration<'db>> {
        self.registry
            .entry(decl)
            .into_iter()
            .flat_map(|entry| entry.iterations())
    }

    pub fn total_iterations(&self, db: &'db dyn salsa::Database, decl: DeclId) -> usize {
        self.registry.total_iterations(db, &self.sigs, decl)
    }

    pub fn usage(&self, site: UsageSite) -> Option<Usage> {
        self.usages.get(&site).copied()
    }

    /// The declaration a call or struct literal targets.
    pub fn call_target(&self, expr: ExprId) -> Option<DeclId> {
        self.usage(UsageSite::Expr(expr)).map(|u| u.decl)
    }

    /// Iteration selected by a call, using the active cursors for calls
    /// that depend on their enclosing declaration.
    pub fn call_iteration(&self, expr: ExprId) -> Option<IterationIndex> {
        self.instance_iteration(self.usage(UsageSite::Expr(expr))?, |d| self.active_of(d))
    }

    pub fn call_iteration_in(&self, expr: ExprId, ctx: &IterationContext) -> Option<IterationIndex> {
        self.instance_iteration(self.usage(UsageSite::Expr(expr))?, |d| ctx.iteration_of(d))
    }

    /// Iterations selected by activating `index` of `decl`.
    pub fn context(&self, decl: DeclId, index: IterationIndex) -> IterationContext {
        self.registry.cursors().context(decl, index)
    }

    /// Values to destroy when `block` exits, in destruction order.
    pub fn drops_at(&self, block: BlockId) -> &[ScheduledDrop] {
        self.drops.get(&block).map_or(&[], Vec::as_slice)
    }

    /// The arm a `static if` selected: `true` for the then-arm. `None` if
    /// the condition was not decidable.
    pub fn static_branch(&self, stmt: StmtId) -> Option<bool> {
        self.static_branches.get(&stmt).copied()
    }

    pub fn constant(&self, decl: DeclId) -> Option<&ConstValue> {
        self.constants.get(&decl)
    }

    fn instance_iteration(
        &self,
        usage: Usage,
        host_iteration: impl Fn(DeclId) -> Option<IterationIndex>,
    ) -> Option<IterationIndex> {
        match usage.instance {
            Instance::Iteration(index) => Some(index),
            Instance::Dependent(sub) => {
                let host = self.registry.subscriber(sub).host;
                self.registry.cursors().mapped(sub, host_iteration(host)?)
            }
            Instance::NonGeneric | Instance::Unresolved => None,
        }
    }

    /// Replace every generic parameter whose owner has a selected
    /// iteration with that iteration's argument.
    fn close(
        &self,
        db: &'db dyn salsa::Database,
        ty: Type<'db>,
        iteration_of: impl Fn(DeclId) -> Option<IterationIndex>,
    ) -> Type<'db> {
        let mut mentioned = SmallVec::<[GenericParamId; 4]>::new();
        ty.collect_params(db, &mut mentioned);
        let mut params = Vec::new();
        let mut args = Vec::new();
        for param in mentioned {
            let Some(info) = self.sigs.param_info(param) else {
                continue;
            };
            let arg = iteration_of(info.owner)
                .and_then(|index| self.registry.iteration(info.owner, index))
                .and_then(|it| it.args.get(info.index as usize));
            if let Some(arg) = arg {
                params.push(param);
                args.push(*arg);
            }
        }
        substitute(db, ty, &params, &args)
    }

    /// One line per iteration of every instantiated declaration, in
    /// declaration order: `Box iter0 <int> depth=1`.
    pub fn render_iterations(&self, db: &'db dyn salsa::Database, ast: &Ast) -> String {
        let mut out = String::new();
        for (decl, entry) in self.registry.entries() {
            for it in entry.iterations() {
                let args: Vec<String> = it.args.iter().map(|a| display_type(db, ast, *a)).collect();
                let _ = write!(
                    out,
                    "{} {} <{}>",
                    ast.decl(decl).name,
                    it.index,
                    args.join(", ")
                );
                if it.depth > 0 {
                    let _ = write!(out, " depth={}", it.depth);
                }
                out.push('\n');
            }
        }
        out
    }
}

impl CursorHost for LinkedProgram<'_> {
    fn cursors(&self) -> &CursorTable {
        self.registry.cursors()
    }

    fn cursors_mut(&mut self) -> &mut CursorTable {
        self.registry.cursors_mut()
    }
}

/// Source-like rendering of a type.
pub fn display_type<'db>(db: &'db dyn salsa::Database, ast: &Ast, ty: Type<'db>) -> String {
    let list = |types: &[Type<'db>]| {
        types
            .iter()
            .map(|t| display_type(db, ast, *t))
            .collect::<Vec<_>>()
            .join(", ")
    };
    match ty.kind(db) {
        TypeKind::Primitive(p) => p.to_string(),
        TypeKind::Literal(lit) => match lit {
            LiteralKind::Int => "{integer}".to_string(),
            LiteralKind::Float => "{float}".to_string(),
            LiteralKind::Str => "{string}".to_string(),
        },
        TypeKind::Param(p) => ast.generic_param(*p).name.to_string(),
        TypeKind::Linked { decl, args } if args.is_empty() => ast.decl(*decl).name.to_string(),
        TypeKind::Linked { decl, args } => format!("{}<{}>", ast.decl(*decl).name, list(args)),
        TypeKind::Pointer(inner) => format!("*{}", display_type(db, ast, *inner)),
        TypeKind::Reference(inner) => format!("&{}", display_type(db, ast, *inner)),
        TypeKind::Array {
            elem,
            len: Some(len),
        } => format!("[{}; {len}]", display_type(db, ast, *elem)),
        TypeKind::Array { elem, len: None } => format!("[{}]", display_type(db, ast, *elem)),
        TypeKind::Function { params, ret } => {
            format!("fn({}) -> {}", list(params), display_type(db, ast, *ret))
        }
        TypeKind::Unknown => "?".to_string(),
    }
}
