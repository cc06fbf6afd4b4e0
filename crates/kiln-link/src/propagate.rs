//! Dependency propagation through the subscriber graph.
//!
//! When a generic use such as `Box<T>` appears inside a generic host
//! `Pair<T>`, the use cannot be instantiated on its own. It is registered
//! as a subscriber of the host instead, and every iteration of the host
//! produces a matching iteration of the target. Newly created target
//! iterations notify their own subscribers in turn; notifications are
//! processed first-in first-out.
//!
//! Expansion is bounded by [`Limits`]: polymorphic recursion such as
//! `Node<T> { next: *Node<Box<T>> }` would otherwise never terminate.

use std::collections::HashSet;

use kiln_ast::{DeclId, GenericParamId, Type};
use kiln_core::{CompilationPhase, Diagnostic, DiagnosticKind, DiagnosticSink, Span};

use crate::config::Limits;
use crate::cursor::CursorHost;
use crate::registry::{
    InstantiationRegistry, IterationIndex, Notification, Subscriber, SubscriberId,
};
use crate::relate::TypeEnv;

/// Declarations that already hit a limit. Only the first hit per
/// declaration is diagnosed.
#[derive(Clone, Debug, Default)]
pub struct LimitLog {
    reported: HashSet<DeclId>,
}

/// Borrowed view of everything needed to create iterations.
pub struct Instantiator<'a, 'db> {
    pub db: &'db dyn salsa::Database,
    pub env: &'a dyn TypeEnv<'db>,
    pub registry: &'a mut InstantiationRegistry<'db>,
    pub limits: Limits,
    pub limit_log: &'a mut LimitLog,
    pub sink: &'a mut dyn DiagnosticSink,
}

impl<'db> Instantiator<'_, 'db> {
    /// Iteration of `decl` for closed `args`, creating it and propagating
    /// to subscribers if needed.
    ///
    /// Returns `None` if `args` contain `Unknown` or if a limit stopped the
    /// creation.
    pub fn instantiate(
        &mut self,
        decl: DeclId,
        args: Vec<Type<'db>>,
        span: Span,
    ) -> Option<IterationIndex> {
        if args.iter().any(|a| a.contains_unknown(self.db)) {
            return None;
        }
        let index = self.create(decl, args, 0, span)?;
        self.drain();
        Some(index)
    }

    /// Subscribe `target` with open `template` to `host`.
    ///
    /// Subscriptions are deduplicated by `(host, target, template)`. A new
    /// subscriber is immediately notified of every iteration the host
    /// already has.
    pub fn subscribe(
        &mut self,
        host: DeclId,
        host_params: &[GenericParamId],
        target: DeclId,
        template: Vec<Type<'db>>,
        span: Span,
    ) -> SubscriberId {
        let (id, new) = self.registry.add_subscriber(Subscriber {
            host,
            host_params: host_params.to_vec(),
            target,
            template,
            span,
        });
        if new {
            let existing: Vec<IterationIndex> = self
                .registry
                .entry(host)
                .map(|e| e.iterations().map(|it| it.index).collect())
                .unwrap_or_default();
            for host_iteration in existing {
                self.report_parent_usage(id, host_iteration);
            }
            self.drain();
        }
        id
    }

    /// Queue a notification that `host_iteration` of the subscriber's host
    /// exists. Processed by the next drain.
    pub fn report_parent_usage(
        &mut self,
        subscriber: SubscriberId,
        host_iteration: IterationIndex,
    ) {
        tracing::trace!(%subscriber, %host_iteration, "queue parent usage");
        self.registry.enqueue(Notification {
            subscriber,
            host_iteration,
        });
    }

    fn create(
        &mut self,
        decl: DeclId,
        args: Vec<Type<'db>>,
        depth: u32,
        span: Span,
    ) -> Option<IterationIndex> {
        if let Some(index) = self.registry.find(self.db, self.env, decl, &args) {
            return Some(index);
        }
        if depth > self.limits.max_depth {
            self.limit_hit(
                decl,
                span,
                format!(
                    "generic instantiation limit exceeded: nesting depth above {}",
                    self.limits.max_depth
                ),
            );
            return None;
        }
        if self.registry.iteration_count(decl) >= self.limits.max_per_decl as usize {
            self.limit_hit(
                decl,
                span,
                format!(
                    "generic instantiation limit exceeded: more than {} iterations",
                    self.limits.max_per_decl
                ),
            );
            return None;
        }
        let (index, created) = self
            .registry
            .get_or_create(self.db, self.env, decl, args, depth);
        if created {
            let subscribers = self.registry.subscribers_of(decl).to_vec();
            for sub in subscribers {
                self.report_parent_usage(sub, index);
            }
        }
        Some(index)
    }

    fn drain(&mut self) {
        while let Some(note) = self.registry.next_pending() {
            let sub = self.registry.subscriber(note.subscriber).clone();
            let Some(host) = self.registry.iteration(sub.host, note.host_iteration) else {
                continue;
            };
            let depth = host.depth + 1;
            let args = sub.target_args(self.db, &host.args);
            tracing::trace!(
                host = %sub.host,
                host_iteration = %note.host_iteration,
                target = %sub.target,
                "propagate"
            );
            if let Some(target_iteration) = self.create(sub.target, args, depth, sub.span) {
                self.registry
                    .cursors_mut()
                    .record(note.subscriber, note.host_iteration, target_iteration);
            }
        }
    }

    fn limit_hit(&mut self, decl: DeclId, span: Span, message: String) {
        tracing::debug!(%decl, "instantiation limit hit");
        if self.limit_log.reported.insert(decl) {
            self.sink.report(Diagnostic::error(
                DiagnosticKind::InstantiationLimit,
                CompilationPhase::Instantiation,
                span,
                message,
            ));
        }
    }
}
