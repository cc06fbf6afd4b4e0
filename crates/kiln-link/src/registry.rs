//! Instantiation registry.
//!
//! Every generic declaration owns a list of *iterations*: the distinct
//! concrete argument lists it has been instantiated with. Iterations are
//! append-only and deduplicated structurally, so an [`IterationIndex`] is a
//! stable name for one monomorphization that later phases can store.
//!
//! The registry also stores the subscriber graph used by
//! [`propagate`](crate::propagate) and the cursor table behind
//! [`ActiveIteration`](crate::cursor::ActiveIteration).

use std::collections::{HashMap, VecDeque};

use cranelift_entity::{PrimaryMap, entity_impl};
use kiln_ast::{DeclId, GenericParamId, Type};
use kiln_core::Span;

use crate::cursor::{CursorHost, CursorTable};
use crate::relate::{TypeEnv, all_same};
use crate::subst::substitute_all;

/// Index of an iteration within its declaration. The first iteration
/// created for a declaration has index 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IterationIndex(u32);
entity_impl!(IterationIndex, "iter");

/// Reference to a registered subscriber.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u32);
entity_impl!(SubscriberId, "sub");

/// One monomorphization of a generic declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iteration<'db> {
    pub index: IterationIndex,
    pub args: Vec<Type<'db>>,
    /// Number of propagation steps between this iteration and an
    /// iteration requested directly by source code.
    pub depth: u32,
}

#[derive(Clone, Debug, Default)]
pub struct RegistryEntry<'db> {
    iterations: PrimaryMap<IterationIndex, Iteration<'db>>,
    /// Subscribers for which this declaration is the host.
    subscribers: Vec<SubscriberId>,
}

impl<'db> RegistryEntry<'db> {
    pub fn iterations(&self) -> impl ExactSizeIterator<Item = &Iteration<'db>> {
        self.iterations.values()
    }

    pub fn subscribers(&self) -> &[SubscriberId] {
        &self.subscribers
    }
}

/// A generic use nested inside a generic host: `List<T>` inside
/// `struct Cache<T>`. Each new iteration of `host` yields an iteration of
/// `target` with `template` closed over the host's arguments.
#[derive(Clone, Debug)]
pub struct Subscriber<'db> {
    pub host: DeclId,
    /// Generic parameters of `host`, in order.
    pub host_params: Vec<GenericParamId>,
    pub target: DeclId,
    /// Target arguments in open form, mentioning `host_params`.
    pub template: Vec<Type<'db>>,
    /// Where the nested use appears.
    pub span: Span,
}

impl<'db> Subscriber<'db> {
    /// Target arguments for a host iteration with arguments `host_args`.
    pub fn target_args(
        &self,
        db: &'db dyn salsa::Database,
        host_args: &[Type<'db>],
    ) -> Vec<Type<'db>> {
        substitute_all(db, &self.template, &self.host_params, host_args)
    }
}

/// A host iteration whose subscriber has not been notified yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notification {
    pub subscriber: SubscriberId,
    pub host_iteration: IterationIndex,
}

#[derive(Debug, Default)]
pub struct InstantiationRegistry<'db> {
    entries: HashMap<DeclId, RegistryEntry<'db>>,
    subscribers: PrimaryMap<SubscriberId, Subscriber<'db>>,
    subscriber_keys: HashMap<(DeclId, DeclId, Vec<Type<'db>>), SubscriberId>,
    pending: VecDeque<Notification>,
    cursors: CursorTable,
}

impl<'db> InstantiationRegistry<'db> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the iteration of `decl` whose arguments are pairwise
    /// [`is_same`](crate::relate::is_same) to `args`.
    pub fn find(
        &self,
        db: &'db dyn salsa::Database,
        env: &dyn TypeEnv<'db>,
        decl: DeclId,
        args: &[Type<'db>],
    ) -> Option<IterationIndex> {
        let entry = self.entries.get(&decl)?;
        entry
            .iterations
            .values()
            .find(|it| all_same(db, env, &it.args, args))
            .map(|it| it.index)
    }

    /// Return the iteration of `decl` for `args`, creating it if no
    /// structurally equal one exists. The flag is `true` iff it was created.
    pub fn get_or_create(
        &mut self,
        db: &'db dyn salsa::Database,
        env: &dyn TypeEnv<'db>,
        decl: DeclId,
        args: Vec<Type<'db>>,
        depth: u32,
    ) -> (IterationIndex, bool) {
        if let Some(index) = self.find(db, env, decl, &args) {
            return (index, false);
        }
        let entry = self.entries.entry(decl).or_default();
        let index = entry.iterations.next_key();
        entry.iterations.push(Iteration { index, args, depth });
        tracing::debug!(%decl, %index, depth, "created iteration");
        (index, true)
    }

    pub fn entry(&self, decl: DeclId) -> Option<&RegistryEntry<'db>> {
        self.entries.get(&decl)
    }

    /// Every declaration with at least one iteration or subscriber, ordered
    /// by declaration.
    pub fn entries(&self) -> Vec<(DeclId, &RegistryEntry<'db>)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(d, e)| (*d, e)).collect();
        entries.sort_by_key(|(d, _)| *d);
        entries
    }

    pub fn iteration(&self, decl: DeclId, index: IterationIndex) -> Option<&Iteration<'db>> {
        self.entries.get(&decl)?.iterations.get(index)
    }

    pub fn iteration_count(&self, decl: DeclId) -> usize {
        self.entries.get(&decl).map_or(0, |e| e.iterations.len())
    }

    /// Created iterations of `decl`, plus the distinct iterations that
    /// queued propagation notifications are going to create.
    pub fn total_iterations(
        &self,
        db: &'db dyn salsa::Database,
        env: &dyn TypeEnv<'db>,
        decl: DeclId,
    ) -> usize {
        let mut upcoming: Vec<Vec<Type<'db>>> = Vec::new();
        for note in &self.pending {
            let sub = &self.subscribers[note.subscriber];
            if sub.target != decl {
                continue;
            }
            let Some(host) = self.iteration(sub.host, note.host_iteration) else {
                continue;
            };
            let args = sub.target_args(db, &host.args);
            if self.find(db, env, decl, &args).is_none()
                && !upcoming.iter().any(|u| all_same(db, env, u, &args))
            {
                upcoming.push(args);
            }
        }
        self.iteration_count(decl) + upcoming.len()
    }

    /// Register a subscriber, deduplicated by `(host, target, template)`.
    /// The flag is `true` iff the subscriber is new.
    pub fn add_subscriber(&mut self, subscriber: Subscriber<'db>) -> (SubscriberId, bool) {
        let key = (
            subscriber.host,
            subscriber.target,
            subscriber.template.clone(),
        );
        if let Some(&id) = self.subscriber_keys.get(&key) {
            return (id, false);
        }
        let host = subscriber.host;
        let target = subscriber.target;
        let id = self.subscribers.push(subscriber);
        self.subscriber_keys.insert(key, id);
        self.entries.entry(host).or_default().subscribers.push(id);
        self.cursors.link(host, id, target);
        tracing::debug!(%host, %target, subscriber = %id, "registered subscriber");
        (id, true)
    }

    pub fn subscriber(&self, id: SubscriberId) -> &Subscriber<'db> {
        &self.subscribers[id]
    }

    pub fn subscribers_of(&self, host: DeclId) -> &[SubscriberId] {
        match self.entries.get(&host) {
            Some(entry) => &entry.subscribers,
            None => &[],
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn enqueue(&mut self, note: Notification) {
        self.pending.push_back(note);
    }

    pub(crate) fn next_pending(&mut self) -> Option<Notification> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl CursorHost for InstantiationRegistry<'_> {
    fn cursors(&self) -> &CursorTable {
        &self.cursors
    }

    fn cursors_mut(&mut self) -> &mut CursorTable {
        &mut self.cursors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relate::EmptyEnv;
    use cranelift_entity::EntityRef;
    use kiln_ast::Primitive;
    use proptest::prelude::*;

    #[test]
    fn test_first_iteration_is_zero_and_dedup() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let mut registry = InstantiationRegistry::new();
        let identity = DeclId::new(0);

        let (i0, created) = registry.get_or_create(db, &EmptyEnv, identity, vec![Type::int(db)], 0);
        assert_eq!(i0, IterationIndex::new(0));
        assert!(created);

        let (again, created) =
            registry.get_or_create(db, &EmptyEnv, identity, vec![Type::int(db)], 0);
        assert_eq!(again, i0);
        assert!(!created);

        let (i1, created) = registry.get_or_create(db, &EmptyEnv, identity, vec![Type::str(db)], 0);
        assert_eq!(i1, IterationIndex::new(1));
        assert!(created);
        assert_eq!(registry.iteration_count(identity), 2);
        assert_eq!(
            registry.iteration(identity, i1).map(|it| it.args.clone()),
            Some(vec![Type::str(db)])
        );
    }

    #[test]
    fn test_subscriber_dedup() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let mut registry = InstantiationRegistry::new();
        let t = GenericParamId::new(0);
        let sub = Subscriber {
            host: DeclId::new(0),
            host_params: vec![t],
            target: DeclId::new(1),
            template: vec![Type::param(db, t)],
            span: Span::default(),
        };
        let (a, new_a) = registry.add_subscriber(sub.clone());
        let (b, new_b) = registry.add_subscriber(sub);
        assert_eq!(a, b);
        assert!(new_a);
        assert!(!new_b);
        assert_eq!(registry.subscribers_of(DeclId::new(0)), &[a]);
    }

    #[test]
    fn test_total_iterations_counts_pending() {
        let db = salsa::DatabaseImpl::default();
        let db: &dyn salsa::Database = &db;
        let mut registry = InstantiationRegistry::new();
        let t = GenericParamId::new(0);
        let (pair, boxed) = (DeclId::new(0), DeclId::new(1));
        let (sub, _) = registry.add_subscriber(Subscriber {
            host: pair,
            host_params: vec![t],
            target: boxed,
            template: vec![Type::param(db, t)],
            span: Span::default(),
        });
        let (host_iter, _) = registry.get_or_create(db, &EmptyEnv, pair, vec![Type::int(db)], 0);
        registry.enqueue(Notification {
            subscriber: sub,
            host_iteration: host_iter,
        });
        // Same request twice counts once.
        registry.enqueue(Notification {
            subscriber: sub,
            host_iteration: host_iter,
        });
        assert_eq!(registry.iteration_count(boxed), 0);
        assert_eq!(registry.total_iterations(db, &EmptyEnv, boxed), 1);

        registry.get_or_create(db, &EmptyEnv, boxed, vec![Type::int(db)], 1);
        assert_eq!(registry.total_iterations(db, &EmptyEnv, boxed), 1);
    }

    fn arb_prim() -> impl Strategy<Value = Primitive> {
        prop_oneof![
            Just(Primitive::Bool),
            Just(Primitive::Str),
            Just(Primitive::INT),
            Just(Primitive::FLOAT),
            Just(Primitive::Int {
                bits: 8,
                signed: false
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_dedup_and_monotonic(requests in prop::collection::vec(prop::collection::vec(arb_prim(), 1..3), 1..20)) {
            let db = salsa::DatabaseImpl::default();
            let db: &dyn salsa::Database = &db;
            let mut registry = InstantiationRegistry::new();
            let decl = DeclId::new(0);
            let mut seen: Vec<(Vec<Primitive>, IterationIndex)> = Vec::new();
            let mut last_len = 0;
            for request in requests {
                let args: Vec<_> = request.iter().map(|p| Type::primitive(db, *p)).collect();
                let (index, created) = registry.get_or_create(db, &EmptyEnv, decl, args, 0);
                match seen.iter().find(|(r, _)| *r == request) {
                    Some((_, prev)) => {
                        prop_assert_eq!(*prev, index);
                        prop_assert!(!created);
                    }
                    None => {
                        prop_assert!(created);
                        seen.push((request, index));
                    }
                }
                let len = registry.iteration_count(decl);
                prop_assert!(len >= last_len);
                last_len = len;
            }
            prop_assert_eq!(last_len, seen.len());
        }
    }
}
