//! Active-iteration cursors.
//!
//! Each generic declaration has at most one *active* iteration at a time,
//! which queries consult when they are not handed an explicit
//! [`IterationContext`]. Cursors are only ever changed through
//! [`ActiveIteration`]: the guard sets a declaration's cursor together with
//! the cursors of every dependent reached through the propagation links,
//! and puts all of them back when it is dropped.
//!
//! Guards nest. A guard is itself a [`CursorHost`], so an inner activation
//! borrows the outer guard and is always released first.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Deref, DerefMut};

use kiln_ast::DeclId;
use smallvec::SmallVec;

use crate::registry::{IterationIndex, SubscriberId};

/// Host-to-dependent propagation edge with its iteration mapping.
#[derive(Clone, Debug)]
struct Link {
    target: DeclId,
    /// Host iteration to target iteration.
    mapping: HashMap<IterationIndex, IterationIndex>,
}

#[derive(Clone, Debug, Default)]
pub struct CursorTable {
    active: HashMap<DeclId, IterationIndex>,
    links: HashMap<SubscriberId, Link>,
    /// Links leaving each host, in registration order.
    by_host: HashMap<DeclId, Vec<SubscriberId>>,
}

impl CursorTable {
    pub fn active_of(&self, decl: DeclId) -> Option<IterationIndex> {
        self.active.get(&decl).copied()
    }

    pub(crate) fn link(&mut self, host: DeclId, subscriber: SubscriberId, target: DeclId) {
        self.links.insert(
            subscriber,
            Link {
                target,
                mapping: HashMap::new(),
            },
        );
        self.by_host.entry(host).or_default().push(subscriber);
    }

    /// Remember that `host_iteration` of the subscriber's host selects
    /// `target_iteration` of its target.
    pub(crate) fn record(
        &mut self,
        subscriber: SubscriberId,
        host_iteration: IterationIndex,
        target_iteration: IterationIndex,
    ) {
        if let Some(link) = self.links.get_mut(&subscriber) {
            link.mapping.insert(host_iteration, target_iteration);
        }
    }

    /// The target iteration a subscriber selected for `host_iteration`.
    pub fn mapped(
        &self,
        subscriber: SubscriberId,
        host_iteration: IterationIndex,
    ) -> Option<IterationIndex> {
        self.links
            .get(&subscriber)?
            .mapping
            .get(&host_iteration)
            .copied()
    }

    /// The iterations selected by activating `index` of `decl`: the pair
    /// itself followed by every dependent reachable through links, breadth
    /// first. A declaration reached along several links keeps the first
    /// iteration found.
    pub fn context(&self, decl: DeclId, index: IterationIndex) -> IterationContext {
        let mut bindings = SmallVec::new();
        let mut visited = HashSet::from([decl]);
        let mut queue = VecDeque::from([(decl, index)]);
        while let Some((host, host_iter)) = queue.pop_front() {
            bindings.push((host, host_iter));
            for sub in self.by_host.get(&host).into_iter().flatten() {
                let link = &self.links[sub];
                if let Some(&target_iter) = link.mapping.get(&host_iter)
                    && visited.insert(link.target)
                {
                    queue.push_back((link.target, target_iter));
                }
            }
        }
        IterationContext { bindings }
    }

    fn set(&mut self, decl: DeclId, index: IterationIndex) -> Option<IterationIndex> {
        self.active.insert(decl, index)
    }

    fn restore(&mut self, decl: DeclId, previous: Option<IterationIndex>) {
        match previous {
            Some(index) => {
                self.active.insert(decl, index);
            }
            None => {
                self.active.remove(&decl);
            }
        }
    }
}

/// Explicit set of active iterations, for queries that take their context
/// as a parameter instead of reading cursors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterationContext {
    bindings: SmallVec<[(DeclId, IterationIndex); 4]>,
}

impl IterationContext {
    /// A context in which no iteration is selected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The activated declaration and iteration this context was built from.
    pub fn root(&self) -> Option<(DeclId, IterationIndex)> {
        self.bindings.first().copied()
    }

    pub fn iteration_of(&self, decl: DeclId) -> Option<IterationIndex> {
        self.bindings
            .iter()
            .find(|(d, _)| *d == decl)
            .map(|(_, i)| *i)
    }

    pub fn bindings(&self) -> &[(DeclId, IterationIndex)] {
        &self.bindings
    }
}

/// Owner of a [`CursorTable`].
pub trait CursorHost {
    fn cursors(&self) -> &CursorTable;

    fn cursors_mut(&mut self) -> &mut CursorTable;

    fn active_of(&self, decl: DeclId) -> Option<IterationIndex> {
        self.cursors().active_of(decl)
    }

    /// Make `index` the active iteration of `decl` until the returned guard
    /// is dropped.
    fn activate(&mut self, decl: DeclId, index: IterationIndex) -> ActiveIteration<'_, Self>
    where
        Self: Sized,
    {
        ActiveIteration::new(self, decl, index)
    }
}

/// Scope guard for an activated iteration. Dereferences to the host.
#[must_use = "the iteration is deactivated as soon as the guard is dropped"]
pub struct ActiveIteration<'h, H: CursorHost + ?Sized> {
    host: &'h mut H,
    saved: SmallVec<[(DeclId, Option<IterationIndex>); 4]>,
}

impl<'h, H: CursorHost + ?Sized> ActiveIteration<'h, H> {
    /// Activate on any host, including `dyn CursorHost`.
    pub fn new(host: &'h mut H, decl: DeclId, index: IterationIndex) -> Self {
        let context = host.cursors().context(decl, index);
        let cursors = host.cursors_mut();
        let saved = context
            .bindings()
            .iter()
            .map(|&(d, i)| (d, cursors.set(d, i)))
            .collect();
        tracing::trace!(%decl, %index, dependents = context.bindings().len() - 1, "activate");
        Self { host, saved }
    }
}

impl<H: CursorHost + ?Sized> Drop for ActiveIteration<'_, H> {
    fn drop(&mut self) {
        let cursors = self.host.cursors_mut();
        for &(decl, previous) in self.saved.iter().rev() {
            cursors.restore(decl, previous);
        }
        tracing::trace!(restored = self.saved.len(), "deactivate");
    }
}

impl<H: CursorHost + ?Sized> Deref for ActiveIteration<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: CursorHost + ?Sized> DerefMut for ActiveIteration<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: CursorHost + ?Sized> CursorHost for ActiveIteration<'_, H> {
    fn cursors(&self) -> &CursorTable {
        self.host.cursors()
    }

    fn cursors_mut(&mut self) -> &mut CursorTable {
        self.host.cursors_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;
    use proptest::prelude::*;

    fn decl(n: usize) -> DeclId {
        DeclId::new(n)
    }

    fn iter(n: usize) -> IterationIndex {
        IterationIndex::new(n)
    }

    #[test]
    fn test_guard_restores_previous() {
        let mut table = CursorTable::default();
        {
            let mut outer = ActiveIteration::new(&mut table, decl(0), iter(1));
            assert_eq!(outer.active_of(decl(0)), Some(iter(1)));
            {
                let inner = outer.activate(decl(0), iter(2));
                assert_eq!(inner.active_of(decl(0)), Some(iter(2)));
            }
            assert_eq!(outer.active_of(decl(0)), Some(iter(1)));
        }
        assert_eq!(table.active_of(decl(0)), None);
    }

    #[test]
    fn test_activation_drives_dependents() {
        let mut table = CursorTable::default();
        let (cache, list, node) = (decl(0), decl(1), decl(2));
        let (s0, s1) = (SubscriberId::new(0), SubscriberId::new(1));
        table.link(cache, s0, list);
        table.link(list, s1, node);
        table.record(s0, iter(0), iter(3));
        table.record(s1, iter(3), iter(5));

        {
            let guard = table.activate(cache, iter(0));
            assert_eq!(guard.active_of(list), Some(iter(3)));
            assert_eq!(guard.active_of(node), Some(iter(5)));
        }
        assert_eq!(table.active_of(list), None);
        assert_eq!(table.active_of(node), None);

        let ctx = table.context(cache, iter(0));
        assert_eq!(ctx.root(), Some((cache, iter(0))));
        assert_eq!(ctx.iteration_of(node), Some(iter(5)));
        // No mapping recorded for iteration 1.
        assert_eq!(table.context(cache, iter(1)).bindings().len(), 1);
    }

    #[test]
    fn test_self_link_terminates() {
        let mut table = CursorTable::default();
        let node = decl(0);
        let s = SubscriberId::new(0);
        table.link(node, s, node);
        table.record(s, iter(0), iter(1));
        table.record(s, iter(1), iter(2));
        let ctx = table.context(node, iter(0));
        assert_eq!(ctx.bindings(), &[(node, iter(0))]);
    }

    impl CursorHost for CursorTable {
        fn cursors(&self) -> &CursorTable {
            self
        }

        fn cursors_mut(&mut self) -> &mut CursorTable {
            self
        }
    }

    fn nest(host: &mut dyn CursorHost, ops: &[(usize, usize)], decls: usize) {
        let Some((&(d, i), rest)) = ops.split_first() else {
            return;
        };
        let before: Vec<_> = (0..decls).map(|n| host.active_of(decl(n))).collect();
        {
            let mut guard = ActiveIteration::new(host, decl(d), iter(i));
            assert_eq!(guard.active_of(decl(d)), Some(iter(i)));
            nest(&mut guard, rest, decls);
            assert_eq!(guard.active_of(decl(d)), Some(iter(i)));
        }
        let after: Vec<_> = (0..decls).map(|n| host.active_of(decl(n))).collect();
        assert_eq!(before, after);
    }

    proptest! {
        #[test]
        fn prop_nested_guards_restore_cursors(ops in prop::collection::vec((0usize..4, 0usize..6), 0..12)) {
            let mut table = CursorTable::default();
            // A fixed dependency: decl0 iteration n drives decl1 iteration n.
            let s = SubscriberId::new(0);
            table.link(decl(0), s, decl(1));
            for n in 0..6 {
                table.record(s, iter(n), iter(n));
            }
            nest(&mut table, &ops, 4);
            for n in 0..4 {
                prop_assert_eq!(table.active_of(decl(n)), None);
            }
        }
    }
}
