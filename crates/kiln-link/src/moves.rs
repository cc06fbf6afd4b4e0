//! Move tracking within one function body.
//!
//! A place is a local binding optionally followed by field names
//! (`x`, `x.inner.value`). Moving a place makes it and everything below it
//! unusable; reading a place conflicts with any moved place that is its
//! prefix or extension. Assigning a place makes it usable again.
//!
//! Branching constructs link each arm from the same starting state. What
//! an arm moved is set aside in an [`ArmMoves`] record and the tracker is
//! put back to the pre-branch snapshot, so a move in one arm never leaks
//! into a sibling arm or, under [`BranchMovePolicy::RestorePreBranch`],
//! into the code after the construct.

use std::fmt;

use kiln_ast::DeclId;
use kiln_core::{Span, Symbol};
use smallvec::SmallVec;

use crate::config::BranchMovePolicy;

/// A binding and a path of field accesses below it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MoveChain {
    pub root: DeclId,
    pub path: SmallVec<[Symbol; 2]>,
}

impl MoveChain {
    pub fn root(decl: DeclId) -> Self {
        Self {
            root: decl,
            path: SmallVec::new(),
        }
    }

    pub fn field(mut self, name: Symbol) -> Self {
        self.path.push(name);
        self
    }

    pub fn is_whole(&self) -> bool {
        self.path.is_empty()
    }

    /// Whether `prefix` names this place or one of its ancestors.
    pub fn starts_with(&self, prefix: &MoveChain) -> bool {
        self.root == prefix.root && self.path.starts_with(&prefix.path)
    }

    /// Whether the two places share storage.
    pub fn overlaps(&self, other: &MoveChain) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for MoveChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for field in &self.path {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct MovedPlace {
    chain: MoveChain,
    span: Span,
}

/// Saved tracker state.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveSnapshot {
    moved: Vec<MovedPlace>,
}

/// Moves performed by one arm of a branching construct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArmMoves {
    places: Vec<MovedPlace>,
}

impl ArmMoves {
    /// Bindings moved as a whole.
    pub fn moved_ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.places
            .iter()
            .filter(|p| p.chain.is_whole())
            .map(|p| p.chain.root)
    }

    /// Partial moves of a field path.
    pub fn moved_chains(&self) -> impl Iterator<Item = &MoveChain> + '_ {
        self.places
            .iter()
            .filter(|p| !p.chain.is_whole())
            .map(|p| &p.chain)
    }

    fn covers(&self, chain: &MoveChain) -> bool {
        self.places.iter().any(|p| chain.starts_with(&p.chain))
    }
}

/// An open branching construct. Close it with [`MoveTracker::end_branch`].
#[must_use = "a branch must be closed to restore the pre-branch state"]
#[derive(Debug)]
pub struct BranchState {
    pre: MoveSnapshot,
    arms: Vec<ArmMoves>,
}

impl BranchState {
    pub fn arms(&self) -> &[ArmMoves] {
        &self.arms
    }
}

#[derive(Clone, Debug, Default)]
pub struct MoveTracker {
    policy: BranchMovePolicy,
    moved: Vec<MovedPlace>,
}

impl MoveTracker {
    pub fn new(policy: BranchMovePolicy) -> Self {
        Self {
            policy,
            moved: Vec::new(),
        }
    }

    pub fn mark_moved(&mut self, chain: MoveChain, span: Span) {
        tracing::trace!(place = %chain, "moved");
        // Anything below the newly moved place is subsumed by it.
        self.moved.retain(|p| !p.chain.starts_with(&chain));
        self.moved.push(MovedPlace { chain, span });
    }

    /// The span of the move that makes reading `chain` invalid, if any.
    pub fn check_use(&self, chain: &MoveChain) -> Option<Span> {
        self.moved
            .iter()
            .find(|p| p.chain.overlaps(chain))
            .map(|p| p.span)
    }

    /// A new value was assigned to `chain`.
    pub fn mark_unmoved(&mut self, chain: &MoveChain) {
        let before = self.moved.len();
        self.moved.retain(|p| !p.chain.starts_with(chain));
        if self.moved.len() != before {
            tracing::trace!(place = %chain, "reinitialized");
        }
    }

    /// Whether any part of `decl` has been moved out.
    pub fn is_moved_any(&self, decl: DeclId) -> bool {
        self.moved.iter().any(|p| p.chain.root == decl)
    }

    pub fn snapshot(&self) -> MoveSnapshot {
        MoveSnapshot {
            moved: self.moved.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: MoveSnapshot) {
        self.moved = snapshot.moved;
    }

    pub fn begin_branch(&self) -> BranchState {
        BranchState {
            pre: self.snapshot(),
            arms: Vec::new(),
        }
    }

    /// Set aside what the arm just linked moved, then return to the
    /// pre-branch state for the next arm.
    pub fn end_arm(&mut self, branch: &mut BranchState) {
        let places = self
            .moved
            .drain(..)
            .filter(|p| !branch.pre.moved.contains(p))
            .collect();
        branch.arms.push(ArmMoves { places });
        self.moved = branch.pre.moved.clone();
    }

    /// Close the construct. `exhaustive` tells whether one of the arms
    /// always runs.
    pub fn end_branch(&mut self, branch: BranchState, exhaustive: bool) {
        self.restore(branch.pre);
        if self.policy != BranchMovePolicy::Intersection || !exhaustive {
            return;
        }
        for place in branch.arms.iter().flat_map(|arm| &arm.places) {
            if branch.arms.iter().all(|arm| arm.covers(&place.chain))
                && self.check_use(&place.chain).is_none()
            {
                self.mark_moved(place.chain.clone(), place.span);
            }
        }
    }
}
