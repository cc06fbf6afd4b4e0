//! Link configuration.
//!
//! [`LinkOptions`] is the serializable form a driver reads from a config
//! file or command line; [`LinkConfig`] is its salsa input mirror, which is
//! what the linker receives.

use serde::{Deserialize, Serialize};

/// How moves performed inside branch arms affect code after the branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchMovePolicy {
    /// After a branching construct every binding is restored to its
    /// pre-branch state. Under-reports moves, never over-reports them.
    #[default]
    RestorePreBranch,
    /// For exhaustive constructs (an `if` with `else`, a `switch` with
    /// `default`), a chain moved on every arm stays moved afterward.
    Intersection,
}

/// User-facing link options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    /// Maximum propagation depth of an iteration created through the
    /// subscriber graph.
    pub max_instantiation_depth: u32,
    /// Maximum number of iterations of a single declaration.
    pub max_iterations_per_decl: u32,
    pub branch_moves: BranchMovePolicy,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            max_instantiation_depth: 64,
            max_iterations_per_decl: 4096,
            branch_moves: BranchMovePolicy::RestorePreBranch,
        }
    }
}

/// Link configuration as a salsa input.
#[salsa::input(debug)]
pub struct LinkConfig {
    pub max_instantiation_depth: u32,
    pub max_iterations_per_decl: u32,
    pub branch_moves: BranchMovePolicy,
}

impl LinkConfig {
    pub fn from_options(db: &dyn salsa::Database, options: &LinkOptions) -> Self {
        Self::new(
            db,
            options.max_instantiation_depth,
            options.max_iterations_per_decl,
            options.branch_moves,
        )
    }

    pub fn defaults(db: &dyn salsa::Database) -> Self {
        Self::from_options(db, &LinkOptions::default())
    }

    pub(crate) fn limits(&self, db: &dyn salsa::Database) -> Limits {
        Limits {
            max_depth: self.max_instantiation_depth(db),
            max_per_decl: self.max_iterations_per_decl(db),
        }
    }
}

/// Expansion ceilings, read once from [`LinkConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: u32,
    pub max_per_decl: u32,
}

impl Default for Limits {
    fn default() -> Self {
        let options = LinkOptions::default();
        Self {
            max_depth: options.max_instantiation_depth,
            max_per_decl: options.max_iterations_per_decl,
        }
    }
}
