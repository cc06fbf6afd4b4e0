//! Name resolution and generic instantiation for Kiln.
//!
//! The [`Linker`] takes a validated [`Ast`](kiln_ast::Ast) and produces a
//! [`LinkedProgram`]: every name resolved to its declaration, every
//! annotation linked to a [`Type`](kiln_ast::Type), one iteration per
//! distinct instantiation of each generic declaration, and the moves and
//! destructor calls of every body. User errors are reported through a
//! [`DiagnosticSink`](kiln_core::DiagnosticSink) and never stop linking.
//!
//! Later phases walk a generic declaration once per iteration, activating
//! it with [`CursorHost::activate`] so that queries close open types over
//! it.

pub mod comptime;
pub mod config;
pub mod cursor;
pub mod error;
pub mod infer;
pub mod linker;
pub mod moves;
pub mod propagate;
pub mod query;
pub mod registry;
pub mod relate;
pub mod scope;
pub mod signature;
pub mod subst;

pub use comptime::{ComptimeEnv, ComptimeEvaluator, ConstFolder, ConstValue, NoComptime};
pub use config::{BranchMovePolicy, LinkConfig, LinkOptions};
pub use cursor::{ActiveIteration, CursorHost, IterationContext};
pub use error::{LinkError, LinkErrorKind, LinkResult};
pub use linker::Linker;
pub use moves::{MoveChain, MoveTracker};
pub use query::{Instance, LinkedProgram, ScheduledDrop, Usage, UsageSite, display_type};
pub use registry::{InstantiationRegistry, Iteration, IterationIndex, SubscriberId};
pub use relate::{TypeEnv, is_same, satisfies};
pub use signature::{FunctionSig, OwnershipInfo, Signatures};
