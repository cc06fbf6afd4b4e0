//! Kiln compiler front end: database and link pipeline.
//!
//! The heavy lifting lives in the member crates. `kiln-core` carries
//! symbols, spans and diagnostics, `kiln-ast` the arena AST and interned
//! types, and `kiln-link` the linker and instantiation engine.

pub mod database;
pub mod pipeline;

pub use database::KilnDatabase;
pub use pipeline::{compile, link_unit};

pub use kiln_ast::{Ast, AstBuilder};
pub use kiln_core::{Diagnostic, DiagnosticKind};
pub use kiln_link::{LinkOptions, LinkedProgram};
