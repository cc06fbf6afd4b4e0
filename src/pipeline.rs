//! Compilation pipeline for Kiln.
//!
//! ```text
//! Ast (from the parser, or AstBuilder in tests)
//!     │
//!     ▼
//! validate ─► well-formed handles
//!     │
//!     ▼
//! declare_items ─► names declared, signatures linked
//!     │
//!     ▼
//! link_bodies ─► LinkedProgram (iterations, usages, moves, drops)
//! ```
//!
//! ## Diagnostics
//!
//! User errors never abort the pipeline. They are reported to the
//! [`DiagnosticSink`] handed to [`link_unit`] and linking continues with
//! placeholder types. Only a malformed [`Ast`] yields a [`LinkError`].

use kiln_ast::Ast;
use kiln_core::{Diagnostic, DiagnosticSink, TracingSink};
use kiln_link::{
    ComptimeEvaluator, ConstFolder, LinkConfig, LinkError, LinkOptions, LinkedProgram, Linker,
};
use tracing::{debug, info_span};

/// Link one compilation unit.
pub fn link_unit<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast,
    config: LinkConfig,
    evaluator: &mut dyn ComptimeEvaluator,
    sink: &mut dyn DiagnosticSink,
) -> Result<LinkedProgram<'db>, LinkError> {
    let _span = info_span!("link_unit", decls = ast.decls().count()).entered();
    let program = Linker::new(db, ast, config, evaluator, sink).link()?;
    debug!(
        generic_decls = program.registry().entries().len(),
        subscribers = program.registry().subscriber_count(),
        "link_unit finished"
    );
    Ok(program)
}

/// Link `ast` with constant folding for comptime conditions and collect
/// every diagnostic.
pub fn compile<'db>(
    db: &'db dyn salsa::Database,
    ast: &Ast,
    options: &LinkOptions,
) -> (Result<LinkedProgram<'db>, LinkError>, Vec<Diagnostic>) {
    let config = LinkConfig::from_options(db, options);
    let mut sink = TracingSink::new(Vec::new());
    let mut evaluator = ConstFolder;
    let result = link_unit(db, ast, config, &mut evaluator, &mut sink);
    (result, sink.into_inner())
}
