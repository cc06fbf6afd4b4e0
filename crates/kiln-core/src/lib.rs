//! Kiln compiler utilities shared by every front-end crate.
pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{
    CompilationPhase, Diagnostic, DiagnosticKind, DiagnosticSeverity, DiagnosticSink, TracingSink,
};
pub use span::Span;
pub use symbol::Symbol;
