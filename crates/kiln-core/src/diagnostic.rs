//! Diagnostic messages emitted during linking.
//!
//! The core never decides how diagnostics are presented. Every phase reports
//! through a [`DiagnosticSink`] supplied by the driver; the sink may collect
//! them, log them, or forward them to an editor.

use crate::Span;

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    pub severity: DiagnosticSeverity,
    pub phase: CompilationPhase,
}

impl Diagnostic {
    /// Create an error-severity diagnostic.
    pub fn error(
        kind: DiagnosticKind,
        phase: CompilationPhase,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            severity: DiagnosticSeverity::Error,
            phase,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// What went wrong, independent of the message wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A name used at some site has no visible declaration.
    UnresolvedSymbol,
    /// A generic parameter could not be inferred from the call site.
    InferenceFailure,
    /// A value does not satisfy the type expected at a binding, call or return.
    TypeMismatch,
    /// A binding is read after its value was moved out.
    UseAfterMove,
    /// Two constructs claim the same role (duplicate default, duplicate function).
    StructuralAmbiguity,
    /// Generic expansion exceeded the configured depth or count ceiling.
    InstantiationLimit,
    /// An owned value without a destructor leaves scope without being moved.
    MissingDestructor,
}

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Compilation phase where a diagnostic was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompilationPhase {
    Declaration,
    NameResolution,
    Instantiation,
    Inference,
    TypeChecking,
    MoveChecking,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "ERROR"),
            DiagnosticSeverity::Warning => write!(f, "WARNING"),
            DiagnosticSeverity::Info => write!(f, "INFO"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:?}] {}: {}",
            self.severity, self.phase, self.span, self.message
        )
    }
}

/// Destination for diagnostics produced by the core.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink adapter that logs every diagnostic through `tracing` before
/// forwarding it.
pub struct TracingSink<S> {
    inner: S,
}

impl<S: DiagnosticSink> TracingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for TracingSink<S> {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Error | DiagnosticSeverity::Warning => tracing::warn!(
                kind = ?diagnostic.kind,
                phase = ?diagnostic.phase,
                span = %diagnostic.span,
                "{}",
                diagnostic.message
            ),
            DiagnosticSeverity::Info => tracing::info!(
                kind = ?diagnostic.kind,
                span = %diagnostic.span,
                "{}",
                diagnostic.message
            ),
        }
        self.inner.report(diagnostic);
    }
}
