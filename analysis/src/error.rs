//! Error types for trace replay.

use thiserror::Error;

/// Invariant violations detected while reconstructing a trace.
///
/// Every variant is fatal for the whole run: once one is raised, the rest of
/// the reconstruction cannot be trusted.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A required field could not be extracted from a line.
    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    /// Construct/destruct ordering broken for an engine or a value.
    #[error("lifecycle violation: {0}")]
    LifecycleViolation(String),

    /// Call stack or pending-result stack overflow, underflow, or an
    /// enter/leave mismatch.
    #[error("stack discipline violated: {0}")]
    StackDiscipline(String),

    /// Operand address missing, dead, or read before being assigned.
    #[error("unresolved operand: {0}")]
    UnresolvedOperand(String),

    /// Operation name or code outside of the operation table.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// The trace stream itself failed.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),
}

/// An [`AnalysisError`] tied to the trace line that raised it.
#[derive(Debug, Error)]
#[error("line {line_number}: {error}\n    {line}")]
pub struct ReplayError {
    pub line_number: usize,
    pub line: String,
    #[source]
    pub error: AnalysisError,
}

/// Result type for trace analysis.
pub type Result<T> = std::result::Result<T, AnalysisError>;
