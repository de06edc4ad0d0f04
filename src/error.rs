//! The four error kinds a core operation can fail with (spec.md §7).

use std::fmt;

/// Distinguishes why a core operation failed. Each variant maps to its own
/// non-zero process exit code in the `memscan` binary.
#[derive(Debug)]
pub enum CoreError {
    /// Lexing or parsing an expression failed.
    Parse(String),
    /// The expression parsed but failed during evaluation (type error,
    /// division by zero, a dereference that could not be resolved).
    Eval(String),
    /// The target process could not be attached to, read from, written to,
    /// suspended or resumed.
    Target(String),
    /// A resource limit was hit: out of memory, too many regions, a scan
    /// that was cancelled.
    Resource(String),
}

impl CoreError {
    /// The process exit code the CLI binary should use for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Parse(_) => 1,
            CoreError::Eval(_) => 2,
            CoreError::Target(_) => 3,
            CoreError::Resource(_) => 4,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Parse(msg) => write!(f, "parse error: {msg}"),
            CoreError::Eval(msg) => write!(f, "evaluation error: {msg}"),
            CoreError::Target(msg) => write!(f, "target error: {msg}"),
            CoreError::Resource(msg) => write!(f, "resource error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
