//! Error types for document edits, transforms and configuration.
//!
//! Only [`EditError`] ever reaches a host as a `Result`. Transform failures are
//! absorbed by the engine (the original text is spliced back) and exist here
//! so transformer implementations have something typed to return.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::Position;

/// An edit the host asked for could not be applied.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
    /// Range reaches past the end of the document.
    #[error("edit range {start}..{end} is outside the document (size {size})")]
    #[diagnostic(
        code(wavefront::edit::out_of_bounds),
        help("positions are only valid for the document version they came from; remap them first")
    )]
    OutOfBounds {
        start: Position,
        end: Position,
        size: usize,
    },

    /// Range end comes before its start.
    #[error("edit range {start}..{end} is inverted")]
    #[diagnostic(code(wavefront::edit::inverted_range))]
    InvertedRange { start: Position, end: Position },
}

/// The external transformer did not produce a result.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum TransformError {
    /// Service-level failure reported by the transformer.
    #[error("transform failed: {0}")]
    #[diagnostic(code(wavefront::transform::failed))]
    Failed(String),

    /// Transport or process I/O failed.
    #[error(transparent)]
    #[diagnostic(code(wavefront::transform::io))]
    Io(#[from] std::io::Error),

    /// External command exited unsuccessfully.
    #[error("transform command exited with {status}: {stderr}")]
    #[diagnostic(code(wavefront::transform::command))]
    Command { status: String, stderr: String },
}

impl From<String> for TransformError {
    fn from(s: String) -> Self {
        TransformError::Failed(s)
    }
}

impl From<&str> for TransformError {
    fn from(s: &str) -> Self {
        TransformError::Failed(s.to_string())
    }
}

/// Engine configuration values that cannot work.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("tolerance must be a positive finite number, got {0}")]
    #[diagnostic(code(wavefront::config::tolerance))]
    Tolerance(f32),

    #[error("minimum line height must be a positive finite number, got {0}")]
    #[diagnostic(code(wavefront::config::line_height))]
    LineHeight(f32),

    #[error("line-break marker must not be empty")]
    #[diagnostic(
        code(wavefront::config::line_break),
        help("use \"\\n\" to send block boundaries as plain newlines")
    )]
    LineBreak,

    #[error("unknown trim policy `{0}`")]
    #[diagnostic(
        code(wavefront::config::trim),
        help("expected one of: preserve, trim, trim-end")
    )]
    TrimPolicy(String),
}
