//! Error type shared by every fallible stage of the postprocessing pipeline.
//!
//! All variants are fatal for the call that produced them; nothing is retried
//! internally and no partial result is returned.

/// Failure raised by configuration validation or by a shape/contract check.
#[derive(Debug, thiserror::Error)]
pub enum PostprocessError {
    #[error("grid = {grid:?} must be a list of length {expected} with values that are powers of 2")]
    InvalidGrid { grid: Vec<usize>, expected: usize },
    #[error("axis {axis} of length {len} is not divisible by {div}")]
    NotDivisible { axis: char, len: usize, div: usize },
    #[error("scale must be a mapping with entries for 'X' and 'Y' (got keys {keys:?})")]
    InvalidScale { keys: Vec<String> },
    #[error("{name} must be an array of non-negative integers")]
    InvalidLabels { name: &'static str },
    #[error("overlap_label not supported for 2D yet")]
    OverlapLabelUnsupported,
    #[error("length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PostprocessError>;

/// Checks that a parallel array has the same number of entries as the reference.
pub(crate) fn ensure_len(what: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(PostprocessError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}
