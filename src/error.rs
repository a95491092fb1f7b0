use std::io;
use thiserror::Error;

/// All public operations fail with this error and no result, rather than
/// panicking (§7). Internal reconciliation bugs are a different matter —
/// see the `debug_assert!` in `split` — and are not represented here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad handle, missing coordinate, wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// ID lookup failed.
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller violated a precondition of `draw_connector` (e.g. a mid-segment
    /// touch without pre-splitting).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("I/O failure")]
    Io(#[from] io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
