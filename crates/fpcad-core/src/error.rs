//! Error types for the footprint core.

use thiserror::Error;

/// Errors surfaced by the constraint core.
///
/// `OverConstrained` and `DeletionBlocked` are the two expected runtime
/// failures; both leave the board exactly as it was before the attempted
/// mutation. Structural invariant violations (freeing a point that is still
/// referenced, dependency cycles) are programmer errors and assert instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The explicit constraint set admits no consistent solution.
    #[error("over-constrained: the new constraint conflicts with the existing ones")]
    OverConstrained,

    /// The deletion closure contains a primitive that refuses deletion.
    #[error("cannot delete: a required primitive is not deletable")]
    DeletionBlocked,

    /// A unit string could not be parsed.
    #[error("invalid unit number: {0}")]
    InvalidUnit(String),

    /// Construction parameters were rejected before any mutation.
    #[error("invalid parameters: {0}")]
    InvalidParameter(String),

    /// A primitive id or point handle that is not live.
    #[error("unknown primitive: {0}")]
    UnknownPrimitive(u32),

    /// Document (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// No document with the given id.
    #[error("document not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
