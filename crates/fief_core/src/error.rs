//! Error types for the match simulation.
//!
//! Invalid commands are not errors: per the command contract they are
//! silent no-ops. `GameError` covers the surfaces that can genuinely
//! fail - snapshot encoding and hard entity lookups used by tooling.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation crate.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// Snapshot encode/decode failure.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}
