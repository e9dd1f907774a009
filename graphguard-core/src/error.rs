//! Error types returned by the public `Rewriter` API.
//!
//! Policy malformation, contradiction during filter merge, and schema probe
//! failure are all recovered locally and never surface here; only
//! configuration problems and a structurally invalid input query do.

use thiserror::Error;

/// Result type used throughout `graphguard-core`.
pub type GraphGuardResult<T> = Result<T, GraphGuardError>;

/// Errors the public API can return. Everything else in the taxonomy
/// (policy malformation, schema-probe failure, filter contradiction) is
/// absorbed internally and only visible through `tracing` events and
/// [`crate::rewrite::PassReport`].
#[derive(Debug, Error)]
pub enum GraphGuardError {
    /// The dataset or policy source could not be constructed (missing file,
    /// unreadable, or otherwise unusable).
    #[error("configuration error: {0}")]
    Config(String),

    /// A policy entry's shape was invalid at a point the caller must know
    /// about (as opposed to a single skippable malformed entry).
    #[error("policy error: {0}")]
    Policy(String),

    /// A schema probe failed in a way that was logged but not otherwise
    /// actionable; constructed only internally and treated as an empty
    /// result, never returned by itself from public entry points.
    #[error("schema probe error: {0}")]
    SchemaProbe(String),

    /// The input query is not well-formed (e.g. a filter references a
    /// variable absent from the pattern).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
