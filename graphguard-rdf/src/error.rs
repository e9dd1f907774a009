//! Error type for the Turtle-subset loader and the minimal SPARQL reader.

use thiserror::Error;

/// Result type used throughout `graphguard-rdf`.
pub type RdfResult<T> = Result<T, RdfError>;

/// Errors the dataset and SPARQL adapters can return.
#[derive(Debug, Error)]
pub enum RdfError {
    /// The backing file could not be read.
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    /// A line of Turtle-subset or SPARQL text did not parse.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl RdfError {
    /// Build a parse error at the given 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
