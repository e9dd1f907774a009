//! CLI error types and result alias.

use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types: a thin wrapper unifying the two library error types plus
/// whatever is specific to the adapter itself (config file and file I/O).
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (`graphguard.toml`, CLI flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the rewrite engine
    #[error(transparent)]
    Core(#[from] graphguard_core::GraphGuardError),

    /// Error from the dataset loader or SPARQL reader/writer
    #[error(transparent)]
    Rdf(#[from] graphguard_rdf::RdfError),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("failed to parse TOML: {err}"))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Config(format!("failed to serialize TOML: {err}"))
    }
}
