//! CLI command implementations.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CliError, CliResult};

pub mod check_policy;
pub mod explain;
pub mod rewrite;
pub mod version;

/// Resolve a path supplied as a CLI flag against the fallback from
/// `graphguard.toml`, the flag taking precedence.
fn resolve_path(flag: Option<PathBuf>, from_config: Option<PathBuf>, what: &str) -> CliResult<PathBuf> {
    flag.or(from_config)
        .ok_or_else(|| CliError::Config(format!("no {what} path given: pass --{what} or set it in graphguard.toml")))
}

pub(crate) fn resolve_dataset_path(flag: Option<PathBuf>, config: &Config) -> CliResult<PathBuf> {
    resolve_path(flag, config.dataset.clone(), "dataset")
}

pub(crate) fn resolve_policy_path(flag: Option<PathBuf>, config: &Config) -> CliResult<PathBuf> {
    resolve_path(flag, config.policy.clone(), "policy")
}

/// A `--query` argument is either a path to a file holding the SPARQL text,
/// or the query text itself given inline.
pub(crate) fn resolve_query_text(query_arg: &str) -> CliResult<String> {
    let path = Path::new(query_arg);
    if path.is_file() {
        Ok(std::fs::read_to_string(path)?)
    } else {
        Ok(query_arg.to_string())
    }
}
