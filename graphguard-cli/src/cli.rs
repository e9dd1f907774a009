//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// graphguard CLI - a policy-driven SPARQL query rewriter
#[derive(Parser, Debug)]
#[command(name = "graphguard")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "graphguard CLI - policy-driven SPARQL query rewriting", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite a SPARQL query under a user's policy
    Rewrite(RewriteArgs),

    /// Parse a policy file and report accepted/skipped entry counts
    CheckPolicy(CheckPolicyArgs),

    /// Rewrite a query and print the inferred type bindings alongside it
    Explain(ExplainArgs),

    /// Display version information
    Version,
}

/// Output format for `rewrite`/`explain`
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// =============================================================================
// Rewrite Command
// =============================================================================

/// Arguments for the `rewrite` command
#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Path to the Turtle-subset dataset file
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Path to the JSON policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Identity of the user the query is rewritten for
    #[arg(short, long)]
    pub user: String,

    /// A SPARQL SELECT query, either inline or a path to a file containing one
    #[arg(short, long)]
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

// =============================================================================
// CheckPolicy Command
// =============================================================================

/// Arguments for the `check-policy` command
#[derive(Args, Debug)]
pub struct CheckPolicyArgs {
    /// Path to the JSON policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,
}

// =============================================================================
// Explain Command
// =============================================================================

/// Arguments for the `explain` command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Path to the Turtle-subset dataset file
    #[arg(short, long)]
    pub dataset: Option<PathBuf>,

    /// Path to the JSON policy file
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Identity of the user the query is rewritten for
    #[arg(short, long)]
    pub user: String,

    /// A SPARQL SELECT query, either inline or a path to a file containing one
    #[arg(short, long)]
    pub query: String,
}
