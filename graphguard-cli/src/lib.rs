//! graphguard CLI - command-line interface for the policy-driven SPARQL
//! query rewriter.
//!
//! This crate provides the thin adapter that loads a Turtle dataset and a
//! JSON policy file, parses a SPARQL SELECT
//! query, runs it through `graphguard_core::Rewriter`, and prints the
//! narrowed query plus a diagnostic trace of what each pass did.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
