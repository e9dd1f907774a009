//! # graphguard-rdf
//!
//! The shipped dataset and SPARQL adapters for `graphguard-core`: a
//! line-oriented Turtle-subset loader, an in-memory dataset implementing
//! `SchemaOracle` and `DatasetProbe`, and a minimal SPARQL SELECT
//! reader/writer. These are ambient/interop code, not the rewrite engine
//! itself — swap in a real store and parser for production use.

pub mod dataset;
pub mod error;
pub mod loader;
pub mod sparql;

pub use dataset::InMemoryDataset;
pub use error::{RdfError, RdfResult};
pub use sparql::{parse_select, write_filter, write_select, write_triple, ParsedQuery};
