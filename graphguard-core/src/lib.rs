//! # graphguard-core
//!
//! Policy-driven rewriter for SPARQL basic-graph-pattern queries.
//!
//! Given a user identity, a query, and a read-only schema/dataset
//! collaborator, [`Rewriter::rewrite`] produces a semantically equivalent or
//! strictly more restrictive query that excludes information the policy
//! forbids the user from seeing: triples are dropped, filters are added, and
//! dangling projected variables are pruned, but nothing is ever widened.
//!
//! ## Example
//!
//! ```rust,ignore
//! use graphguard_core::{PolicyStore, Rewriter};
//!
//! let (policy, _accepted, _skipped) = graphguard_core::policy::json::load_from_str(policy_json)?;
//! let rewriter = Rewriter::new(&policy, &dataset, &dataset, "guest")?;
//! let (narrowed, report) = rewriter.rewrite(query)?;
//! ```

pub mod error;
pub mod expr;
pub mod filter_algebra;
pub mod ids;
pub mod logging;
pub mod model;
pub mod oracle;
pub mod policy;
pub mod rewrite;
pub mod type_infer;

pub use error::{GraphGuardError, GraphGuardResult};
pub use ids::{BlankNode, Iri, LiteralValue, NodeId, PrimitiveType, TypeId, User, Var};
pub use model::{Filter, OrderBy, Projected, Query, QueryModel, SortOrder, Triple, TypeBindings};
pub use oracle::{DatasetProbe, SchemaOracle};
pub use policy::{AttrOp, AttributeConstraint, NodeConstraint, PolicyStore, PredicateConstraint};
pub use rewrite::{PassReport, RewriteReport, Rewriter};
pub use type_infer::TypeInferencer;

/// Convenient re-exports for downstream crates (the CLI and the RDF adapter).
pub mod prelude {
    pub use crate::error::{GraphGuardError, GraphGuardResult};
    pub use crate::ids::{Iri, LiteralValue, NodeId, PrimitiveType, TypeId, User, Var};
    pub use crate::model::{Filter, Projected, Query, QueryModel, Triple, TypeBindings};
    pub use crate::oracle::{DatasetProbe, SchemaOracle};
    pub use crate::policy::PolicyStore;
    pub use crate::rewrite::{PassReport, RewriteReport, Rewriter};
    pub use crate::type_infer::TypeInferencer;
}
