//! Collaborator trait boundaries the core calls through rather than owning
//! directly: `SchemaOracle` and `DatasetProbe`.
//!
//! Concrete implementations live in `graphguard-rdf`; the core only ever
//! sees `&dyn SchemaOracle` / `&dyn DatasetProbe`.

use std::collections::HashSet;

use crate::ids::{Iri, TypeId, Var};
use crate::model::Triple;

/// Read-only schema probes used by the Type Inferencer.
///
/// An empty result from any of these means "no constraint from the schema",
/// never "nothing is allowed" — callers must not conflate the two.
pub trait SchemaOracle {
    /// All classes `C` such that `p rdfs:domain C`, closed over subclasses.
    fn domain(&self, predicate: &Iri) -> HashSet<TypeId>;

    /// All classes `C` such that `p rdfs:range C`, closed over subclasses.
    fn range(&self, predicate: &Iri) -> HashSet<TypeId>;

    /// The fixed-point closure of `rdfs:subClassOf` starting from `seeds`
    /// (inclusive of the seeds themselves).
    fn sub_classes_of(&self, seeds: &HashSet<TypeId>) -> HashSet<TypeId>;
}

/// A single (subject, predicate, object) binding resulting from a ground
/// probe, expressed as an assignment to the probed variable.
pub type ProbeBinding = crate::ids::NodeId;

/// Read-only ground-type/ground-predicate probes against the dataset, used
/// by the Type Inferencer when the schema alone underdetermines a
/// variable's candidate set.
pub trait DatasetProbe {
    /// `SELECT DISTINCT ?t WHERE { <pattern> . v rdf:type ?t }`: the set of
    /// concrete `rdf:type` values `v` (or the constant `u`, passed the same
    /// way by wrapping it as a ground node in `pattern`) can take given the
    /// rest of the basic graph pattern.
    fn probe_types(&self, pattern: &[Triple], target: &crate::ids::NodeId) -> HashSet<TypeId>;

    /// The set of concrete predicate IRIs the predicate variable `p` can
    /// take against the dataset, restricted by `pattern`.
    fn probe_predicates(&self, pattern: &[Triple], p: &Var) -> HashSet<Iri>;
}
