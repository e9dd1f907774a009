//! Type Inferencer: computes candidate `rdf:type` sets for every
//! subject/object variable and constant URI, and candidate predicate-URI
//! sets for every predicate variable.

use indexmap::IndexSet;
use std::collections::HashSet;

use crate::ids::{Iri, NodeId, TypeId, Var};
use crate::model::{Query, TypeBindings};
use crate::oracle::{DatasetProbe, SchemaOracle};

/// Computes [`TypeBindings`] for an input query against a `SchemaOracle` +
/// `DatasetProbe` pair.
pub struct TypeInferencer {
    /// Gates the predicate-variable ground-probe fallback. Kept, default on.
    with_predicate_variable_fallback: bool,
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self {
            with_predicate_variable_fallback: true,
        }
    }
}

impl TypeInferencer {
    /// A type inferencer with the default (fallback enabled) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the predicate-variable ground-probe fallback.
    pub fn with_predicate_variable_fallback(mut self, enabled: bool) -> Self {
        self.with_predicate_variable_fallback = enabled;
        self
    }

    /// Run inference over `query` using the given collaborators.
    pub fn infer(
        &self,
        query: &Query,
        oracle: &dyn SchemaOracle,
        probe: &dyn DatasetProbe,
    ) -> TypeBindings {
        let mut bindings = TypeBindings::default();

        let mut vars: IndexSet<Var> = IndexSet::new();
        let mut iris: IndexSet<Iri> = IndexSet::new();
        let mut pred_vars: IndexSet<Var> = IndexSet::new();

        for t in &query.pattern {
            if let NodeId::Variable(v) = &t.subject {
                vars.insert(v.clone());
            }
            if let NodeId::Iri(i) = &t.subject {
                iris.insert(i.clone());
            }
            if let NodeId::Variable(v) = &t.object {
                vars.insert(v.clone());
            }
            if let NodeId::Iri(i) = &t.object {
                iris.insert(i.clone());
            }
            if let NodeId::Variable(v) = &t.predicate {
                pred_vars.insert(v.clone());
            }
        }

        for v in vars {
            let target = NodeId::Variable(v.clone());
            let types = self.candidate_types_for(&target, query, oracle, probe);
            bindings.var_types.insert(v, types.into_iter().collect());
        }

        for u in iris {
            let target = NodeId::Iri(u.clone());
            let types = self.candidate_types_for(&target, query, oracle, probe);
            bindings.iri_types.insert(u, types.into_iter().collect());
        }

        for p in pred_vars {
            let preds = if self.with_predicate_variable_fallback {
                probe.probe_predicates(&query.pattern, &p)
            } else {
                HashSet::new()
            };
            bindings
                .pred_var_types
                .insert(p, preds.into_iter().collect());
        }

        bindings
    }

    fn candidate_types_for(
        &self,
        target: &NodeId,
        query: &Query,
        oracle: &dyn SchemaOracle,
        probe: &dyn DatasetProbe,
    ) -> HashSet<TypeId> {
        for t in &query.pattern {
            if let Some((subj, ty)) = t.as_explicit_type() {
                if subj == target {
                    return HashSet::from([ty.clone()]);
                }
            }
        }

        let mut candidates = probe.probe_types(&query.pattern, target);

        for t in &query.pattern {
            let NodeId::Iri(p) = &t.predicate else {
                continue;
            };
            if &t.subject == target {
                let domain = oracle.domain(p);
                if !domain.is_empty() {
                    candidates = candidates.intersection(&domain).cloned().collect();
                }
            }
            if &t.object == target {
                let range = oracle.range(p);
                if !range.is_empty() {
                    candidates = candidates.intersection(&range).cloned().collect();
                }
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Triple;

    struct StubOracle {
        domain: HashSet<TypeId>,
        range: HashSet<TypeId>,
    }

    impl SchemaOracle for StubOracle {
        fn domain(&self, _predicate: &Iri) -> HashSet<TypeId> {
            self.domain.clone()
        }
        fn range(&self, _predicate: &Iri) -> HashSet<TypeId> {
            self.range.clone()
        }
        fn sub_classes_of(&self, seeds: &HashSet<TypeId>) -> HashSet<TypeId> {
            seeds.clone()
        }
    }

    struct StubProbe {
        types: HashSet<TypeId>,
        predicates: HashSet<Iri>,
    }

    impl DatasetProbe for StubProbe {
        fn probe_types(&self, _pattern: &[Triple], _target: &NodeId) -> HashSet<TypeId> {
            self.types.clone()
        }
        fn probe_predicates(&self, _pattern: &[Triple], _p: &Var) -> HashSet<Iri> {
            self.predicates.clone()
        }
    }

    #[test]
    fn explicit_type_triple_is_exact() {
        let mut q = Query::empty();
        q.pattern.push(Triple::new(
            NodeId::var("x"),
            NodeId::iri(crate::ids::RDF_TYPE),
            NodeId::iri(":Doctor"),
        ));
        let oracle = StubOracle { domain: HashSet::new(), range: HashSet::new() };
        let probe = StubProbe { types: HashSet::new(), predicates: HashSet::new() };

        let bindings = TypeInferencer::new().infer(&q, &oracle, &probe);
        let types = &bindings.var_types[&Var::new("x")];
        assert_eq!(types.len(), 1);
        assert!(types.contains(&TypeId::new(":Doctor")));
    }

    #[test]
    fn domain_restricts_probed_candidates() {
        let mut q = Query::empty();
        q.pattern.push(Triple::new(
            NodeId::var("x"),
            NodeId::iri(":hasSalary"),
            NodeId::var("v"),
        ));
        let mut probed = HashSet::new();
        probed.insert(TypeId::new(":Person"));
        probed.insert(TypeId::new(":Company"));
        let mut dom = HashSet::new();
        dom.insert(TypeId::new(":Person"));

        let oracle = StubOracle { domain: dom, range: HashSet::new() };
        let probe = StubProbe { types: probed, predicates: HashSet::new() };

        let bindings = TypeInferencer::new().infer(&q, &oracle, &probe);
        let types = &bindings.var_types[&Var::new("x")];
        assert_eq!(types.len(), 1);
        assert!(types.contains(&TypeId::new(":Person")));
    }

    #[test]
    fn predicate_variable_fallback_triggers_on_untyped_predicate_var() {
        let mut q = Query::empty();
        q.pattern.push(Triple::new(
            NodeId::var("x"),
            NodeId::var("p"),
            NodeId::var("o"),
        ));
        let mut preds = HashSet::new();
        preds.insert(Iri::new(":name"));
        let oracle = StubOracle { domain: HashSet::new(), range: HashSet::new() };
        let probe = StubProbe { types: HashSet::new(), predicates: preds };

        let bindings = TypeInferencer::new().infer(&q, &oracle, &probe);
        assert_eq!(bindings.pred_var_types[&Var::new("p")].len(), 1);

        let bindings_disabled = TypeInferencer::new()
            .with_predicate_variable_fallback(false)
            .infer(&q, &oracle, &probe);
        assert!(bindings_disabled.pred_var_types[&Var::new("p")].is_empty());
    }
}
