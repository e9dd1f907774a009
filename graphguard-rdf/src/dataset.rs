//! `InMemoryDataset`: the shipped `SchemaOracle` + `DatasetProbe` adapter.
//!
//! Triples are held flat and indexed three ways at load time: a
//! `rdfs:domain`/`rdfs:range` adjacency map per predicate, a
//! `rdfs:subClassOf` adjacency map per class, and nothing else — the probe
//! methods below scan the flat triple list directly, which is adequate for
//! the basic-graph-pattern-plus-filter subset this crate accepts.

use std::collections::{HashMap, HashSet};

use graphguard_core::ids::RDF_TYPE;
use graphguard_core::{DatasetProbe, Iri, NodeId, SchemaOracle, Triple, TypeId, Var};

use crate::error::RdfResult;
use crate::loader;

const RDFS_DOMAIN: &str = "rdfs:domain";
const RDFS_RANGE: &str = "rdfs:range";
const RDFS_SUBCLASS_OF: &str = "rdfs:subClassOf";

/// An in-memory ground-fact triple store plus the schema/probe indexes built
/// over it at load time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    triples: Vec<Triple>,
    domain: HashMap<Iri, HashSet<TypeId>>,
    range: HashMap<Iri, HashSet<TypeId>>,
    sub_class_of: HashMap<TypeId, HashSet<TypeId>>,
}

impl InMemoryDataset {
    /// Build a dataset from an already-parsed triple set, indexing the
    /// `rdfs:domain`/`rdfs:range`/`rdfs:subClassOf` schema triples.
    pub fn from_triples(triples: Vec<Triple>) -> Self {
        let mut ds = Self {
            triples,
            domain: HashMap::new(),
            range: HashMap::new(),
            sub_class_of: HashMap::new(),
        };
        ds.index_schema();
        ds
    }

    /// Load and parse a Turtle-subset document from its text.
    pub fn load_from_str(text: &str) -> RdfResult<Self> {
        let triples = loader::parse_document(text)?;
        Ok(Self::from_triples(triples))
    }

    /// Load and parse a Turtle-subset document from a file path.
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> RdfResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::load_from_str(&text)
    }

    /// All ground triples held by the dataset.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    fn index_schema(&mut self) {
        for t in &self.triples {
            let (NodeId::Iri(p), NodeId::Iri(obj)) = (&t.predicate, &t.object) else {
                continue;
            };
            let NodeId::Iri(subj) = &t.subject else {
                continue;
            };
            match p.as_str() {
                RDFS_DOMAIN => {
                    self.domain.entry(subj.clone()).or_default().insert(obj.clone());
                }
                RDFS_RANGE => {
                    self.range.entry(subj.clone()).or_default().insert(obj.clone());
                }
                RDFS_SUBCLASS_OF => {
                    self.sub_class_of
                        .entry(subj.clone())
                        .or_default()
                        .insert(obj.clone());
                }
                _ => {}
            }
        }
    }

    /// All ground `rdf:type` assertions matching `target` under `pattern`'s
    /// remaining ground bindings: a naive nested-loop join over the flat
    /// triple list.
    fn matches(&self, pattern: &[Triple], target: &NodeId) -> Vec<HashMap<Var, NodeId>> {
        let mut bindings = vec![HashMap::new()];
        for triple in pattern {
            let mut next = Vec::new();
            for binding in &bindings {
                for candidate in &self.triples {
                    if let Some(merged) = unify(triple, candidate, binding) {
                        next.push(merged);
                    }
                }
            }
            bindings = next;
            if bindings.is_empty() {
                break;
            }
        }
        // Only bindings that actually determine `target`'s value are useful
        // to a caller probing for it; a bare variable target with no
        // constraining triple is handled by the empty-bindings fallback in
        // the trait methods below.
        let _ = target;
        bindings
    }
}

fn unify(
    pattern: &Triple,
    candidate: &Triple,
    binding: &HashMap<Var, NodeId>,
) -> Option<HashMap<Var, NodeId>> {
    let mut out = binding.clone();
    for (p, c) in [
        (&pattern.subject, &candidate.subject),
        (&pattern.predicate, &candidate.predicate),
        (&pattern.object, &candidate.object),
    ] {
        match p {
            NodeId::Variable(v) => match out.get(v) {
                Some(bound) if bound != c => return None,
                Some(_) => {}
                None => {
                    out.insert(v.clone(), c.clone());
                }
            },
            other => {
                if other != c {
                    return None;
                }
            }
        }
    }
    Some(out)
}

impl SchemaOracle for InMemoryDataset {
    fn domain(&self, predicate: &Iri) -> HashSet<TypeId> {
        let direct = self.domain.get(predicate).cloned().unwrap_or_default();
        self.sub_classes_of(&direct)
    }

    fn range(&self, predicate: &Iri) -> HashSet<TypeId> {
        let direct = self.range.get(predicate).cloned().unwrap_or_default();
        self.sub_classes_of(&direct)
    }

    fn sub_classes_of(&self, seeds: &HashSet<TypeId>) -> HashSet<TypeId> {
        let mut closure: HashSet<TypeId> = seeds.clone();
        let mut worklist: Vec<TypeId> = seeds.iter().cloned().collect();
        while let Some(class) = worklist.pop() {
            if let Some(subs) = self.sub_class_of.get(&class) {
                for sub in subs {
                    if closure.insert(sub.clone()) {
                        worklist.push(sub.clone());
                    }
                }
            }
        }
        closure
    }
}

impl DatasetProbe for InMemoryDataset {
    fn probe_types(&self, pattern: &[Triple], target: &NodeId) -> HashSet<TypeId> {
        let mut probe_pattern = pattern.to_vec();
        let type_var = Var::new("__probe_type");
        probe_pattern.push(Triple::new(
            target.clone(),
            NodeId::iri(RDF_TYPE),
            NodeId::Variable(type_var.clone()),
        ));

        self.matches(&probe_pattern, target)
            .into_iter()
            .filter_map(|b| b.get(&type_var).and_then(NodeId::as_iri).cloned())
            .collect()
    }

    fn probe_predicates(&self, pattern: &[Triple], p: &Var) -> HashSet<Iri> {
        self.matches(pattern, &NodeId::Variable(p.clone()))
            .into_iter()
            .filter_map(|b| b.get(p).and_then(NodeId::as_iri).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphguard_core::LiteralValue;

    fn doc() -> &'static str {
        "@prefix : <http://ex.org/> .\n\
         :hasSalary rdfs:domain :Person .\n\
         :Doctor rdfs:subClassOf :Person .\n\
         :alice rdf:type :Doctor .\n\
         :alice :name \"Alice\" .\n\
         :bob rdf:type :Person .\n\
         :bob :name \"Bob\" .\n"
    }

    #[test]
    fn subclass_closure_includes_seed_and_descendants() {
        let ds = InMemoryDataset::load_from_str(doc()).unwrap();
        let seeds = HashSet::from([Iri::new(":Person")]);
        let closure = ds.sub_classes_of(&seeds);
        assert!(closure.contains(&Iri::new(":Person")));
        assert!(closure.contains(&Iri::new(":Doctor")));
    }

    #[test]
    fn domain_reports_declared_class() {
        let ds = InMemoryDataset::load_from_str(doc()).unwrap();
        let d = ds.domain(&Iri::new(":hasSalary"));
        assert!(d.contains(&Iri::new(":Person")));
    }

    #[test]
    fn probe_types_finds_ground_rdf_type() {
        let ds = InMemoryDataset::load_from_str(doc()).unwrap();
        let pattern = vec![Triple::new(
            NodeId::var("x"),
            NodeId::iri(":name"),
            NodeId::Literal(LiteralValue::string("Alice")),
        )];
        let types = ds.probe_types(&pattern, &NodeId::var("x"));
        assert!(types.contains(&Iri::new(":Doctor")));
    }
}
