//! The mutable Query Model: triples, filters, projection, and the structural
//! mutators that keep the model well-formed.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::filter_algebra::{self, CombineOutcome};
use crate::ids::{Iri, NodeId, TypeId, Var};

/// A single triple pattern. Subjects and predicates are restricted to
/// IRI/Variable by construction in [`Triple::new`]; objects may additionally
/// be a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// The subject node (IRI or Variable).
    pub subject: NodeId,
    /// The predicate node (IRI or Variable).
    pub predicate: NodeId,
    /// The object node (IRI, Variable, or Literal).
    pub object: NodeId,
}

impl Triple {
    /// Construct a triple pattern, panicking on a subject/predicate in an
    /// illegal position (a caller-programming-error, never data-dependent).
    pub fn new(subject: NodeId, predicate: NodeId, object: NodeId) -> Self {
        assert!(
            matches!(subject, NodeId::Iri(_) | NodeId::Variable(_) | NodeId::Blank(_)),
            "triple subject must be an IRI, variable, or blank node"
        );
        assert!(
            matches!(predicate, NodeId::Iri(_) | NodeId::Variable(_)),
            "triple predicate must be an IRI or variable"
        );
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// `true` if this triple is an explicit `rdf:type` assertion with a
    /// ground IRI object (used by the Type Inferencer's fast path).
    pub fn as_explicit_type(&self) -> Option<(&NodeId, &Iri)> {
        if let NodeId::Iri(p) = &self.predicate {
            if p.as_str() == crate::ids::RDF_TYPE {
                if let NodeId::Iri(t) = &self.object {
                    return Some((&self.subject, t));
                }
            }
        }
        None
    }

    /// All variables appearing in any position of this triple.
    pub fn free_vars(&self) -> Vec<Var> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(|n| n.as_var().cloned())
            .collect()
    }

    /// `true` if `node` occurs in any position of this triple.
    pub fn mentions(&self, node: &NodeId) -> bool {
        &self.subject == node || &self.predicate == node || &self.object == node
    }

    /// `true` if the given variable occurs in any position of this triple.
    pub fn mentions_var(&self, v: &Var) -> bool {
        self.mentions(&NodeId::Variable(v.clone()))
    }
}

/// A filter attached to the graph pattern: a single boolean expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter(pub Expression);

impl Filter {
    /// Wrap an expression as a filter.
    pub fn new(expr: Expression) -> Self {
        Self(expr)
    }

    /// The filter's free variables.
    pub fn free_vars(&self) -> Vec<Var> {
        self.0.free_vars()
    }

    /// Structural equality per I4: `NotExists` filters compare their inner
    /// pattern; everything else compares the whole expression tree.
    pub fn structurally_equal(&self, other: &Filter) -> bool {
        self.0.structurally_equal(&other.0)
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// One `ORDER BY` clause entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// The variable being sorted on.
    pub var: Var,
    /// Sort direction.
    pub order: SortOrder,
}

/// One projected column: a variable, optionally bound to a computed
/// expression (`SELECT (?a + ?b AS ?c)`-style projections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    /// The projected variable name.
    pub var: Var,
    /// The expression computing it, if this is a bound (not plain) projection.
    pub expr: Option<Expression>,
}

impl Projected {
    /// A plain projected variable with no computed expression.
    pub fn plain(var: Var) -> Self {
        Self { var, expr: None }
    }

    /// The set of variables this projected column depends on: itself if
    /// plain, or its defining expression's free variables if bound.
    pub fn depends_on(&self) -> Vec<Var> {
        match &self.expr {
            Some(e) => e.free_vars(),
            None => vec![self.var.clone()],
        }
    }
}

/// A SPARQL SELECT query: projection, basic graph pattern, filters, and the
/// optional solution-modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Query {
    /// Projected columns, in declaration order.
    pub projection: Vec<Projected>,
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// The basic graph pattern: an ordered set of triples (I4: no duplicates).
    pub pattern: Vec<Triple>,
    /// Attached filters, in insertion order (the Filter Algebra's fold order
    /// depends on this).
    pub filters: Vec<Filter>,
    /// `GROUP BY` variables, if any.
    pub group_by: Option<Vec<Var>>,
    /// `HAVING` expression, if any.
    pub having: Option<Expression>,
    /// `ORDER BY` clauses, in declaration order.
    pub order_by: Vec<OrderBy>,
    /// `LIMIT`.
    pub limit: Option<u64>,
    /// `OFFSET`.
    pub offset: Option<u64>,
}

impl Query {
    /// An empty query (matches the degenerate "everything dropped" case).
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` if the pattern already contains this triple (I4).
    pub fn contains_triple(&self, t: &Triple) -> bool {
        self.pattern.contains(t)
    }

    /// `true` if any remaining triple mentions the given node.
    pub fn any_triple_mentions(&self, node: &NodeId) -> bool {
        self.pattern.iter().any(|t| t.mentions(node))
    }

    /// `true` if any remaining triple mentions the given variable.
    pub fn any_triple_mentions_var(&self, v: &Var) -> bool {
        self.pattern.iter().any(|t| t.mentions_var(v))
    }

    /// All triples whose object is exactly the given node.
    pub fn triples_with_object(&self, node: &NodeId) -> Vec<Triple> {
        self.pattern
            .iter()
            .filter(|t| &t.object == node)
            .cloned()
            .collect()
    }
}

/// Three type-candidate maps computed once by the Type Inferencer and then
/// only ever shrunk as the rewrite narrows the pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeBindings {
    /// Candidate `rdf:type` set for each subject/object variable.
    pub var_types: IndexMap<Var, IndexSet<TypeId>>,
    /// Candidate `rdf:type` set for each constant subject/object IRI.
    pub iri_types: IndexMap<Iri, IndexSet<TypeId>>,
    /// Candidate predicate-IRI set for each predicate variable.
    pub pred_var_types: IndexMap<Var, IndexSet<Iri>>,
}

impl TypeBindings {
    /// Drop any entry whose key no longer occurs anywhere in `query` (I3).
    pub fn retain_occurring(&mut self, query: &Query) {
        self.var_types
            .retain(|v, _| query.any_triple_mentions_var(v));
        self.iri_types
            .retain(|iri, _| query.any_triple_mentions(&NodeId::Iri(iri.clone())));
        self.pred_var_types
            .retain(|v, _| query.any_triple_mentions_var(v));
    }
}

/// The owner of the single mutable Query under rewrite: pairs the working
/// `Query` with its `TypeBindings` and exposes the structural mutators each
/// rewrite pass drives. No other mutable global state exists.
#[derive(Debug, Clone)]
pub struct QueryModel {
    query: Query,
    bindings: TypeBindings,
}

/// What happened as a side effect of a mutator call, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct MutationLog {
    /// Triples removed as a direct or cascading effect of the call.
    pub triples_removed: Vec<Triple>,
    /// Filters removed as a cascading effect of the call.
    pub filters_removed: Vec<Filter>,
}

impl QueryModel {
    /// Build a model from a frozen input query and its computed type bindings.
    pub fn new(query: Query, bindings: TypeBindings) -> Self {
        Self { query, bindings }
    }

    /// Read-only access to the working query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Read-only access to the type bindings.
    pub fn bindings(&self) -> &TypeBindings {
        &self.bindings
    }

    /// Consume the model, returning the final narrowed query.
    pub fn into_query(self) -> Query {
        self.query
    }

    /// All triples mentioning the given variable.
    pub fn triples_by_variable(&self, v: &Var) -> Vec<Triple> {
        self.query
            .pattern
            .iter()
            .filter(|t| t.mentions_var(v))
            .cloned()
            .collect()
    }

    /// All existing filters.
    pub fn filters(&self) -> &[Filter] {
        &self.query.filters
    }

    /// Add a filter, merging it into an existing single-variable filter group
    /// where applicable.
    ///
    /// Returns a log of any triples/filters removed as a consequence of a
    /// contradiction ("the caller removes those filters and all
    /// triples whose object is `v`").
    pub fn add_filter(&mut self, f: Filter) -> MutationLog {
        let mut log = MutationLog::default();

        // NotExists dedup happens first, before any merge attempt,
        // resolving the source's dedup-vs-merge ordering ambiguity).
        if f.0.is_not_exists() {
            if self
                .query
                .filters
                .iter()
                .any(|existing| existing.structurally_equal(&f))
            {
                return log; // P7: already present, do nothing.
            }
            self.query.filters.push(f);
            return log;
        }

        let free = f.free_vars();
        if free.len() != 1 {
            // Multi-variable filters are appended verbatim, no merge attempted.
            self.query.filters.push(f);
            return log;
        }
        let v = free[0].clone();

        // Skip merging when `v` appears as the object of a triple whose
        // predicate is a variable: such filters stay independent
        // because the predicate itself might later be narrowed away.
        let skip_merge = self.query.pattern.iter().any(|t| {
            t.object == NodeId::Variable(v.clone()) && t.predicate.is_variable()
        });

        if skip_merge {
            self.query.filters.push(f);
            return log;
        }

        // Gather existing simple filters on exactly `v`.
        let mergeable_idx: Vec<usize> = self
            .query
            .filters
            .iter()
            .enumerate()
            .filter(|(_, existing)| {
                existing.0.is_simple() && existing.free_vars() == vec![v.clone()]
            })
            .map(|(i, _)| i)
            .collect();

        let mut group: Vec<Filter> = mergeable_idx
            .iter()
            .map(|&i| self.query.filters[i].clone())
            .collect();
        group.push(f);

        match filter_algebra::combine(&group) {
            CombineOutcome::Merged(merged) => {
                // Remove old group members (highest index first) and insert the merge result.
                for &i in mergeable_idx.iter().rev() {
                    self.query.filters.remove(i);
                }
                self.query.filters.push(merged);
            }
            CombineOutcome::Contradiction => {
                for &i in mergeable_idx.iter().rev() {
                    log.filters_removed.push(self.query.filters.remove(i));
                }
                // Drop every triple whose object is the unsatisfiable variable.
                let dead = self.query.triples_with_object(&NodeId::Variable(v));
                for t in dead {
                    let sub_log = self.remove_triple(&t);
                    log.triples_removed.extend(sub_log.triples_removed);
                    log.filters_removed.extend(sub_log.filters_removed);
                }
            }
        }
        log
    }

    /// Remove a triple and run the well-formedness cascade:
    /// prune dangling projections, shrink type bindings, drop orphaned
    /// filters.
    pub fn remove_triple(&mut self, t: &Triple) -> MutationLog {
        let mut log = MutationLog::default();
        let before_len = self.query.pattern.len();
        self.query.pattern.retain(|existing| existing != t);
        if self.query.pattern.len() == before_len {
            return log; // Not present; nothing to cascade.
        }
        log.triples_removed.push(t.clone());

        // 1. Prune projected columns that no longer appear in any triple.
        self.query.projection.retain(|p| {
            p.depends_on()
                .iter()
                .all(|v| self.query.any_triple_mentions_var(v))
        });

        // 2. Shrink TypeBindings to variables/URIs/predicate-vars still present.
        self.bindings.retain_occurring(&self.query);

        // 3. Drop filters whose free variables include a now-dangling variable.
        let mut keep = Vec::with_capacity(self.query.filters.len());
        for f in std::mem::take(&mut self.query.filters) {
            let dangling = f
                .free_vars()
                .iter()
                .any(|v| !self.query.any_triple_mentions_var(v));
            if dangling {
                log.filters_removed.push(f);
            } else {
                keep.push(f);
            }
        }
        self.query.filters = keep;

        log
    }

    /// Remove all triples mentioning the given node, cascading each removal.
    pub fn remove_triples_mentioning(&mut self, node: &NodeId) -> MutationLog {
        let mut log = MutationLog::default();
        loop {
            let next = self.query.pattern.iter().find(|t| t.mentions(node)).cloned();
            match next {
                Some(t) => {
                    let sub = self.remove_triple(&t);
                    log.triples_removed.extend(sub.triples_removed);
                    log.filters_removed.extend(sub.filters_removed);
                }
                None => break,
            }
        }
        log
    }

    /// Remove a filter by structural equality (I4).
    pub fn remove_filter(&mut self, f: &Filter) -> bool {
        let before = self.query.filters.len();
        self.query.filters.retain(|existing| !existing.structurally_equal(f));
        self.query.filters.len() != before
    }
}
