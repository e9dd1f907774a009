//! The Rewrite Driver: node, predicate, and attribute passes over the
//! `QueryModel`, and the public `Rewriter` entry point.

use std::collections::HashSet;

use crate::error::{GraphGuardError, GraphGuardResult};
use crate::expr::{compare, Expression, NodeValue, Ordering3};
use crate::ids::{Iri, LiteralValue, NodeId, TypeId, User};
use crate::model::{Filter, MutationLog, Query, QueryModel, Triple};
use crate::oracle::{DatasetProbe, SchemaOracle};
use crate::policy::{AttrOp, PolicyStore};
use crate::type_infer::TypeInferencer;

/// What a single rewrite pass did, for CLI diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub triples_removed: Vec<Triple>,
    pub filters_added: Vec<Filter>,
    pub filters_removed: Vec<Filter>,
    pub constraints_applied: usize,
}

impl PassReport {
    fn record_log(&mut self, log: MutationLog) {
        self.triples_removed.extend(log.triples_removed);
        self.filters_removed.extend(log.filters_removed);
    }
}

/// The combined outcome of all three passes.
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    pub node: PassReport,
    pub predicate: PassReport,
    pub attribute: PassReport,
}

/// The policy-driven query rewriter. Single-threaded, synchronous, stateless
/// between calls: construct once per `(policy, dataset, user)` triple
/// and call [`Rewriter::rewrite`] per query.
pub struct Rewriter<'a> {
    policy: &'a PolicyStore,
    oracle: &'a dyn SchemaOracle,
    probe: &'a dyn DatasetProbe,
    user: User,
    inferencer: TypeInferencer,
}

impl<'a> Rewriter<'a> {
    /// Construct a rewriter for one user against one policy/dataset pair.
    pub fn new(
        policy: &'a PolicyStore,
        oracle: &'a dyn SchemaOracle,
        probe: &'a dyn DatasetProbe,
        user: impl Into<User>,
    ) -> GraphGuardResult<Self> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(GraphGuardError::InvalidQuery("user identity must not be empty".into()));
        }
        Ok(Self {
            policy,
            oracle,
            probe,
            user,
            inferencer: TypeInferencer::new(),
        })
    }

    /// Override the type inferencer (e.g. to disable the predicate-variable
    /// fallback).
    pub fn with_inferencer(mut self, inferencer: TypeInferencer) -> Self {
        self.inferencer = inferencer;
        self
    }

    /// Rewrite `query` for this rewriter's user, returning the narrowed
    /// query and a diagnostic report of what each pass did.
    pub fn rewrite(&self, query: Query) -> GraphGuardResult<(Query, RewriteReport)> {
        validate_query(&query)?;

        tracing::info!(user = %self.user, triples = query.pattern.len(), "starting rewrite");

        let bindings = self.inferencer.infer(&query, self.oracle, self.probe);
        let mut model = QueryModel::new(query, bindings);

        let node = self.run_node_pass(&mut model);
        tracing::debug!(applied = node.constraints_applied, "node pass complete");

        let predicate = self.run_predicate_pass(&mut model);
        tracing::debug!(applied = predicate.constraints_applied, "predicate pass complete");

        let attribute = self.run_attribute_pass(&mut model);
        tracing::debug!(applied = attribute.constraints_applied, "attribute pass complete");

        Ok((
            model.into_query(),
            RewriteReport { node, predicate, attribute },
        ))
    }

    fn run_node_pass(&self, model: &mut QueryModel) -> PassReport {
        let mut report = PassReport::default();

        let vars: Vec<_> = model.bindings().var_types.keys().cloned().collect();
        for v in vars {
            let types: Vec<TypeId> = model.bindings().var_types[&v].iter().cloned().collect();
            let mut filters = Vec::new();
            let mut any = false;
            // Whether every candidate type contributed a class-level
            // (unscoped) denial — if so there is no type v could still bind
            // to, so the whole triple is dropped rather than filtered.
            let mut all_class_level = !types.is_empty();

            for t in &types {
                let constraints = self.policy.node_constraints(&self.user, t);
                if constraints.is_empty() {
                    all_class_level = false;
                    continue;
                }
                let is_class_level = matches!(constraints.as_slice(), [c] if c.nodes.is_none());
                if !is_class_level {
                    all_class_level = false;
                }
                for c in &constraints {
                    any = true;
                    match &c.nodes {
                        Some(nodes) => {
                            filters.push(Filter::new(Expression::NotIn(
                                NodeValue::VarRef(v.clone()),
                                nodes.iter().map(|n| LiteralValue::iri(n.as_str())).collect(),
                            )));
                        }
                        None => {
                            filters.push(Filter::new(Expression::NotExists(Triple::new(
                                NodeId::Variable(v.clone()),
                                NodeId::iri(crate::ids::RDF_TYPE),
                                NodeId::Iri(t.clone()),
                            ))));
                        }
                    }
                }
            }

            if !any {
                continue;
            }
            report.constraints_applied += 1;

            if all_class_level {
                let log = model.remove_triples_mentioning(&NodeId::Variable(v.clone()));
                report.record_log(log);
            } else {
                for f in filters {
                    let log = model.add_filter(f.clone());
                    report.filters_added.push(f);
                    report.record_log(log);
                }
            }
        }

        let iris: Vec<Iri> = model.bindings().iri_types.keys().cloned().collect();
        for u in iris {
            let types: Vec<TypeId> = model.bindings().iri_types[&u].iter().cloned().collect();
            let mut denied = false;
            for t in &types {
                for c in self.policy.node_constraints(&self.user, t) {
                    let hits = match &c.nodes {
                        Some(nodes) => nodes.iter().any(|n| n == &u),
                        None => true,
                    };
                    if hits {
                        denied = true;
                    }
                }
            }
            if denied {
                report.constraints_applied += 1;
                let log = model.remove_triples_mentioning(&NodeId::Iri(u));
                report.record_log(log);
            }
        }

        report
    }

    fn run_predicate_pass(&self, model: &mut QueryModel) -> PassReport {
        let mut report = PassReport::default();
        let triples = model.query().pattern.clone();

        for triple in &triples {
            if !model.query().contains_triple(triple) {
                continue; // removed by an earlier iteration's cascade
            }

            let subject_types = self.type_candidates_for(model, &triple.subject);
            let predicate_iris = self.predicate_candidates_for(model, &triple.predicate);
            let object_types = self.type_candidates_for(model, &triple.object);

            let total = subject_types.len().max(1) * predicate_iris.len().max(1) * object_types.len().max(1);
            let mut skip = 0usize;
            let mut not_exists = 0usize;
            let mut filters: Vec<Filter> = Vec::new();
            let mut applied = false;
            let mut drop_now = false;

            'combo: for s_t in one_or_empty(&subject_types) {
                for p_iri in &predicate_iris {
                    if !self.domain_allows(s_t, p_iri) {
                        skip += 1;
                        continue;
                    }
                    for o_t in one_or_empty(&object_types) {
                        if !self.range_allows(o_t, p_iri) {
                            skip += 1;
                            continue;
                        }
                        let (Some(st), Some(ot)) = (s_t, o_t) else { continue };
                        let constraints = self.policy.predicate_constraints(&self.user, st, p_iri, ot);
                        for pc in &constraints {
                            applied = true;
                            match predicate_combo_outcome(pc, triple) {
                                ComboOutcome::DropNow => {
                                    drop_now = true;
                                    break 'combo;
                                }
                                ComboOutcome::NotExists(e) => {
                                    not_exists += 1;
                                    filters.push(Filter::new(e));
                                }
                                ComboOutcome::Filters(es) => {
                                    filters.extend(es.into_iter().map(Filter::new));
                                }
                                ComboOutcome::Noop => {}
                            }
                        }
                    }
                }
            }

            if !applied {
                continue;
            }
            report.constraints_applied += 1;

            if drop_now || (not_exists > 0 && not_exists >= total.saturating_sub(skip)) {
                let log = model.remove_triple(triple);
                report.record_log(log);
            } else {
                for f in filters {
                    let log = model.add_filter(f.clone());
                    report.filters_added.push(f);
                    report.record_log(log);
                }
            }
        }

        report
    }

    fn run_attribute_pass(&self, model: &mut QueryModel) -> PassReport {
        let mut report = PassReport::default();
        let triples = model.query().pattern.clone();

        for triple in &triples {
            if !model.query().contains_triple(triple) {
                continue;
            }
            let NodeId::Iri(predicate) = &triple.predicate else {
                continue; // attribute constraints key on a ground predicate IRI
            };

            let subject_types = self.type_candidates_for(model, &triple.subject);
            let total = subject_types.len().max(1);
            let mut skip = 0usize;
            let mut not_exists = 0usize;
            let mut filters: Vec<Filter> = Vec::new();
            let mut applied = false;
            let mut drop_now = false;

            'combo: for s_t in one_or_empty(&subject_types) {
                if let Some(st) = s_t {
                    if !self.domain_allows(Some(st), predicate) {
                        skip += 1;
                        continue;
                    }
                }
                let Some(st) = s_t else { continue };
                for ac in self.policy.attribute_constraints(&self.user, st, predicate) {
                    applied = true;
                    match attribute_combo_outcome(&ac, triple) {
                        ComboOutcome::DropNow => {
                            drop_now = true;
                            break 'combo;
                        }
                        ComboOutcome::NotExists(e) => {
                            not_exists += 1;
                            filters.push(Filter::new(e));
                        }
                        ComboOutcome::Filters(es) => {
                            filters.extend(es.into_iter().map(Filter::new));
                        }
                        ComboOutcome::Noop => {}
                    }
                }
            }

            if !applied {
                continue;
            }
            report.constraints_applied += 1;

            if drop_now || (not_exists > 0 && not_exists >= total.saturating_sub(skip)) {
                let log = model.remove_triple(triple);
                report.record_log(log);
            } else {
                for f in filters {
                    let log = model.add_filter(f.clone());
                    report.filters_added.push(f);
                    report.record_log(log);
                }
            }
        }

        report
    }

    fn type_candidates_for(&self, model: &QueryModel, node: &NodeId) -> Vec<TypeId> {
        match node {
            NodeId::Variable(v) => model
                .bindings()
                .var_types
                .get(v)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
            NodeId::Iri(i) => model
                .bindings()
                .iri_types
                .get(i)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn predicate_candidates_for(&self, model: &QueryModel, node: &NodeId) -> Vec<Iri> {
        match node {
            NodeId::Iri(i) => vec![i.clone()],
            NodeId::Variable(v) => model
                .bindings()
                .pred_var_types
                .get(v)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn domain_allows(&self, s_t: Option<&TypeId>, p: &Iri) -> bool {
        let Some(st) = s_t else { return true };
        let domain = self.oracle.domain(p);
        domain.is_empty() || domain.contains(st)
    }

    fn range_allows(&self, o_t: Option<&TypeId>, p: &Iri) -> bool {
        let Some(ot) = o_t else { return true };
        let range = self.oracle.range(p);
        range.is_empty() || range.contains(ot)
    }
}

/// Iterate `Some(t)` for each candidate type, or a single `None` if the set
/// is empty (an absent schema/type constraint, not zero candidates).
fn one_or_empty(types: &[TypeId]) -> Vec<Option<&TypeId>> {
    if types.is_empty() {
        vec![None]
    } else {
        types.iter().map(Some).collect()
    }
}

enum ComboOutcome {
    DropNow,
    NotExists(Expression),
    Filters(Vec<Expression>),
    Noop,
}

fn predicate_combo_outcome(
    pc: &crate::policy::PredicateConstraint,
    triple: &Triple,
) -> ComboOutcome {
    match (&pc.subjects, &pc.objects) {
        (None, None) => ComboOutcome::NotExists(Expression::NotExists(triple.clone())),
        (Some(s_set), Some(o_set)) => combo_for_subject_object_sets(triple, s_set, o_set),
        (Some(s_set), None) => combo_for_side_set(&triple.subject, s_set, triple, true),
        (None, Some(o_set)) => combo_for_side_set(&triple.object, o_set, triple, false),
    }
}

fn combo_for_subject_object_sets(triple: &Triple, s_set: &[Iri], o_set: &[Iri]) -> ComboOutcome {
    let s_in = iri_const_membership(&triple.subject, s_set);
    let o_in = iri_const_membership(&triple.object, o_set);
    match (s_in, o_in) {
        (Some(false), _) | (_, Some(false)) => ComboOutcome::Noop,
        (Some(true), Some(true)) => ComboOutcome::DropNow,
        (Some(true), None) => ComboOutcome::Filters(vec![notin_expr_for(&triple.object, o_set)]),
        (None, Some(true)) => ComboOutcome::Filters(vec![notin_expr_for(&triple.subject, s_set)]),
        (None, None) => ComboOutcome::Filters(vec![Expression::Not(Box::new(Expression::And(vec![
            in_expr_for(&triple.subject, s_set),
            in_expr_for(&triple.object, o_set),
        ])))]),
    }
}

fn combo_for_side_set(side: &NodeId, set: &[Iri], triple: &Triple, is_subject: bool) -> ComboOutcome {
    match side {
        NodeId::Variable(v) => ComboOutcome::Filters(vec![Expression::NotIn(
            NodeValue::VarRef(v.clone()),
            set.iter().map(|i| LiteralValue::iri(i.as_str())).collect(),
        )]),
        NodeId::Iri(i) if set.iter().any(|m| m == i) => {
            let type_node = if is_subject { &triple.subject } else { &triple.object };
            ComboOutcome::NotExists(Expression::NotExists(Triple::new(
                type_node.clone(),
                NodeId::iri(crate::ids::RDF_TYPE),
                type_node.clone(),
            )))
        }
        _ => ComboOutcome::Noop,
    }
}

fn iri_const_membership(node: &NodeId, set: &[Iri]) -> Option<bool> {
    match node {
        NodeId::Iri(i) => Some(set.iter().any(|m| m == i)),
        _ => None,
    }
}

fn notin_expr_for(node: &NodeId, set: &[Iri]) -> Expression {
    match node {
        NodeId::Variable(v) => Expression::NotIn(
            NodeValue::VarRef(v.clone()),
            set.iter().map(|i| LiteralValue::iri(i.as_str())).collect(),
        ),
        other => Expression::NotExists(Triple::new(
            other.clone(),
            NodeId::iri(crate::ids::RDF_TYPE),
            other.clone(),
        )),
    }
}

fn in_expr_for(node: &NodeId, set: &[Iri]) -> Expression {
    match node {
        NodeId::Variable(v) => Expression::In(
            NodeValue::VarRef(v.clone()),
            set.iter().map(|i| LiteralValue::iri(i.as_str())).collect(),
        ),
        other => Expression::NotExists(Triple::new(
            other.clone(),
            NodeId::iri(crate::ids::RDF_TYPE),
            other.clone(),
        )),
    }
}

fn attribute_combo_outcome(
    ac: &crate::policy::AttributeConstraint,
    triple: &Triple,
) -> ComboOutcome {
    if ac.op == AttrOp::DenyRead {
        return match &ac.subjects {
            Some(subjects) => match &triple.subject {
                NodeId::Variable(v) => ComboOutcome::Filters(vec![Expression::NotIn(
                    NodeValue::VarRef(v.clone()),
                    subjects.iter().map(|i| LiteralValue::iri(i.as_str())).collect(),
                )]),
                NodeId::Iri(i) if subjects.iter().any(|s| s == i) => {
                    ComboOutcome::NotExists(Expression::NotExists(triple.clone()))
                }
                _ => ComboOutcome::Noop,
            },
            None => ComboOutcome::NotExists(Expression::NotExists(triple.clone())),
        };
    }

    let NodeId::Literal(_) | NodeId::Variable(_) = &triple.object else {
        return ComboOutcome::Noop;
    };

    if let NodeId::Variable(v) = &triple.object {
        let value = NodeValue::VarRef(v.clone());
        return ComboOutcome::Filters(match ac.op {
            AttrOp::Eq => vec![Expression::Eq(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Ne => vec![Expression::Ne(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Lt => vec![Expression::Lt(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Le => vec![Expression::Le(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Gt => vec![Expression::Gt(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Ge => vec![Expression::Ge(value, NodeValue::Const(ac.values[0].clone()))],
            AttrOp::Between => vec![
                Expression::Ge(value.clone(), NodeValue::Const(ac.values[0].clone())),
                Expression::Le(value, NodeValue::Const(ac.values[1].clone())),
            ],
            AttrOp::In => vec![Expression::In(value, ac.values.clone())],
            AttrOp::NotIn => vec![Expression::NotIn(value, ac.values.clone())],
            AttrOp::DenyRead => unreachable!(),
        });
    }

    let NodeId::Literal(lit) = &triple.object else {
        return ComboOutcome::Noop;
    };
    let violates = violates_permitted_range(ac.op, lit, &ac.values);
    if violates {
        ComboOutcome::NotExists(Expression::NotExists(triple.clone()))
    } else {
        ComboOutcome::Noop
    }
}

fn violates_permitted_range(op: AttrOp, x: &LiteralValue, values: &[LiteralValue]) -> bool {
    let ord = |c: &LiteralValue| compare(x, c);
    match op {
        AttrOp::Eq => !matches!(ord(&values[0]), Ordering3::Equal),
        AttrOp::Ne => matches!(ord(&values[0]), Ordering3::Equal | Ordering3::Incomparable),
        AttrOp::Lt => !matches!(ord(&values[0]), Ordering3::Less),
        AttrOp::Le => !matches!(ord(&values[0]), Ordering3::Less | Ordering3::Equal),
        AttrOp::Gt => !matches!(ord(&values[0]), Ordering3::Greater),
        AttrOp::Ge => !matches!(ord(&values[0]), Ordering3::Greater | Ordering3::Equal),
        AttrOp::Between => {
            let lo_ok = matches!(ord(&values[0]), Ordering3::Greater | Ordering3::Equal);
            let hi_ok = matches!(ord(&values[1]), Ordering3::Less | Ordering3::Equal);
            !(lo_ok && hi_ok)
        }
        AttrOp::In => !values.iter().any(|c| matches!(ord(c), Ordering3::Equal)),
        AttrOp::NotIn => values.iter().any(|c| matches!(ord(c), Ordering3::Equal)),
        AttrOp::DenyRead => unreachable!(),
    }
}

fn validate_query(query: &Query) -> GraphGuardResult<()> {
    for p in &query.projection {
        for v in p.depends_on() {
            if !query.any_triple_mentions_var(&v) {
                return Err(GraphGuardError::InvalidQuery(format!(
                    "projected variable {v} does not appear in the pattern"
                )));
            }
        }
    }
    for f in &query.filters {
        for v in f.free_vars() {
            if !query.any_triple_mentions_var(&v) {
                return Err(GraphGuardError::InvalidQuery(format!(
                    "filter references variable {v} absent from the pattern"
                )));
            }
        }
    }
    Ok(())
}

/// Evaluating the solution set against a dataset is out of scope here (no
/// executor); only the narrowed `Query` is returned.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Var;
    use crate::model::Projected;
    use crate::policy::{NodeConstraint, PolicyEntry};

    struct NullOracle;
    impl SchemaOracle for NullOracle {
        fn domain(&self, _predicate: &Iri) -> HashSet<TypeId> {
            HashSet::new()
        }
        fn range(&self, _predicate: &Iri) -> HashSet<TypeId> {
            HashSet::new()
        }
        fn sub_classes_of(&self, seeds: &HashSet<TypeId>) -> HashSet<TypeId> {
            seeds.clone()
        }
    }

    struct StaticProbe {
        types: HashSet<TypeId>,
    }
    impl DatasetProbe for StaticProbe {
        fn probe_types(&self, _pattern: &[Triple], _target: &NodeId) -> HashSet<TypeId> {
            self.types.clone()
        }
        fn probe_predicates(&self, _pattern: &[Triple], _p: &Var) -> HashSet<Iri> {
            HashSet::new()
        }
    }

    #[test]
    fn s1_node_class_deny_adds_not_exists() {
        let policy = PolicyStore::from_entries(vec![PolicyEntry::Node(NodeConstraint {
            user: "guest".into(),
            node_type: TypeId::new(":Doctor"),
            nodes: None,
        })]);
        let mut types = HashSet::new();
        types.insert(TypeId::new(":Person"));
        types.insert(TypeId::new(":Doctor"));
        let oracle = NullOracle;
        let probe = StaticProbe { types };

        let mut q = Query::empty();
        q.projection.push(Projected::plain(Var::new("x")));
        q.projection.push(Projected::plain(Var::new("n")));
        q.pattern.push(Triple::new(NodeId::var("x"), NodeId::iri(":name"), NodeId::var("n")));

        let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
        let (out, report) = rewriter.rewrite(q).unwrap();

        assert_eq!(report.node.constraints_applied, 1);
        assert!(out.filters.iter().any(|f| f.0.is_not_exists()));
    }

    #[test]
    fn node_deny_on_every_candidate_type_drops_triple() {
        let policy = PolicyStore::from_entries(vec![
            PolicyEntry::Node(NodeConstraint {
                user: "guest".into(),
                node_type: TypeId::new(":Person"),
                nodes: None,
            }),
            PolicyEntry::Node(NodeConstraint {
                user: "guest".into(),
                node_type: TypeId::new(":Doctor"),
                nodes: None,
            }),
        ]);
        let mut types = HashSet::new();
        types.insert(TypeId::new(":Person"));
        types.insert(TypeId::new(":Doctor"));
        let oracle = NullOracle;
        let probe = StaticProbe { types };

        let mut q = Query::empty();
        q.projection.push(Projected::plain(Var::new("x")));
        q.projection.push(Projected::plain(Var::new("n")));
        q.pattern.push(Triple::new(NodeId::var("x"), NodeId::iri(":name"), NodeId::var("n")));

        let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
        let (out, report) = rewriter.rewrite(q).unwrap();

        assert_eq!(report.node.constraints_applied, 1);
        assert!(out.pattern.is_empty());
        assert!(out.filters.is_empty());
    }

    #[test]
    fn s3_attribute_lt_on_variable_adds_filter() {
        let policy = PolicyStore::from_entries(vec![PolicyEntry::Attribute(
            crate::policy::AttributeConstraint {
                user: "guest".into(),
                subject_type: TypeId::new(":Person"),
                predicate: Iri::new(":hasSalary"),
                subjects: None,
                op: AttrOp::Lt,
                values: vec![LiteralValue::integer(1000)],
            },
        )]);
        let mut types = HashSet::new();
        types.insert(TypeId::new(":Person"));
        let oracle = NullOracle;
        let probe = StaticProbe { types };

        let mut q = Query::empty();
        q.pattern.push(Triple::new(NodeId::var("s"), NodeId::iri(":hasSalary"), NodeId::var("v")));

        let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
        let (out, report) = rewriter.rewrite(q).unwrap();

        assert_eq!(report.attribute.constraints_applied, 1);
        assert!(out
            .filters
            .iter()
            .any(|f| matches!(f.0, Expression::Lt(..))));
    }

    #[test]
    fn s4_attribute_lt_violating_literal_drops_triple() {
        let policy = PolicyStore::from_entries(vec![PolicyEntry::Attribute(
            crate::policy::AttributeConstraint {
                user: "guest".into(),
                subject_type: TypeId::new(":Person"),
                predicate: Iri::new(":hasSalary"),
                subjects: None,
                op: AttrOp::Lt,
                values: vec![LiteralValue::integer(1000)],
            },
        )]);
        let mut types = HashSet::new();
        types.insert(TypeId::new(":Person"));
        let oracle = NullOracle;
        let probe = StaticProbe { types };

        let mut q = Query::empty();
        q.pattern.push(Triple::new(
            NodeId::iri(":alice"),
            NodeId::iri(":hasSalary"),
            NodeId::Literal(LiteralValue::integer(5000)),
        ));

        let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
        let (out, _report) = rewriter.rewrite(q).unwrap();

        assert!(out.pattern.is_empty());
    }

    #[test]
    fn p3_identity_policy_leaves_query_unchanged() {
        let policy = PolicyStore::empty();
        let oracle = NullOracle;
        let probe = StaticProbe { types: HashSet::new() };

        let mut q = Query::empty();
        q.pattern.push(Triple::new(NodeId::var("x"), NodeId::iri(":name"), NodeId::var("n")));
        let original = q.clone();

        let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
        let (out, _report) = rewriter.rewrite(q).unwrap();

        assert_eq!(out.pattern, original.pattern);
        assert_eq!(out.filters, original.filters);
    }

    /// Build a small fixed pool of candidate triples over `:alice`/`:bob`,
    /// `?x`/`?y`, and `:name`/`:hasSalary`, so property tests can draw a
    /// random non-empty subset as a query pattern.
    fn candidate_triples() -> Vec<Triple> {
        vec![
            Triple::new(NodeId::var("x"), NodeId::iri(":name"), NodeId::var("n")),
            Triple::new(NodeId::var("x"), NodeId::iri(":hasSalary"), NodeId::var("s")),
            Triple::new(NodeId::iri(":alice"), NodeId::iri(":name"), NodeId::var("n2")),
            Triple::new(NodeId::iri(":bob"), NodeId::iri(":hasSalary"), NodeId::var("s2")),
        ]
    }

    fn arbitrary_pattern() -> impl proptest::strategy::Strategy<Value = Vec<Triple>> {
        use proptest::prelude::*;
        proptest::collection::vec(0usize..candidate_triples().len(), 1..=4).prop_map(|idxs| {
            let pool = candidate_triples();
            let mut seen = HashSet::new();
            idxs.into_iter()
                .map(|i| pool[i].clone())
                .filter(|t| seen.insert(t.clone()))
                .collect::<Vec<_>>()
        })
    }

    fn arbitrary_node_policy() -> impl proptest::strategy::Strategy<Value = PolicyStore> {
        use proptest::prelude::*;
        proptest::option::of(proptest::bool::ANY).prop_map(|deny_doctor| {
            let mut entries = Vec::new();
            if deny_doctor.unwrap_or(false) {
                entries.push(PolicyEntry::Node(NodeConstraint {
                    user: "guest".into(),
                    node_type: TypeId::new(":Doctor"),
                    nodes: None,
                }));
            }
            PolicyStore::from_entries(entries)
        })
    }

    proptest::proptest! {
        /// P1: the rewritten pattern is always a subset of the input
        /// pattern. No pass ever introduces a triple; passes only remove
        /// triples or narrow them with filters.
        #[test]
        fn p1_rewrite_only_shrinks_the_pattern(pattern in arbitrary_pattern(), policy in arbitrary_node_policy()) {
            let mut types = HashSet::new();
            types.insert(TypeId::new(":Person"));
            types.insert(TypeId::new(":Doctor"));
            let oracle = NullOracle;
            let probe = StaticProbe { types };

            let mut q = Query::empty();
            q.pattern = pattern.clone();

            let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
            let (out, _report) = rewriter.rewrite(q).unwrap();

            for t in &out.pattern {
                proptest::prop_assert!(pattern.contains(t));
            }
        }

        /// P2: rewriting an already-rewritten query under the same policy is
        /// a no-op — the rewrite driver reaches a fixed point in one pass.
        #[test]
        fn p2_rewrite_is_idempotent(pattern in arbitrary_pattern(), policy in arbitrary_node_policy()) {
            let mut types = HashSet::new();
            types.insert(TypeId::new(":Person"));
            types.insert(TypeId::new(":Doctor"));
            let oracle = NullOracle;
            let probe = StaticProbe { types };

            let mut q = Query::empty();
            q.pattern = pattern;

            let rewriter = Rewriter::new(&policy, &oracle, &probe, "guest").unwrap();
            let (once, _) = rewriter.rewrite(q).unwrap();
            let (twice, _) = rewriter.rewrite(once.clone()).unwrap();

            proptest::prop_assert_eq!(twice.pattern, once.pattern);
            proptest::prop_assert_eq!(twice.filters, once.filters);
        }
    }
}
