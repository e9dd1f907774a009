//! Policy Store: typed lookups over a loaded set of access-control entries.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ids::{Iri, TypeId, User};

/// A class-level or instance-level node denial.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConstraint {
    pub user: User,
    pub node_type: TypeId,
    /// `None` forbids the whole class; `Some(set)` forbids only those nodes.
    pub nodes: Option<Vec<Iri>>,
}

/// An edge denial between two (optionally set-scoped) classes.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateConstraint {
    pub user: User,
    pub subject_type: TypeId,
    pub predicate: Iri,
    pub object_type: TypeId,
    pub subjects: Option<Vec<Iri>>,
    pub objects: Option<Vec<Iri>>,
}

/// The operator an [`AttributeConstraint`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// Deny-read.
    DenyRead,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
    In,
    NotIn,
}

/// A value-narrowing or deny-read constraint on one predicate's object value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeConstraint {
    pub user: User,
    pub subject_type: TypeId,
    pub predicate: Iri,
    pub subjects: Option<Vec<Iri>>,
    pub op: AttrOp,
    /// The permitted-value literal(s); `Between` uses exactly two (lo, hi),
    /// `In`/`NotIn` use the whole list, the scalar comparisons use the first.
    pub values: Vec<crate::ids::LiteralValue>,
}

/// The loaded, indexed set of policy entries. Immutable after
/// [`PolicyStore::load_from_str`] / [`PolicyStore::load_from_path`].
#[derive(Debug, Default)]
pub struct PolicyStore {
    nodes: HashMap<(User, TypeId), Vec<NodeConstraint>>,
    predicates: HashMap<(User, TypeId, Iri, TypeId), Vec<PredicateConstraint>>,
    attributes: HashMap<(User, TypeId, Iri), Vec<AttributeConstraint>>,
}

impl PolicyStore {
    /// An empty policy store (P3: identity rewrite).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load policy entries from an already-parsed list (used by the JSON
    /// adapter in [`crate::policy::json`], and directly by tests).
    pub fn from_entries(entries: Vec<PolicyEntry>) -> Self {
        let mut store = Self::default();
        for entry in entries {
            match entry {
                PolicyEntry::Node(n) => {
                    store
                        .nodes
                        .entry((n.user.clone(), n.node_type.clone()))
                        .or_default()
                        .push(n);
                }
                PolicyEntry::Predicate(p) => {
                    store
                        .predicates
                        .entry((
                            p.user.clone(),
                            p.subject_type.clone(),
                            p.predicate.clone(),
                            p.object_type.clone(),
                        ))
                        .or_default()
                        .push(p);
                }
                PolicyEntry::Attribute(a) => {
                    store
                        .attributes
                        .entry((a.user.clone(), a.subject_type.clone(), a.predicate.clone()))
                        .or_default()
                        .push(a);
                }
            }
        }
        store
    }

    /// `nodeConstraints(user, type)`: an unscoped entry subsumes the rest.
    pub fn node_constraints(&self, user: &str, node_type: &TypeId) -> Vec<NodeConstraint> {
        let Some(entries) = self.nodes.get(&(user.to_string(), node_type.clone())) else {
            return Vec::new();
        };
        if let Some(unscoped) = entries.iter().find(|e| e.nodes.is_none()) {
            return vec![unscoped.clone()];
        }
        entries.clone()
    }

    /// `predicateConstraints(user, sType, pIRI, oType)`: an entry with
    /// neither set is authoritative.
    pub fn predicate_constraints(
        &self,
        user: &str,
        subject_type: &TypeId,
        predicate: &Iri,
        object_type: &TypeId,
    ) -> Vec<PredicateConstraint> {
        let key = (
            user.to_string(),
            subject_type.clone(),
            predicate.clone(),
            object_type.clone(),
        );
        let Some(entries) = self.predicates.get(&key) else {
            return Vec::new();
        };
        if let Some(absolute) = entries
            .iter()
            .find(|e| e.subjects.is_none() && e.objects.is_none())
        {
            return vec![absolute.clone()];
        }
        entries
            .iter()
            .filter(|e| e.subjects.is_some() || e.objects.is_some())
            .cloned()
            .collect()
    }

    /// `attributeConstraints(user, sType, pIRI)`: an unscoped `X` entry
    /// is authoritative; scoped `X` entries override value-operator entries.
    pub fn attribute_constraints(
        &self,
        user: &str,
        subject_type: &TypeId,
        predicate: &Iri,
    ) -> Vec<AttributeConstraint> {
        let key = (user.to_string(), subject_type.clone(), predicate.clone());
        let Some(entries) = self.attributes.get(&key) else {
            return Vec::new();
        };
        if let Some(unscoped_deny) = entries
            .iter()
            .find(|e| e.op == AttrOp::DenyRead && e.subjects.is_none())
        {
            return vec![unscoped_deny.clone()];
        }
        let scoped_deny: Vec<AttributeConstraint> = entries
            .iter()
            .filter(|e| e.op == AttrOp::DenyRead && e.subjects.is_some())
            .cloned()
            .collect();
        if !scoped_deny.is_empty() {
            return scoped_deny;
        }
        entries
            .iter()
            .filter(|e| e.op != AttrOp::DenyRead)
            .cloned()
            .collect()
    }
}

/// One decoded policy entry, prior to indexing.
#[derive(Debug, Clone)]
pub enum PolicyEntry {
    Node(NodeConstraint),
    Predicate(PredicateConstraint),
    Attribute(AttributeConstraint),
}

/// JSON policy loading: the ambient, concrete adapter
/// for the out-of-scope "JSON reading of the policy file" collaborator.
pub mod json {
    use super::*;
    use crate::error::{GraphGuardError, GraphGuardResult};
    use crate::ids::{LiteralValue, PrimitiveType};

    /// The untagged-by-`constraint`-field shape read directly off the wire.
    #[derive(Debug, Deserialize)]
    struct RawEntry {
        constraint: String,
        user: Option<String>,
        #[serde(rename = "node-type")]
        node_type: Option<String>,
        nodes: Option<Vec<String>>,
        #[serde(rename = "subject-type")]
        subject_type: Option<String>,
        predicate: Option<String>,
        #[serde(rename = "object-type")]
        object_type: Option<String>,
        subjects: Option<Vec<String>>,
        objects: Option<Vec<String>>,
        symbol: Option<String>,
        values: Option<Vec<String>>,
    }

    fn primitive_for(object_type: Option<&str>) -> PrimitiveType {
        match object_type {
            Some("integer") => PrimitiveType::Integer,
            Some("double") => PrimitiveType::Double,
            Some("date") => PrimitiveType::Date,
            Some("anyURI") | Some("iri") => PrimitiveType::Iri,
            _ => PrimitiveType::String,
        }
    }

    fn literal_for(lexical: &str, ty: PrimitiveType) -> LiteralValue {
        LiteralValue {
            lexical: lexical.into(),
            datatype: ty,
            lang: None,
        }
    }

    fn parse_op(symbol: &str) -> Option<super::AttrOp> {
        use super::AttrOp::*;
        Some(match symbol {
            "X" => DenyRead,
            "=" => Eq,
            "!=" | "≠" => Ne,
            "<" => Lt,
            "<=" | "≤" => Le,
            ">" => Gt,
            ">=" | "≥" => Ge,
            "between" => Between,
            "in" => In,
            "notin" => NotIn,
            _ => return None,
        })
    }

    /// Decode one raw entry, skipping (with a `tracing::warn!`) anything
    /// malformed rather than failing the whole load.
    fn decode(index: usize, raw: RawEntry) -> Option<PolicyEntry> {
        let Some(user) = raw.user.clone() else {
            tracing::warn!(index, "policy entry missing `user`, skipping");
            return None;
        };
        match raw.constraint.as_str() {
            "node" => {
                let Some(node_type) = raw.node_type.as_deref() else {
                    tracing::warn!(index, "node constraint missing `node-type`, skipping");
                    return None;
                };
                Some(PolicyEntry::Node(NodeConstraint {
                    user,
                    node_type: TypeId::new(node_type),
                    nodes: raw.nodes.map(|ns| ns.into_iter().map(Iri::new).collect()),
                }))
            }
            "predicate" => {
                let (Some(subject_type), Some(predicate), Some(object_type)) = (
                    raw.subject_type.as_deref(),
                    raw.predicate.as_deref(),
                    raw.object_type.as_deref(),
                ) else {
                    tracing::warn!(index, "predicate constraint missing a required field, skipping");
                    return None;
                };
                Some(PolicyEntry::Predicate(PredicateConstraint {
                    user,
                    subject_type: TypeId::new(subject_type),
                    predicate: Iri::new(predicate),
                    object_type: TypeId::new(object_type),
                    subjects: raw.subjects.map(|s| s.into_iter().map(Iri::new).collect()),
                    objects: raw.objects.map(|s| s.into_iter().map(Iri::new).collect()),
                }))
            }
            "attribute" => {
                let (Some(subject_type), Some(predicate), Some(symbol)) = (
                    raw.subject_type.as_deref(),
                    raw.predicate.as_deref(),
                    raw.symbol.as_deref(),
                ) else {
                    tracing::warn!(index, "attribute constraint missing a required field, skipping");
                    return None;
                };
                let Some(op) = parse_op(symbol) else {
                    tracing::warn!(index, symbol, "unknown attribute operator, skipping");
                    return None;
                };
                let primitive = primitive_for(raw.object_type.as_deref());
                let values = raw
                    .values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| literal_for(&v, primitive))
                    .collect();
                Some(PolicyEntry::Attribute(AttributeConstraint {
                    user,
                    subject_type: TypeId::new(subject_type),
                    predicate: Iri::new(predicate),
                    subjects: raw.subjects.map(|s| s.into_iter().map(Iri::new).collect()),
                    op,
                    values,
                }))
            }
            other => {
                tracing::warn!(index, constraint = other, "unknown constraint kind, skipping");
                None
            }
        }
    }

    /// Parse a policy file body (a JSON array of entries) into a
    /// [`super::PolicyStore`]. Returns the store plus per-entry accept/skip
    /// counts for `graphguard check-policy`.
    pub fn load_from_str(text: &str) -> GraphGuardResult<(super::PolicyStore, usize, usize)> {
        let raw_entries: Vec<RawEntry> = serde_json::from_str(text)
            .map_err(|e| GraphGuardError::Policy(format!("invalid policy JSON: {e}")))?;
        let total = raw_entries.len();
        let mut entries = Vec::with_capacity(total);
        for (i, raw) in raw_entries.into_iter().enumerate() {
            if let Some(entry) = decode(i, raw) {
                entries.push(entry);
            }
        }
        let accepted = entries.len();
        Ok((super::PolicyStore::from_entries(entries), accepted, total - accepted))
    }

    /// Load a policy file from disk.
    pub fn load_from_path(path: &std::path::Path) -> GraphGuardResult<(super::PolicyStore, usize, usize)> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphGuardError::Config(format!("reading policy file {path:?}: {e}")))?;
        load_from_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_node_constraint_subsumes_scoped_ones() {
        let store = PolicyStore::from_entries(vec![
            PolicyEntry::Node(NodeConstraint {
                user: "guest".into(),
                node_type: TypeId::new(":Doctor"),
                nodes: Some(vec![Iri::new(":alice")]),
            }),
            PolicyEntry::Node(NodeConstraint {
                user: "guest".into(),
                node_type: TypeId::new(":Doctor"),
                nodes: None,
            }),
        ]);
        let result = store.node_constraints("guest", &TypeId::new(":Doctor"));
        assert_eq!(result.len(), 1);
        assert!(result[0].nodes.is_none());
    }

    #[test]
    fn unknown_constraint_kind_is_skipped() {
        let (store, accepted, skipped) =
            json::load_from_str(r#"[{"constraint":"bogus"}, {"constraint":"node","user":"guest","node-type":":Doctor"}]"#)
                .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(skipped, 1);
        assert_eq!(store.node_constraints("guest", &TypeId::new(":Doctor")).len(), 1);
    }

    #[test]
    fn scoped_deny_read_overrides_value_operators() {
        let store = PolicyStore::from_entries(vec![
            PolicyEntry::Attribute(AttributeConstraint {
                user: "guest".into(),
                subject_type: TypeId::new(":Person"),
                predicate: Iri::new(":hasSalary"),
                subjects: Some(vec![Iri::new(":bob")]),
                op: AttrOp::DenyRead,
                values: vec![],
            }),
            PolicyEntry::Attribute(AttributeConstraint {
                user: "guest".into(),
                subject_type: TypeId::new(":Person"),
                predicate: Iri::new(":hasSalary"),
                subjects: None,
                op: AttrOp::Lt,
                values: vec![crate::ids::LiteralValue::integer(1000)],
            }),
        ]);
        let result =
            store.attribute_constraints("guest", &TypeId::new(":Person"), &Iri::new(":hasSalary"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].op, AttrOp::DenyRead);
    }
}
