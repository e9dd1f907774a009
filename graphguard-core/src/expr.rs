//! Expression trees (filter conditions) and typed literal comparison.

use serde::{Deserialize, Serialize};

use crate::ids::{LiteralValue, PrimitiveType, Var};
use crate::model::Triple;

/// A leaf or constant used inside an [`Expression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeValue {
    /// A reference to a query variable.
    VarRef(Var),
    /// A constant literal or IRI value.
    Const(LiteralValue),
}

impl NodeValue {
    /// The free variable this value contributes, if it is a `VarRef`.
    pub fn free_var(&self) -> Option<&Var> {
        match self {
            Self::VarRef(v) => Some(v),
            Self::Const(_) => None,
        }
    }
}

/// The result of comparing two typed literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering3 {
    /// `a < b`.
    Less,
    /// `a == b`.
    Equal,
    /// `a > b`.
    Greater,
    /// The values are incomparable (mismatched/unparsable type): treated as
    /// violating every operator.
    Incomparable,
}

/// Typed comparison between two literal values.
///
/// Dates are parsed as `%Y-%m-%d`; an unparsable date is `Incomparable`
/// against everything, which the Attribute pass turns into dropping
/// the owning triple rather than ever admitting it.
pub fn compare(a: &LiteralValue, b: &LiteralValue) -> Ordering3 {
    use PrimitiveType::*;
    match (a.datatype, b.datatype) {
        (Iri, Iri) => {
            if a.lexical == b.lexical {
                Ordering3::Equal
            } else {
                // IRIs have no intrinsic order; only equality is meaningful.
                Ordering3::Incomparable
            }
        }
        (String, String) => cmp_ord(a.lexical.as_str().cmp(b.lexical.as_str())),
        (Integer, Integer) => match (a.lexical.parse::<i64>(), b.lexical.parse::<i64>()) {
            (Ok(x), Ok(y)) => cmp_ord(x.cmp(&y)),
            _ => Ordering3::Incomparable,
        },
        (Double, Double) | (Integer, Double) | (Double, Integer) => {
            match (a.lexical.parse::<f64>(), b.lexical.parse::<f64>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).map(cmp_ord).unwrap_or(Ordering3::Incomparable),
                _ => Ordering3::Incomparable,
            }
        }
        (Date, Date) => match (parse_date(&a.lexical), parse_date(&b.lexical)) {
            (Some(x), Some(y)) => cmp_ord(x.cmp(&y)),
            // An unparsable date violates every operator rather than being
            // silently swallowed.
            _ => Ordering3::Incomparable,
        },
        _ => Ordering3::Incomparable,
    }
}

fn cmp_ord(o: std::cmp::Ordering) -> Ordering3 {
    match o {
        std::cmp::Ordering::Less => Ordering3::Less,
        std::cmp::Ordering::Equal => Ordering3::Equal,
        std::cmp::Ordering::Greater => Ordering3::Greater,
    }
}

fn parse_date(lexical: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(lexical, "%Y-%m-%d").ok()
}

/// `true` iff `a == b` holds under typed comparison.
pub fn values_equal(a: &LiteralValue, b: &LiteralValue) -> bool {
    matches!(compare(a, b), Ordering3::Equal)
}

/// Root operators an [`Expression`] tree node can take.
///
/// `Eq`..`NotIn` are the "simple" comparison operators the Filter Algebra
/// merges; `And`/`Or`/`Not`/`NotExists` are compound and are never folded,
/// only conjoined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// `v = c`.
    Eq(NodeValue, NodeValue),
    /// `v != c`.
    Ne(NodeValue, NodeValue),
    /// `v < c`.
    Lt(NodeValue, NodeValue),
    /// `v <= c`.
    Le(NodeValue, NodeValue),
    /// `v > c`.
    Gt(NodeValue, NodeValue),
    /// `v >= c`.
    Ge(NodeValue, NodeValue),
    /// `v IN (c1, c2, ...)`.
    In(NodeValue, Vec<LiteralValue>),
    /// `v NOT IN (c1, c2, ...)`.
    NotIn(NodeValue, Vec<LiteralValue>),
    /// Logical conjunction.
    And(Vec<Expression>),
    /// Logical disjunction.
    Or(Vec<Expression>),
    /// Logical negation.
    Not(Box<Expression>),
    /// `NOT EXISTS { triple }`. Only single-triple patterns are needed by the
    /// rewrite passes; larger `NOT EXISTS` patterns are out of scope.
    NotExists(Triple),
}

impl Expression {
    /// Collect the set of variables this expression's leaves reference.
    pub fn free_vars(&self) -> Vec<Var> {
        let mut out = Vec::new();
        self.collect_free_vars(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_free_vars(&self, out: &mut Vec<Var>) {
        match self {
            Expression::Eq(a, b)
            | Expression::Ne(a, b)
            | Expression::Lt(a, b)
            | Expression::Le(a, b)
            | Expression::Gt(a, b)
            | Expression::Ge(a, b) => {
                if let Some(v) = a.free_var() {
                    out.push(v.clone());
                }
                if let Some(v) = b.free_var() {
                    out.push(v.clone());
                }
            }
            Expression::In(v, _) | Expression::NotIn(v, _) => {
                if let Some(v) = v.free_var() {
                    out.push(v.clone());
                }
            }
            Expression::And(es) | Expression::Or(es) => {
                for e in es {
                    e.collect_free_vars(out);
                }
            }
            Expression::Not(e) => e.collect_free_vars(out),
            Expression::NotExists(t) => out.extend(t.free_vars()),
        }
    }

    /// `true` iff this is one of the eight simple comparison operators that
    /// the Filter Algebra can fold (as opposed to a compound And/Or/Not or a
    /// NotExists, which are only ever conjoined verbatim).
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Expression::Eq(..)
                | Expression::Ne(..)
                | Expression::Lt(..)
                | Expression::Le(..)
                | Expression::Gt(..)
                | Expression::Ge(..)
                | Expression::In(..)
                | Expression::NotIn(..)
        )
    }

    /// `true` iff this is a `NotExists` filter.
    pub fn is_not_exists(&self) -> bool {
        matches!(self, Expression::NotExists(_))
    }

    /// Structural equality used for filter dedup (I4): for `NotExists`,
    /// compares the inner triple; otherwise falls back to derived `PartialEq`.
    pub fn structurally_equal(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::NotExists(a), Expression::NotExists(b)) => a == b,
            _ => self == other,
        }
    }
}
