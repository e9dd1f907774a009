//! Identifiers shared across the query model: IRIs, variables, and users.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// An RDF variable name, without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Var(pub SmolStr);

impl Var {
    /// Create a variable from any string-like value.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// The variable's name, without the `?` sigil.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Var {
    fn from(s: &str) -> Self {
        Self::new(s.trim_start_matches('?'))
    }
}

impl From<String> for Var {
    fn from(s: String) -> Self {
        Self::new(s.trim_start_matches('?'))
    }
}

/// An absolute IRI. `TypeId` is an alias used where the IRI denotes an `rdf:type`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Iri(pub SmolStr);

/// An `rdf:type` value; structurally just an IRI.
pub type TypeId = Iri;

impl Iri {
    /// Create an IRI from any string-like value.
    pub fn new(iri: impl Into<SmolStr>) -> Self {
        Self(iri.into())
    }

    /// The IRI text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A blank node identifier (`_:name`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlankNode(pub SmolStr);

/// An opaque user identity. The rewriter never interprets this beyond equality
/// against policy entries ("distinguishing between categories of users
/// beyond an opaque string identity" is an explicit non-goal).
pub type User = String;

/// `rdf:type`, spelled out once so call sites don't repeat the literal.
pub const RDF_TYPE: &str = "rdf:type";

/// The disjoint union of node positions a triple pattern can hold.
///
/// Subjects and predicates never take the `Literal` variant; this is enforced
/// by the `Triple` constructors in [`crate::model`], not by the type itself,
/// to keep `NodeId` a single flat enum the rest of the crate pattern-matches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// An absolute IRI.
    Iri(Iri),
    /// A typed literal value.
    Literal(LiteralValue),
    /// A query variable.
    Variable(Var),
    /// A blank node.
    Blank(BlankNode),
}

impl NodeId {
    /// Build an IRI node.
    pub fn iri(iri: impl Into<Iri>) -> Self {
        Self::Iri(iri.into())
    }

    /// Build a variable node.
    pub fn var(name: impl Into<Var>) -> Self {
        Self::Variable(name.into())
    }

    /// `true` if this node is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// `true` if this node is a constant IRI.
    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    /// The variable this node refers to, if any.
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// The IRI this node refers to, if any.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Iri(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(i) => write!(f, "{i}"),
            Self::Literal(l) => write!(f, "{l}"),
            Self::Variable(v) => write!(f, "{v}"),
            Self::Blank(b) => write!(f, "_:{}", b.0),
        }
    }
}

/// The primitive type tag a literal or comparison constant carries.
///
/// This is the type the Filter Algebra's `cmp` dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// `xsd:string`.
    String,
    /// `xsd:integer`.
    Integer,
    /// `xsd:double`.
    Double,
    /// `xsd:date`.
    Date,
    /// An IRI used as a value (e.g. comparing a variable to a named resource).
    Iri,
}

/// A literal RDF value: a lexical form plus a primitive type tag and optional
/// language tag (meaningful only for `PrimitiveType::String`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiteralValue {
    /// The lexical (textual) form of the value.
    pub lexical: SmolStr,
    /// The declared primitive type.
    pub datatype: PrimitiveType,
    /// An optional BCP-47 language tag, for `PrimitiveType::String` literals.
    pub lang: Option<SmolStr>,
}

impl LiteralValue {
    /// Build a plain string literal.
    pub fn string(s: impl Into<SmolStr>) -> Self {
        Self {
            lexical: s.into(),
            datatype: PrimitiveType::String,
            lang: None,
        }
    }

    /// Build an integer literal.
    pub fn integer(n: i64) -> Self {
        Self {
            lexical: SmolStr::new(n.to_string()),
            datatype: PrimitiveType::Integer,
            lang: None,
        }
    }

    /// Build a double literal.
    pub fn double(n: f64) -> Self {
        Self {
            lexical: SmolStr::new(n.to_string()),
            datatype: PrimitiveType::Double,
            lang: None,
        }
    }

    /// Build a date literal (`YYYY-MM-DD` lexical form expected).
    pub fn date(s: impl Into<SmolStr>) -> Self {
        Self {
            lexical: s.into(),
            datatype: PrimitiveType::Date,
            lang: None,
        }
    }

    /// Build an IRI-typed value (used when comparing a variable against a
    /// named resource rather than a literal).
    pub fn iri(s: impl Into<SmolStr>) -> Self {
        Self {
            lexical: s.into(),
            datatype: PrimitiveType::Iri,
            lang: None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datatype {
            PrimitiveType::Iri => write!(f, "{}", self.lexical),
            PrimitiveType::String => write!(f, "\"{}\"", self.lexical),
            _ => write!(f, "\"{}\"^^xsd:{}", self.lexical, type_suffix(self.datatype)),
        }
    }
}

fn type_suffix(t: PrimitiveType) -> &'static str {
    match t {
        PrimitiveType::String => "string",
        PrimitiveType::Integer => "integer",
        PrimitiveType::Double => "double",
        PrimitiveType::Date => "date",
        PrimitiveType::Iri => "anyURI",
    }
}
