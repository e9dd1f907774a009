//! Line-oriented Turtle-subset loader.
//!
//! Accepts `@prefix name: <iri> .` declarations, `#`-comments, and
//! `subject predicate object .` triple lines. Blank-node property lists and
//! collections are not supported; a blank node may only appear as a bare
//! `_:label` term.

use regex_lite::Regex;
use std::sync::OnceLock;

use graphguard_core::ids::{BlankNode, LiteralValue, PrimitiveType};
use graphguard_core::NodeId;

use crate::error::{RdfError, RdfResult};

/// One parsed Turtle-subset line, either a prefix declaration or a ground triple.
enum Line {
    Prefix(String, String),
    Triple(NodeId, NodeId, NodeId),
}

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^"((?:[^"\\]|\\.)*)"(?:\^\^(\S+)|@([A-Za-z][A-Za-z0-9-]*))?$"#).unwrap()
    })
}

/// Parse a full Turtle-subset document into its triples.
///
/// `@prefix` declarations are accepted syntax but are not applied to term
/// text: a CURIE like `:alice` or `rdf:type` is carried through as that
/// literal string rather than expanded against the declared namespace IRI.
/// This matches the rest of the crate's convention of treating IRIs as
/// opaque CURIE strings (policy entries and SPARQL query text are plain
/// strings with no namespace context of their own), so a CURIE means the
/// same thing wherever it's written.
pub fn parse_document(text: &str) -> RdfResult<Vec<graphguard_core::Triple>> {
    let mut triples = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line, line_no)? {
            Line::Prefix(_name, _iri) => {}
            Line::Triple(s, p, o) => {
                triples.push(graphguard_core::Triple::new(s, p, o));
            }
        }
    }
    Ok(triples)
}

fn parse_line(line: &str, line_no: usize) -> RdfResult<Line> {
    let body = line
        .strip_suffix('.')
        .ok_or_else(|| RdfError::parse(line_no, "line must end with '.'"))?
        .trim();

    if let Some(rest) = body.strip_prefix("@prefix") {
        let rest = rest.trim();
        let (name, rest) = rest
            .split_once(':')
            .ok_or_else(|| RdfError::parse(line_no, "malformed @prefix declaration"))?;
        let iri = rest
            .trim()
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| RdfError::parse(line_no, "@prefix iri must be wrapped in <>"))?;
        return Ok(Line::Prefix(name.trim().to_string(), iri.to_string()));
    }

    let tokens = tokenize(body, line_no)?;
    let [s, p, o]: [String; 3] = tokens
        .try_into()
        .map_err(|_| RdfError::parse(line_no, "expected exactly subject predicate object"))?;
    Ok(Line::Triple(
        raw_term(&s),
        raw_term(&p),
        raw_term(&o),
    ))
}

/// Turn one whitespace-delimited token into its `NodeId`: a bracketed
/// `<iri>`, a `_:label` blank node, a `"..."` literal, or a bare
/// `prefix:local`/plain-word CURIE carried through as IRI text untouched.
fn raw_term(tok: &str) -> NodeId {
    if let Some(inner) = tok.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return NodeId::iri(inner);
    }
    if let Some(label) = tok.strip_prefix("_:") {
        return NodeId::Blank(BlankNode(label.into()));
    }
    if let Some(caps) = literal_re().captures(tok) {
        let lexical = unescape(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        if let Some(dt) = caps.get(2) {
            return NodeId::Literal(literal_with_datatype(&lexical, dt.as_str()));
        }
        if let Some(lang) = caps.get(3) {
            return NodeId::Literal(LiteralValue {
                lexical: lexical.into(),
                datatype: PrimitiveType::String,
                lang: Some(lang.as_str().into()),
            });
        }
        return NodeId::Literal(LiteralValue::string(lexical));
    }
    // A bare prefixed name or plain IRI token; carried through as-is.
    NodeId::iri(tok)
}

fn literal_with_datatype(lexical: &str, datatype_tok: &str) -> LiteralValue {
    let suffix = datatype_tok.rsplit(':').next().unwrap_or(datatype_tok);
    let datatype = match suffix {
        "integer" | "int" | "long" => PrimitiveType::Integer,
        "double" | "float" | "decimal" => PrimitiveType::Double,
        "date" => PrimitiveType::Date,
        "anyURI" => PrimitiveType::Iri,
        _ => PrimitiveType::String,
    };
    LiteralValue {
        lexical: lexical.into(),
        datatype,
        lang: None,
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a `subject predicate object` body into its three whitespace
/// separated tokens, treating a `"..."` span (with possible `\"` escapes) as
/// a single token regardless of embedded spaces.
fn tokenize(body: &str, line_no: usize) -> RdfResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(RdfError::parse(line_no, "unterminated string literal"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_triples() {
        let doc = "@prefix : <http://ex.org/> .\n:alice :name \"Alice\" .\n";
        let triples = parse_document(doc).unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].subject, NodeId::iri(":alice"));
        assert_eq!(triples[0].predicate, NodeId::iri(":name"));
        assert_eq!(
            triples[0].object,
            NodeId::Literal(LiteralValue::string("Alice"))
        );
    }

    #[test]
    fn parses_typed_literal_and_absolute_iri() {
        let doc = "<http://ex.org/alice> <http://ex.org/age> \"30\"^^xsd:integer .\n";
        let triples = parse_document(doc).unwrap();
        assert_eq!(
            triples[0].object,
            NodeId::Literal(LiteralValue::integer(30))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let doc = "# a comment\n\n@prefix : <http://ex.org/> .\n:a :b :c .\n";
        let triples = parse_document(doc).unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn undeclared_prefix_expands_identically() {
        let doc = ":a rdf:type :c .\n";
        let triples = parse_document(doc).unwrap();
        assert_eq!(triples[0].subject, NodeId::iri(":a"));
        assert_eq!(triples[0].predicate, NodeId::iri("rdf:type"));
        assert_eq!(triples[0].object, NodeId::iri(":c"));
    }

    #[test]
    fn declared_prefix_does_not_rewrite_curie_text() {
        let doc = "@prefix ex: <http://ex.org/> .\nex:a ex:b ex:c .\n";
        let triples = parse_document(doc).unwrap();
        assert_eq!(triples[0].subject, NodeId::iri("ex:a"));
    }

    #[test]
    fn missing_trailing_dot_is_an_error() {
        let doc = "@prefix : <http://ex.org/> .\n:a :b :c\n";
        assert!(parse_document(doc).is_err());
    }
}
