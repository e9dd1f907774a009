//! Minimal SPARQL SELECT reader/writer.
//!
//! Covers exactly the subset the rewriter operates on: a basic graph
//! pattern, `FILTER`/`FILTER NOT EXISTS`, projection (`SELECT` or
//! `SELECT DISTINCT`), and the optional `GROUP BY` / `HAVING` / `ORDER BY` /
//! `LIMIT` / `OFFSET` solution modifiers. Property paths, `OPTIONAL`,
//! `UNION`, and named graphs are out of scope.

use graphguard_core::expr::{Expression, NodeValue};
use graphguard_core::ids::{LiteralValue, PrimitiveType};
use graphguard_core::{Iri, NodeId, OrderBy, Projected, Query, SortOrder, Triple, Var};

use crate::error::{RdfError, RdfResult};

/// A parsed SELECT query together with the `PREFIX` declarations it was
/// written with, so [`write_select`] can reproduce the same mapping.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// `(name, iri)` pairs in declaration order.
    pub prefixes: Vec<(String, String)>,
    /// The parsed query.
    pub query: Query,
}

/// Parse a SPARQL SELECT query.
pub fn parse_select(text: &str) -> RdfResult<ParsedQuery> {
    let tokens = lex(text)?;
    let mut p = Parser { tokens: &tokens, pos: 0 };
    p.parse_query()
}

/// Serialize a query back into SPARQL SELECT text, using the given prefix
/// declarations verbatim.
pub fn write_select(prefixes: &[(String, String)], query: &Query) -> String {
    let mut out = String::new();
    for (name, iri) in prefixes {
        out.push_str(&format!("PREFIX {name}: <{iri}>\n"));
    }
    out.push_str("SELECT ");
    if query.distinct {
        out.push_str("DISTINCT ");
    }
    if query.projection.is_empty() {
        out.push('*');
    } else {
        let cols: Vec<String> = query
            .projection
            .iter()
            .map(|p| match &p.expr {
                None => format!("?{}", p.var.as_str()),
                Some(e) => format!("({} AS ?{})", write_expr(e), p.var.as_str()),
            })
            .collect();
        out.push_str(&cols.join(" "));
    }
    out.push_str(" WHERE {\n");
    for t in &query.pattern {
        out.push_str(&format!(
            "  {} {} {} .\n",
            write_node(&t.subject),
            write_node(&t.predicate),
            write_node(&t.object)
        ));
    }
    for f in &query.filters {
        out.push_str(&format!("  FILTER {}\n", write_filter_expr(&f.0)));
    }
    out.push('}');

    if let Some(group) = &query.group_by {
        let vars: Vec<String> = group.iter().map(|v| format!("?{}", v.as_str())).collect();
        out.push_str(&format!("\nGROUP BY {}", vars.join(" ")));
    }
    if let Some(having) = &query.having {
        out.push_str(&format!("\nHAVING ({})", write_expr(having)));
    }
    if !query.order_by.is_empty() {
        let clauses: Vec<String> = query
            .order_by
            .iter()
            .map(|o| match o.order {
                SortOrder::Asc => format!("ASC(?{})", o.var.as_str()),
                SortOrder::Desc => format!("DESC(?{})", o.var.as_str()),
            })
            .collect();
        out.push_str(&format!("\nORDER BY {}", clauses.join(" ")));
    }
    if let Some(limit) = query.limit {
        out.push_str(&format!("\nLIMIT {limit}"));
    }
    if let Some(offset) = query.offset {
        out.push_str(&format!("\nOFFSET {offset}"));
    }
    out
}

/// Render a single triple pattern as `subject predicate object`, for
/// diagnostic output (e.g. the CLI's rewrite trace) rather than as part of a
/// full query.
pub fn write_triple(t: &Triple) -> String {
    format!("{} {} {}", write_node(&t.subject), write_node(&t.predicate), write_node(&t.object))
}

/// Render a single filter's expression, e.g. `(?v < 1000)`.
pub fn write_filter(f: &graphguard_core::Filter) -> String {
    write_filter_expr(&f.0)
}

fn write_node(n: &NodeId) -> String {
    match n {
        NodeId::Variable(v) => format!("?{}", v.as_str()),
        NodeId::Iri(i) => write_iri(i),
        NodeId::Blank(b) => format!("_:{}", b.0),
        NodeId::Literal(l) => write_literal(l),
    }
}

fn write_iri(i: &Iri) -> String {
    if i.as_str().contains("://") {
        format!("<{}>", i.as_str())
    } else {
        i.as_str().to_string()
    }
}

fn write_literal(l: &LiteralValue) -> String {
    match l.datatype {
        PrimitiveType::Iri => write_iri(&Iri::new(l.lexical.clone())),
        PrimitiveType::String => match &l.lang {
            Some(lang) => format!("\"{}\"@{}", l.lexical, lang),
            None => format!("\"{}\"", l.lexical),
        },
        PrimitiveType::Integer => format!("\"{}\"^^xsd:integer", l.lexical),
        PrimitiveType::Double => format!("\"{}\"^^xsd:double", l.lexical),
        PrimitiveType::Date => format!("\"{}\"^^xsd:date", l.lexical),
    }
}

fn write_value(v: &NodeValue) -> String {
    match v {
        NodeValue::VarRef(var) => format!("?{}", var.as_str()),
        NodeValue::Const(c) => write_literal(c),
    }
}

fn write_filter_expr(e: &Expression) -> String {
    format!("({})", write_expr(e))
}

fn write_expr(e: &Expression) -> String {
    match e {
        Expression::Eq(a, b) => format!("{} = {}", write_value(a), write_value(b)),
        Expression::Ne(a, b) => format!("{} != {}", write_value(a), write_value(b)),
        Expression::Lt(a, b) => format!("{} < {}", write_value(a), write_value(b)),
        Expression::Le(a, b) => format!("{} <= {}", write_value(a), write_value(b)),
        Expression::Gt(a, b) => format!("{} > {}", write_value(a), write_value(b)),
        Expression::Ge(a, b) => format!("{} >= {}", write_value(a), write_value(b)),
        Expression::In(v, cs) => format!(
            "{} IN ({})",
            write_value(v),
            cs.iter().map(write_literal).collect::<Vec<_>>().join(", ")
        ),
        Expression::NotIn(v, cs) => format!(
            "{} NOT IN ({})",
            write_value(v),
            cs.iter().map(write_literal).collect::<Vec<_>>().join(", ")
        ),
        Expression::And(es) => es
            .iter()
            .map(|e| format!("({})", write_expr(e)))
            .collect::<Vec<_>>()
            .join(" && "),
        Expression::Or(es) => es
            .iter()
            .map(|e| format!("({})", write_expr(e)))
            .collect::<Vec<_>>()
            .join(" || "),
        Expression::Not(inner) => format!("!({})", write_expr(inner)),
        Expression::NotExists(t) => format!(
            "NOT EXISTS {{ {} {} {} }}",
            write_node(&t.subject),
            write_node(&t.predicate),
            write_node(&t.object)
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Var(String),
    Iri(String),
    Literal(LiteralValue),
    Symbol(char),
    Op(String),
}

fn lex(text: &str) -> RdfResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '?' => {
                chars.next();
                let name = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_');
                tokens.push(Token::Var(name));
            }
            '<' => {
                // Disambiguate the `<iri>` bracket from the `<`/`<=` operators:
                // a bracketed IRI never has whitespace right after the `<`.
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Op("<=".to_string()));
                } else if chars.peek().map(|c| c.is_whitespace()).unwrap_or(true) {
                    tokens.push(Token::Op("<".to_string()));
                } else {
                    let iri = take_while(&mut chars, |c| c != '>');
                    chars.next().ok_or_else(|| RdfError::parse(line, "unterminated <iri>"))?;
                    tokens.push(Token::Iri(iri));
                }
            }
            '"' => {
                chars.next();
                let mut lexical = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                lexical.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                            }
                        }
                        Some(c) => lexical.push(c),
                        None => return Err(RdfError::parse(line, "unterminated string literal")),
                    }
                }
                if chars.peek() == Some(&'^') {
                    chars.next();
                    chars.next(); // second '^'
                    let dt = take_while(&mut chars, |c| c.is_alphanumeric() || c == ':' || c == '_');
                    tokens.push(Token::Literal(datatype_literal(&lexical, &dt)));
                } else if chars.peek() == Some(&'@') {
                    chars.next();
                    let lang = take_while(&mut chars, |c| c.is_alphanumeric() || c == '-');
                    tokens.push(Token::Literal(LiteralValue {
                        lexical: lexical.into(),
                        datatype: PrimitiveType::String,
                        lang: Some(lang.into()),
                    }));
                } else {
                    tokens.push(Token::Literal(LiteralValue::string(lexical)));
                }
            }
            '{' | '}' | '(' | ')' | '.' | ',' | ';' | '*' => {
                tokens.push(Token::Symbol(c));
                chars.next();
            }
            '=' | '!' | '>' | '&' | '|' => {
                let mut op = String::new();
                op.push(c);
                chars.next();
                if let Some(&next) = chars.peek() {
                    if (c == '!' || c == '>') && next == '=' {
                        op.push(next);
                        chars.next();
                    } else if (c == '&' || c == '|') && next == c {
                        op.push(next);
                        chars.next();
                    }
                }
                tokens.push(Token::Op(op));
            }
            _ if c.is_alphabetic() || c == '_' || c == ':' => {
                let word = take_while(&mut chars, |c| {
                    c.is_alphanumeric() || c == '_' || c == ':' || c == '-'
                });
                tokens.push(Token::Ident(word));
            }
            c if c.is_ascii_digit() => {
                let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                tokens.push(Token::Ident(digits));
            }
            other => {
                return Err(RdfError::parse(line, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

fn take_while(chars: &mut std::iter::Peekable<std::str::Chars>, pred: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if pred(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn datatype_literal(lexical: &str, dt: &str) -> LiteralValue {
    let suffix = dt.rsplit(':').next().unwrap_or(dt);
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

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> RdfResult<&Token> {
        let t = self.tokens.get(self.pos).ok_or_else(|| RdfError::parse(0, "unexpected end of input"))?;
        self.pos += 1;
        Ok(t)
    }

    fn expect_ident(&mut self, word: &str) -> RdfResult<()> {
        match self.next()? {
            Token::Ident(s) if s.eq_ignore_ascii_case(word) => Ok(()),
            other => Err(RdfError::parse(0, format!("expected `{word}`, found {other:?}"))),
        }
    }

    fn expect_symbol(&mut self, c: char) -> RdfResult<()> {
        match self.next()? {
            Token::Symbol(s) if *s == c => Ok(()),
            other => Err(RdfError::parse(0, format!("expected `{c}`, found {other:?}"))),
        }
    }

    fn peek_is_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s.eq_ignore_ascii_case(word))
    }

    fn peek_is_symbol(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == c)
    }

    fn parse_query(&mut self) -> RdfResult<ParsedQuery> {
        let mut prefixes = Vec::new();
        while self.peek_is_ident("PREFIX") {
            self.next()?;
            let name = match self.next()? {
                Token::Ident(s) => s.trim_end_matches(':').to_string(),
                other => return Err(RdfError::parse(0, format!("expected prefix name, found {other:?}"))),
            };
            let iri = match self.next()? {
                Token::Iri(s) => s.clone(),
                other => return Err(RdfError::parse(0, format!("expected <iri>, found {other:?}"))),
            };
            prefixes.push((name, iri));
        }

        self.expect_ident("SELECT")?;
        let distinct = if self.peek_is_ident("DISTINCT") {
            self.next()?;
            true
        } else {
            false
        };

        let mut projection = Vec::new();
        if self.peek_is_symbol('*') {
            self.next()?;
        } else {
            loop {
                match self.peek() {
                    Some(Token::Var(_)) => {
                        let v = self.parse_var()?;
                        projection.push(Projected::plain(v));
                    }
                    Some(Token::Symbol('(')) => {
                        self.next()?;
                        let expr = self.parse_expr()?;
                        self.expect_ident("AS")?;
                        let v = self.parse_var()?;
                        self.expect_symbol(')')?;
                        projection.push(Projected { var: v, expr: Some(expr) });
                    }
                    _ => break,
                }
            }
        }

        self.expect_ident("WHERE")?;
        self.expect_symbol('{')?;
        let mut pattern = Vec::new();
        let mut filters = Vec::new();
        while !self.peek_is_symbol('}') {
            if self.peek_is_ident("FILTER") {
                self.next()?;
                if self.peek_is_ident("NOT") {
                    self.next()?;
                    self.expect_ident("EXISTS")?;
                    self.expect_symbol('{')?;
                    let t = self.parse_triple()?;
                    self.expect_symbol('}')?;
                    filters.push(graphguard_core::Filter::new(Expression::NotExists(t)));
                } else {
                    self.expect_symbol('(')?;
                    let e = self.parse_expr()?;
                    self.expect_symbol(')')?;
                    filters.push(graphguard_core::Filter::new(e));
                }
            } else {
                let t = self.parse_triple()?;
                self.expect_symbol('.')?;
                pattern.push(t);
            }
        }
        self.expect_symbol('}')?;

        let mut group_by = None;
        if self.peek_is_ident("GROUP") {
            self.next()?;
            self.expect_ident("BY")?;
            let mut vars = Vec::new();
            while matches!(self.peek(), Some(Token::Var(_))) {
                vars.push(self.parse_var()?);
            }
            group_by = Some(vars);
        }

        let mut having = None;
        if self.peek_is_ident("HAVING") {
            self.next()?;
            self.expect_symbol('(')?;
            having = Some(self.parse_expr()?);
            self.expect_symbol(')')?;
        }

        let mut order_by = Vec::new();
        if self.peek_is_ident("ORDER") {
            self.next()?;
            self.expect_ident("BY")?;
            while let Some(Token::Ident(kw)) = self.peek() {
                let order = if kw.eq_ignore_ascii_case("ASC") {
                    SortOrder::Asc
                } else if kw.eq_ignore_ascii_case("DESC") {
                    SortOrder::Desc
                } else {
                    break;
                };
                self.next()?;
                self.expect_symbol('(')?;
                let var = self.parse_var()?;
                self.expect_symbol(')')?;
                order_by.push(OrderBy { var, order });
            }
        }

        let mut limit = None;
        if self.peek_is_ident("LIMIT") {
            self.next()?;
            limit = Some(self.parse_number()?);
        }
        let mut offset = None;
        if self.peek_is_ident("OFFSET") {
            self.next()?;
            offset = Some(self.parse_number()?);
        }

        Ok(ParsedQuery {
            prefixes,
            query: Query {
                projection,
                distinct,
                pattern,
                filters,
                group_by,
                having,
                order_by,
                limit,
                offset,
            },
        })
    }

    fn parse_number(&mut self) -> RdfResult<u64> {
        match self.next()? {
            Token::Ident(s) => s.parse().map_err(|_| RdfError::parse(0, "expected integer")),
            other => Err(RdfError::parse(0, format!("expected integer, found {other:?}"))),
        }
    }

    fn parse_var(&mut self) -> RdfResult<Var> {
        match self.next()? {
            Token::Var(name) => Ok(Var::new(name.clone())),
            other => Err(RdfError::parse(0, format!("expected variable, found {other:?}"))),
        }
    }

    fn parse_node(&mut self) -> RdfResult<NodeId> {
        match self.next()? {
            Token::Var(name) => Ok(NodeId::var(name.clone())),
            Token::Iri(iri) => Ok(NodeId::iri(iri.clone())),
            Token::Ident(word) => {
                if let Some(label) = word.strip_prefix("_:") {
                    Ok(NodeId::Blank(graphguard_core::BlankNode(label.into())))
                } else {
                    Ok(NodeId::iri(word.clone()))
                }
            }
            Token::Literal(lit) => Ok(NodeId::Literal(lit.clone())),
            other => Err(RdfError::parse(0, format!("expected a triple term, found {other:?}"))),
        }
    }

    fn parse_triple(&mut self) -> RdfResult<Triple> {
        let s = self.parse_node()?;
        let p = self.parse_node()?;
        let o = self.parse_node()?;
        Ok(Triple::new(s, p, o))
    }

    fn parse_value(&mut self) -> RdfResult<NodeValue> {
        match self.next()? {
            Token::Var(name) => Ok(NodeValue::VarRef(Var::new(name.clone()))),
            Token::Literal(lit) => Ok(NodeValue::Const(lit.clone())),
            Token::Iri(iri) => Ok(NodeValue::Const(LiteralValue::iri(iri.clone()))),
            Token::Ident(word) => Ok(NodeValue::Const(LiteralValue::iri(word.clone()))),
            other => Err(RdfError::parse(0, format!("expected a value, found {other:?}"))),
        }
    }

    fn parse_literal_list(&mut self) -> RdfResult<Vec<LiteralValue>> {
        self.expect_symbol('(')?;
        let mut out = Vec::new();
        if !self.peek_is_symbol(')') {
            loop {
                match self.next()? {
                    Token::Literal(l) => out.push(l.clone()),
                    Token::Iri(iri) => out.push(LiteralValue::iri(iri.clone())),
                    Token::Ident(word) => out.push(LiteralValue::iri(word.clone())),
                    other => return Err(RdfError::parse(0, format!("expected a literal, found {other:?}"))),
                }
                if self.peek_is_symbol(',') {
                    self.next()?;
                } else {
                    break;
                }
            }
        }
        self.expect_symbol(')')?;
        Ok(out)
    }

    /// `expr := and_expr (|| and_expr)*`
    fn parse_expr(&mut self) -> RdfResult<Expression> {
        let mut terms = vec![self.parse_and_expr()?];
        while matches!(self.peek(), Some(Token::Op(op)) if op == "||") {
            self.next()?;
            terms.push(self.parse_and_expr()?);
        }
        Ok(if terms.len() == 1 {
            terms.pop().unwrap()
        } else {
            Expression::Or(terms)
        })
    }

    /// `and_expr := unary (&& unary)*`
    fn parse_and_expr(&mut self) -> RdfResult<Expression> {
        let mut terms = vec![self.parse_unary()?];
        while matches!(self.peek(), Some(Token::Op(op)) if op == "&&") {
            self.next()?;
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.pop().unwrap()
        } else {
            Expression::And(terms)
        })
    }

    fn parse_unary(&mut self) -> RdfResult<Expression> {
        if matches!(self.peek(), Some(Token::Op(op)) if op == "!") {
            self.next()?;
            return Ok(Expression::Not(Box::new(self.parse_unary()?)));
        }
        if self.peek_is_ident("NOT") {
            self.next()?;
            self.expect_ident("EXISTS")?;
            self.expect_symbol('{')?;
            let t = self.parse_triple()?;
            self.expect_symbol('}')?;
            return Ok(Expression::NotExists(t));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> RdfResult<Expression> {
        if self.peek_is_symbol('(') {
            self.next()?;
            let e = self.parse_expr()?;
            self.expect_symbol(')')?;
            return Ok(e);
        }
        let lhs = self.parse_value()?;
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = op.clone();
                self.next()?;
                let rhs = self.parse_value()?;
                match op.as_str() {
                    "=" => Ok(Expression::Eq(lhs, rhs)),
                    "!=" => Ok(Expression::Ne(lhs, rhs)),
                    "<" => Ok(Expression::Lt(lhs, rhs)),
                    "<=" => Ok(Expression::Le(lhs, rhs)),
                    ">" => Ok(Expression::Gt(lhs, rhs)),
                    ">=" => Ok(Expression::Ge(lhs, rhs)),
                    other => Err(RdfError::parse(0, format!("unknown operator `{other}`"))),
                }
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("IN") => {
                self.next()?;
                let values = self.parse_literal_list()?;
                Ok(Expression::In(lhs, values))
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("NOT") => {
                self.next()?;
                self.expect_ident("IN")?;
                let values = self.parse_literal_list()?;
                Ok(Expression::NotIn(lhs, values))
            }
            other => Err(RdfError::parse(0, format!("expected comparison operator, found {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_select() {
        let text = "SELECT ?x ?n WHERE { ?x :name ?n . }";
        let parsed = parse_select(text).unwrap();
        assert_eq!(parsed.query.projection.len(), 2);
        assert_eq!(parsed.query.pattern.len(), 1);
    }

    #[test]
    fn parses_filter_not_exists() {
        let text = "SELECT ?x WHERE { ?x :name ?n . FILTER NOT EXISTS { ?x rdf:type :Doctor } }";
        let parsed = parse_select(text).unwrap();
        assert_eq!(parsed.query.filters.len(), 1);
        assert!(parsed.query.filters[0].0.is_not_exists());
    }

    #[test]
    fn parses_filter_comparison_and_solution_modifiers() {
        let text = "SELECT DISTINCT ?x WHERE { ?x :hasSalary ?v . FILTER (?v < \"1000\"^^xsd:integer) } ORDER BY ASC(?x) LIMIT 10 OFFSET 5";
        let parsed = parse_select(text).unwrap();
        assert!(parsed.query.distinct);
        assert_eq!(parsed.query.limit, Some(10));
        assert_eq!(parsed.query.offset, Some(5));
        assert_eq!(parsed.query.order_by.len(), 1);
    }

    #[test]
    fn round_trips_through_writer() {
        let text = "SELECT ?x WHERE { ?x :name ?n . FILTER NOT EXISTS { ?x rdf:type :Doctor } }";
        let parsed = parse_select(text).unwrap();
        let written = write_select(&parsed.prefixes, &parsed.query);
        let reparsed = parse_select(&written).unwrap();
        pretty_assertions::assert_eq!(reparsed.query, parsed.query);
    }

    #[test]
    fn writer_preserves_prefix_declarations() {
        let text = "PREFIX : <http://ex.org/>\nSELECT ?x WHERE { ?x :hasSalary ?v . }";
        let parsed = parse_select(text).unwrap();
        let written = write_select(&parsed.prefixes, &parsed.query);
        assert!(written.starts_with("PREFIX : <http://ex.org/>\n"));
    }
}
