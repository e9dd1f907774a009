//! The Filter Algebra: pairwise combination of simple single-variable
//! comparison filters into a single narrowed filter, or a contradiction.
//!
//! `combine` left-folds a list of filters already known to share exactly one
//! free variable. Each step either produces a tighter single comparison, a
//! verbatim conjunction (when no tighter single form exists), or `⊥`.

use crate::expr::{compare, values_equal, Expression, NodeValue, Ordering3};
use crate::ids::LiteralValue;
use crate::model::Filter;

/// Outcome of folding an entire group of same-variable filters.
#[derive(Debug, Clone, PartialEq)]
pub enum CombineOutcome {
    /// The group folded (possibly into a compound `And`) into one filter.
    Merged(Filter),
    /// The group is jointly unsatisfiable (⊥); the caller drops the group
    /// and every triple whose object is the shared variable.
    Contradiction,
}

/// Outcome of combining exactly two filters already known to be simple.
enum PairOutcome {
    Contradiction,
    Reduced(Expression),
    /// No tighter single-operator form exists; caller conjoins verbatim.
    Unreduced,
}

/// Classify a simple comparison expression by its operator and operand(s),
/// borrowing the constant side(s) for evaluation.
enum Kind<'a> {
    Eq(&'a LiteralValue),
    Ne(&'a LiteralValue),
    Lt(&'a LiteralValue),
    Le(&'a LiteralValue),
    Gt(&'a LiteralValue),
    Ge(&'a LiteralValue),
    In(&'a [LiteralValue]),
    NotIn(&'a [LiteralValue]),
}

fn kind_of(e: &Expression) -> Option<Kind<'_>> {
    match e {
        Expression::Eq(_, NodeValue::Const(c)) => Some(Kind::Eq(c)),
        Expression::Ne(_, NodeValue::Const(c)) => Some(Kind::Ne(c)),
        Expression::Lt(_, NodeValue::Const(c)) => Some(Kind::Lt(c)),
        Expression::Le(_, NodeValue::Const(c)) => Some(Kind::Le(c)),
        Expression::Gt(_, NodeValue::Const(c)) => Some(Kind::Gt(c)),
        Expression::Ge(_, NodeValue::Const(c)) => Some(Kind::Ge(c)),
        Expression::In(_, set) => Some(Kind::In(set)),
        Expression::NotIn(_, set) => Some(Kind::NotIn(set)),
        _ => None,
    }
}

fn varref_of(e: &Expression) -> NodeValue {
    match e {
        Expression::Eq(v, _)
        | Expression::Ne(v, _)
        | Expression::Lt(v, _)
        | Expression::Le(v, _)
        | Expression::Gt(v, _)
        | Expression::Ge(v, _)
        | Expression::In(v, _)
        | Expression::NotIn(v, _) => v.clone(),
        _ => unreachable!("varref_of called on a non-simple expression"),
    }
}

/// `true` iff the concrete value `x` satisfies the constraint `k`.
fn evaluate(k: &Kind<'_>, x: &LiteralValue) -> bool {
    match k {
        Kind::Eq(c) => values_equal(x, c),
        Kind::Ne(c) => !values_equal(x, c),
        Kind::Lt(c) => matches!(compare(x, c), Ordering3::Less),
        Kind::Le(c) => matches!(compare(x, c), Ordering3::Less | Ordering3::Equal),
        Kind::Gt(c) => matches!(compare(x, c), Ordering3::Greater),
        Kind::Ge(c) => matches!(compare(x, c), Ordering3::Greater | Ordering3::Equal),
        Kind::In(set) => set.iter().any(|c| values_equal(x, c)),
        Kind::NotIn(set) => !set.iter().any(|c| values_equal(x, c)),
    }
}

fn dedup(mut values: Vec<LiteralValue>) -> Vec<LiteralValue> {
    let mut out: Vec<LiteralValue> = Vec::with_capacity(values.len());
    for v in values.drain(..) {
        if !out.iter().any(|existing| values_equal(existing, &v)) {
            out.push(v);
        }
    }
    out
}

fn eq_expr(v: NodeValue, c: &LiteralValue) -> Expression {
    Expression::Eq(v, NodeValue::Const(c.clone()))
}

fn ne_expr(v: NodeValue, c: &LiteralValue) -> Expression {
    Expression::Ne(v, NodeValue::Const(c.clone()))
}

/// Build an `In`/`NotIn` expression from a set, collapsing a singleton to
/// `Eq`/`Ne` and signalling contradiction/tautology for the empty case via
/// the caller (an empty `In` set is checked before this is invoked).
fn in_expr(v: NodeValue, set: Vec<LiteralValue>) -> Expression {
    let set = dedup(set);
    if set.len() == 1 {
        Expression::Eq(v, NodeValue::Const(set.into_iter().next().unwrap()))
    } else {
        Expression::In(v, set)
    }
}

fn notin_expr(v: NodeValue, set: Vec<LiteralValue>) -> Expression {
    let set = dedup(set);
    if set.len() == 1 {
        Expression::Ne(v, NodeValue::Const(set.into_iter().next().unwrap()))
    } else {
        Expression::NotIn(v, set)
    }
}

/// A one-sided order bound extracted from `Lt`/`Le`/`Gt`/`Ge`.
struct Bound<'a> {
    lower: bool,
    inclusive: bool,
    val: &'a LiteralValue,
}

fn as_bound<'a>(k: &Kind<'a>) -> Option<Bound<'a>> {
    match k {
        Kind::Lt(c) => Some(Bound { lower: false, inclusive: false, val: c }),
        Kind::Le(c) => Some(Bound { lower: false, inclusive: true, val: c }),
        Kind::Gt(c) => Some(Bound { lower: true, inclusive: false, val: c }),
        Kind::Ge(c) => Some(Bound { lower: true, inclusive: true, val: c }),
        _ => None,
    }
}

fn bound_expr(v: NodeValue, b: &Bound<'_>) -> Expression {
    match (b.lower, b.inclusive) {
        (true, true) => Expression::Ge(v, NodeValue::Const(b.val.clone())),
        (true, false) => Expression::Gt(v, NodeValue::Const(b.val.clone())),
        (false, true) => Expression::Le(v, NodeValue::Const(b.val.clone())),
        (false, false) => Expression::Lt(v, NodeValue::Const(b.val.clone())),
    }
}

/// Combine two same-direction bounds into the tighter of the two.
fn combine_same_direction(v: NodeValue, a: Bound<'_>, b: Bound<'_>) -> Expression {
    let c = compare(a.val, b.val);
    let tighter = match (a.lower, c) {
        (true, Ordering3::Greater) => a,
        (true, Ordering3::Less) => b,
        (false, Ordering3::Less) => a,
        (false, Ordering3::Greater) => b,
        // Equal value: the exclusive bound is strictly tighter.
        (_, Ordering3::Equal) => if !a.inclusive { a } else { b },
        // Incomparable (shouldn't arise for well-typed order bounds); keep `a`.
        (_, Ordering3::Incomparable) => a,
    };
    bound_expr(v, &tighter)
}

/// Combine a lower bound with an upper bound: feasibility check, possible
/// collapse to a point `Eq`, or left as an irreducible (but valid) range.
fn combine_cross_direction(v: NodeValue, lo: Bound<'_>, hi: Bound<'_>) -> PairOutcome {
    match compare(lo.val, hi.val) {
        Ordering3::Greater => PairOutcome::Contradiction,
        Ordering3::Equal => {
            if lo.inclusive && hi.inclusive {
                PairOutcome::Reduced(eq_expr(v, lo.val))
            } else {
                PairOutcome::Contradiction
            }
        }
        Ordering3::Less => PairOutcome::Unreduced,
        Ordering3::Incomparable => PairOutcome::Unreduced,
    }
}

/// Combine two single-variable comparisons against the same variable into
/// one tighter comparison, or detect that together they admit no value.
///
/// Dispatches on the pair of operator kinds (`=`, `≠`, `<`, `≤`, `>`, `≥`,
/// `∈`, `∉`); every unordered pair from that set is handled explicitly:
/// - `Eq` with anything: evaluate the other side against the equality
///   constant — `Reduced(Eq)` if it's admitted, `Contradiction` otherwise.
/// - `Ne`/`Ne`: same excluded value collapses to one `Ne`; different values
///   collapse to `NotIn` of both.
/// - `In`/`In`: intersect the sets.
/// - `NotIn`/`NotIn`: union the sets.
/// - `Ne`/`In` or `Ne`/`NotIn`: drop (or add) the `Ne` value from the set.
/// - `In`/`NotIn`: subtract the excluded set from the admitted one.
/// - `Ne`/order-bound: collapses only when the excluded value sits exactly
///   on an inclusive bound edge, tightening it to exclusive.
/// - `In`/order-bound: filter the set down to values the bound admits.
/// - two order-bounds: same direction merges to the tighter bound; opposite
///   directions either merge into a closed `Between` or fall through.
/// Any pair not covered above (e.g. two incomparable open bounds) is
/// `Unreduced`, left for the caller to conjoin verbatim.
fn combine_pair(a: &Expression, b: &Expression) -> PairOutcome {
    let (ka, kb) = match (kind_of(a), kind_of(b)) {
        (Some(x), Some(y)) => (x, y),
        _ => return PairOutcome::Unreduced,
    };
    let v = varref_of(a);

    if let Kind::Eq(c) = &ka {
        return if evaluate(&kb, c) {
            PairOutcome::Reduced(eq_expr(v, c))
        } else {
            PairOutcome::Contradiction
        };
    }
    if let Kind::Eq(c) = &kb {
        return if evaluate(&ka, c) {
            PairOutcome::Reduced(eq_expr(v, c))
        } else {
            PairOutcome::Contradiction
        };
    }

    if let (Kind::Ne(x), Kind::Ne(y)) = (&ka, &kb) {
        return if values_equal(x, y) {
            PairOutcome::Reduced(ne_expr(v, x))
        } else {
            PairOutcome::Reduced(notin_expr(v, vec![(*x).clone(), (*y).clone()]))
        };
    }

    if let (Kind::In(s1), Kind::In(s2)) = (&ka, &kb) {
        let merged: Vec<LiteralValue> = s1
            .iter()
            .filter(|x| s2.iter().any(|y| values_equal(x, y)))
            .cloned()
            .collect();
        return if merged.is_empty() {
            PairOutcome::Contradiction
        } else {
            PairOutcome::Reduced(in_expr(v, merged))
        };
    }

    if let (Kind::NotIn(s1), Kind::NotIn(s2)) = (&ka, &kb) {
        let merged: Vec<LiteralValue> = s1.iter().chain(s2.iter()).cloned().collect();
        return PairOutcome::Reduced(notin_expr(v, merged));
    }

    // Ne combined with In/NotIn.
    if let Some((x, set, from_in)) = match (&ka, &kb) {
        (Kind::Ne(x), Kind::In(set)) => Some((*x, *set, true)),
        (Kind::In(set), Kind::Ne(x)) => Some((*x, *set, true)),
        (Kind::Ne(x), Kind::NotIn(set)) => Some((*x, *set, false)),
        (Kind::NotIn(set), Kind::Ne(x)) => Some((*x, *set, false)),
        _ => None,
    } {
        return if from_in {
            let filtered: Vec<LiteralValue> = set
                .iter()
                .filter(|y| !values_equal(y, x))
                .cloned()
                .collect();
            if filtered.is_empty() {
                PairOutcome::Contradiction
            } else {
                PairOutcome::Reduced(in_expr(v, filtered))
            }
        } else {
            let mut merged: Vec<LiteralValue> = set.to_vec();
            merged.push(x.clone());
            PairOutcome::Reduced(notin_expr(v, merged))
        };
    }

    // In/NotIn.
    if let Some((set, ex)) = match (&ka, &kb) {
        (Kind::In(set), Kind::NotIn(ex)) => Some((*set, *ex)),
        (Kind::NotIn(ex), Kind::In(set)) => Some((*set, *ex)),
        _ => None,
    } {
        let filtered: Vec<LiteralValue> = set
            .iter()
            .filter(|x| !ex.iter().any(|y| values_equal(x, y)))
            .cloned()
            .collect();
        return if filtered.is_empty() {
            PairOutcome::Contradiction
        } else {
            PairOutcome::Reduced(in_expr(v, filtered))
        };
    }

    // Ne combined with an order bound: collapses when the bound's edge value
    // coincides with the excluded value.
    if let Some((x, bound, _)) = match (&ka, &kb) {
        (Kind::Ne(x), _) => as_bound(&kb).map(|bnd| (*x, bnd, true)),
        (_, Kind::Ne(x)) => as_bound(&ka).map(|bnd| (*x, bnd, false)),
        _ => None,
    } {
        if values_equal(x, bound.val) && bound.inclusive {
            let tightened = Bound { lower: bound.lower, inclusive: false, val: bound.val };
            return PairOutcome::Reduced(bound_expr(v, &tightened));
        }
        return PairOutcome::Unreduced;
    }

    // An order bound filtering a finite In set collapses to a (possibly
    // smaller) In/Eq; filtering a NotIn set has no closed single-op form.
    if let Some((set, bound)) = match (&ka, &kb) {
        (Kind::In(set), _) => as_bound(&kb).map(|bnd| (*set, bnd)),
        (_, Kind::In(set)) => as_bound(&ka).map(|bnd| (*set, bnd)),
        _ => None,
    } {
        let kind = if bound.lower && bound.inclusive {
            Kind::Ge(bound.val)
        } else if bound.lower {
            Kind::Gt(bound.val)
        } else if bound.inclusive {
            Kind::Le(bound.val)
        } else {
            Kind::Lt(bound.val)
        };
        let filtered: Vec<LiteralValue> = set
            .iter()
            .filter(|x| evaluate(&kind, x))
            .cloned()
            .collect();
        return if filtered.is_empty() {
            PairOutcome::Contradiction
        } else {
            PairOutcome::Reduced(in_expr(v, filtered))
        };
    }

    if let (Some(ba), Some(bb)) = (as_bound(&ka), as_bound(&kb)) {
        return if ba.lower == bb.lower {
            PairOutcome::Reduced(combine_same_direction(v, ba, bb))
        } else if ba.lower {
            combine_cross_direction(v, ba, bb)
        } else {
            combine_cross_direction(v, bb, ba)
        };
    }

    PairOutcome::Unreduced
}

fn is_compound(e: &Expression) -> bool {
    matches!(e, Expression::And(_) | Expression::Or(_) | Expression::Not(_))
}

fn append_and(acc: Expression, next: Expression) -> Expression {
    match acc {
        Expression::And(mut parts) => {
            parts.push(next);
            Expression::And(parts)
        }
        other => Expression::And(vec![other, next]),
    }
}

/// Fold a non-empty group of filters sharing exactly one free variable,
/// left to right.
pub fn combine(group: &[Filter]) -> CombineOutcome {
    debug_assert!(!group.is_empty());
    let mut acc = group[0].0.clone();
    for next in &group[1..] {
        let nxt = next.0.clone();
        if is_compound(&acc) || is_compound(&nxt) {
            acc = append_and(acc, nxt);
            continue;
        }
        match combine_pair(&acc, &nxt) {
            PairOutcome::Contradiction => return CombineOutcome::Contradiction,
            PairOutcome::Reduced(e) => acc = e,
            PairOutcome::Unreduced => acc = append_and(acc, nxt),
        }
    }
    CombineOutcome::Merged(Filter::new(acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Var;

    fn f(e: Expression) -> Filter {
        Filter::new(e)
    }

    fn v() -> NodeValue {
        NodeValue::VarRef(Var::new("v"))
    }

    #[test]
    fn eq_then_ge_within_range_keeps_eq() {
        let group = vec![
            f(Expression::Ge(v(), NodeValue::Const(LiteralValue::integer(10)))),
            f(Expression::Eq(v(), NodeValue::Const(LiteralValue::integer(20)))),
        ];
        match combine(&group) {
            CombineOutcome::Merged(m) => {
                assert_eq!(
                    m.0,
                    Expression::Eq(v(), NodeValue::Const(LiteralValue::integer(20)))
                );
            }
            CombineOutcome::Contradiction => panic!("expected merge"),
        }
    }

    #[test]
    fn gt_then_lt_disjoint_is_contradiction() {
        let group = vec![
            f(Expression::Gt(v(), NodeValue::Const(LiteralValue::integer(100)))),
            f(Expression::Lt(v(), NodeValue::Const(LiteralValue::integer(50)))),
        ];
        assert_eq!(combine(&group), CombineOutcome::Contradiction);
    }

    #[test]
    fn gt_then_lt_valid_range_stays_compound() {
        let group = vec![
            f(Expression::Gt(v(), NodeValue::Const(LiteralValue::integer(10)))),
            f(Expression::Lt(v(), NodeValue::Const(LiteralValue::integer(50)))),
        ];
        match combine(&group) {
            CombineOutcome::Merged(m) => assert!(matches!(m.0, Expression::And(_))),
            CombineOutcome::Contradiction => panic!("range is satisfiable"),
        }
    }

    #[test]
    fn eq_point_range_collapses() {
        let group = vec![
            f(Expression::Ge(v(), NodeValue::Const(LiteralValue::integer(5)))),
            f(Expression::Le(v(), NodeValue::Const(LiteralValue::integer(5)))),
        ];
        match combine(&group) {
            CombineOutcome::Merged(m) => assert_eq!(
                m.0,
                Expression::Eq(v(), NodeValue::Const(LiteralValue::integer(5)))
            ),
            CombineOutcome::Contradiction => panic!("expected a point range"),
        }
    }

    #[test]
    fn ne_ne_merges_into_notin() {
        let group = vec![
            f(Expression::Ne(v(), NodeValue::Const(LiteralValue::string("a")))),
            f(Expression::Ne(v(), NodeValue::Const(LiteralValue::string("b")))),
        ];
        match combine(&group) {
            CombineOutcome::Merged(m) => assert!(matches!(m.0, Expression::NotIn(_, _))),
            CombineOutcome::Contradiction => panic!("expected NotIn merge"),
        }
    }

    #[test]
    fn in_singleton_collapses_to_eq() {
        let group = vec![
            f(Expression::In(
                v(),
                vec![LiteralValue::integer(1), LiteralValue::integer(2)],
            )),
            f(Expression::Eq(v(), NodeValue::Const(LiteralValue::integer(2)))),
        ];
        match combine(&group) {
            CombineOutcome::Merged(m) => assert_eq!(
                m.0,
                Expression::Eq(v(), NodeValue::Const(LiteralValue::integer(2)))
            ),
            CombineOutcome::Contradiction => panic!("2 is in the set"),
        }
    }

    /// `true` iff the integer `x` satisfies a simple comparison expression,
    /// used by the property test below to check closure independently of
    /// `combine`'s own internal `evaluate`.
    fn eval_simple(e: &Expression, x: i64) -> bool {
        let c = |v: &NodeValue| match v {
            NodeValue::Const(l) => l.lexical.parse::<i64>().unwrap(),
            NodeValue::VarRef(_) => unreachable!(),
        };
        match e {
            Expression::Eq(_, b) => x == c(b),
            Expression::Ne(_, b) => x != c(b),
            Expression::Lt(_, b) => x < c(b),
            Expression::Le(_, b) => x <= c(b),
            Expression::Gt(_, b) => x > c(b),
            Expression::Ge(_, b) => x >= c(b),
            Expression::In(_, set) => set.iter().any(|l| l.lexical.parse::<i64>().unwrap() == x),
            Expression::NotIn(_, set) => !set.iter().any(|l| l.lexical.parse::<i64>().unwrap() == x),
            Expression::And(parts) => parts.iter().all(|p| eval_simple(p, x)),
            _ => unreachable!("property domain only generates simple/And expressions"),
        }
    }

    fn arbitrary_simple_op() -> impl proptest::strategy::Strategy<Value = (u8, i64)> {
        use proptest::prelude::*;
        (0u8..8, -10i64..10)
    }

    fn build(kind: u8, c: i64, v: NodeValue) -> Expression {
        let lit = LiteralValue::integer(c);
        match kind {
            0 => Expression::Eq(v, NodeValue::Const(lit)),
            1 => Expression::Ne(v, NodeValue::Const(lit)),
            2 => Expression::Lt(v, NodeValue::Const(lit)),
            3 => Expression::Le(v, NodeValue::Const(lit)),
            4 => Expression::Gt(v, NodeValue::Const(lit)),
            5 => Expression::Ge(v, NodeValue::Const(lit)),
            6 => Expression::In(v, vec![lit, LiteralValue::integer(c + 1)]),
            _ => Expression::NotIn(v, vec![lit, LiteralValue::integer(c + 1)]),
        }
    }

    proptest::proptest! {
        /// P5: for every pair of simple operators over a small integer
        /// domain, `combine` is either a contradiction (empty intersection)
        /// or a filter whose solution set equals the pointwise conjunction.
        #[test]
        fn p5_filter_algebra_closure(
            (k1, c1) in arbitrary_simple_op(),
            (k2, c2) in arbitrary_simple_op(),
        ) {
            let e1 = build(k1, c1, v());
            let e2 = build(k2, c2, v());
            let group = vec![Filter::new(e1.clone()), Filter::new(e2.clone())];

            let domain: Vec<i64> = (-15..15).collect();
            let expected: Vec<i64> = domain
                .iter()
                .copied()
                .filter(|&x| eval_simple(&e1, x) && eval_simple(&e2, x))
                .collect();

            match combine(&group) {
                CombineOutcome::Contradiction => {
                    proptest::prop_assert!(expected.is_empty());
                }
                CombineOutcome::Merged(m) => {
                    let actual: Vec<i64> = domain
                        .iter()
                        .copied()
                        .filter(|&x| eval_simple(&m.0, x))
                        .collect();
                    proptest::prop_assert_eq!(actual, expected);
                }
            }
        }
    }
}
