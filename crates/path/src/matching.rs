//! Name tests and attribute tests for individual segments.
use crate::ast::{CmpOp, Operand, Predicate, Segment};
use arbor_node::Attrs;
use serde_json::Value;
use std::cmp::Ordering;

impl Segment {
    /// Tests a node name against a step segment. Filters and `**` never match a name.
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == name,
            Segment::WildcardSingle => true,
            Segment::Glob(pattern) => glob_match(pattern, name),
            Segment::Regex(pattern) => pattern.regex.is_match(name),
            Segment::Fuzzy { name: target, threshold } => similarity(target, name) >= *threshold,
            _ => false,
        }
    }

    /// Tests a node's attributes against a filter segment. Steps never pass.
    pub fn matches_attrs(&self, attrs: &Attrs) -> bool {
        match self {
            Segment::AttrEquals { key, value, bare } => attrs.get(key).is_some_and(|actual| {
                values_equal(actual, value)
                    || bare
                        .as_deref()
                        .is_some_and(|text| actual.as_str() == Some(text))
            }),
            Segment::AttrExists(key) => attrs.contains_key(key),
            Segment::Predicate(predicate) => predicate.evaluate(attrs),
            _ => false,
        }
    }
}

impl Predicate {
    pub fn evaluate(&self, attrs: &Attrs) -> bool {
        match self {
            Predicate::Or(left, right) => left.evaluate(attrs) || right.evaluate(attrs),
            Predicate::And(left, right) => left.evaluate(attrs) && right.evaluate(attrs),
            Predicate::Compare { left, op, right } => {
                match (resolve(left, attrs), resolve(right, attrs)) {
                    (Some(l), Some(r)) => compare(*op, l, r),
                    _ => false,
                }
            }
            Predicate::Truthy(operand) => resolve(operand, attrs).is_some_and(is_truthy),
        }
    }
}

fn resolve<'v>(operand: &'v Operand, attrs: &'v Attrs) -> Option<&'v Value> {
    match operand {
        Operand::Attr(key) => attrs.get(key),
        Operand::Literal(value) => Some(value),
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> bool {
    match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        CmpOp::Lt => order(left, right) == Some(Ordering::Less),
        CmpOp::Le => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
        CmpOp::Gt => order(left, right) == Some(Ordering::Greater),
        CmpOp::Ge => matches!(order(left, right), Some(Ordering::Greater | Ordering::Equal)),
    }
}

/// JSON equality, except that numbers compare by numeric value (`1 == 1.0`).
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Glob matching where `*` stands for any run of characters.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    // Position of the last `*` seen and the name position it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len() && pattern[p] == name[n] {
            p += 1;
            n += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            n = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Normalized Levenshtein similarity in `[0, 1]`; `1.0` means identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
