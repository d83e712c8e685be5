//! Defines the Abstract Syntax Tree (AST) for compiled path expressions.
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// A compiled, immutable path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn new(source: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            source: source.into(),
            segments,
        }
    }

    /// The text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if every segment is a plain name.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One step or filter of a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A child with exactly this name.
    Literal(String),
    /// `*`: exactly one level, any name.
    WildcardSingle,
    /// `**`: zero or more levels.
    WildcardDeep,
    /// `prefix*`, `*suffix`, `a*b`: one level, name matched by glob.
    Glob(String),
    /// `~pattern`: one level, name matched by an anchored regex.
    Regex(RegexPattern),
    /// `%name:threshold`: one level, name similarity at least `threshold`.
    Fuzzy { name: String, threshold: f64 },
    /// `[key=value]` on the current node.
    AttrEquals {
        key: String,
        value: Value,
        /// The unquoted source text, also matched against string attributes.
        bare: Option<String>,
    },
    /// `[key]` on the current node.
    AttrExists(String),
    /// `[?(...)]` on the current node.
    Predicate(Predicate),
}

impl Segment {
    /// Steps consume one tree level; everything else stays on the current node.
    pub fn is_step(&self) -> bool {
        matches!(
            self,
            Segment::Literal(_)
                | Segment::WildcardSingle
                | Segment::Glob(_)
                | Segment::Regex(_)
                | Segment::Fuzzy { .. }
        )
    }

    pub fn is_filter(&self) -> bool {
        matches!(
            self,
            Segment::AttrEquals { .. } | Segment::AttrExists(_) | Segment::Predicate(_)
        )
    }
}

/// A regex segment. Compares by source pattern.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    pub source: String,
    pub regex: Regex,
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A boolean expression over a node's attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Or(Box<Predicate>, Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    /// A lone operand, true when present and truthy.
    Truthy(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `@.key`
    Attr(String),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}
