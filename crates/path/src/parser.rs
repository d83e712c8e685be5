//! The path expression compiler.
//!
//! Splitting into segments is done by a small scanner (it has to track escapes,
//! bracket nesting and quotes); the bodies of `[...]` filters are parsed with `nom`.
use crate::ast::{CmpOp, Operand, PathExpr, Predicate, RegexPattern, Segment};
use crate::config::CompilerConfig;
use crate::error::PathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
};
use regex::Regex;
use serde_json::{Number, Value};

// --- Main Public Parser ---

/// Compiles `source` with the default configuration.
pub fn parse_path(source: &str) -> Result<PathExpr, PathError> {
    parse_path_with(source, &CompilerConfig::default())
}

pub fn parse_path_with(source: &str, config: &CompilerConfig) -> Result<PathExpr, PathError> {
    let mut segments = Vec::new();
    for raw in split_segments(source)? {
        raw.compile(source, config, &mut segments)?;
    }
    Ok(PathExpr::new(source, segments))
}

// --- Segment Scanner ---

struct RawSegment<'s> {
    start: usize,
    name: String,
    regex: bool,
    filters: Vec<&'s str>,
}

impl<'s> RawSegment<'s> {
    fn new(start: usize) -> Self {
        Self {
            start,
            name: String::new(),
            regex: false,
            filters: Vec::new(),
        }
    }

    fn is_blank(&self) -> bool {
        self.name.is_empty() && !self.regex && self.filters.is_empty()
    }

    /// True while scanning the integer part of a `%name:threshold`, where a
    /// dot followed by a digit is the decimal point rather than a separator.
    fn in_fuzzy_threshold(&self) -> bool {
        if self.regex || !self.name.starts_with('%') || !self.filters.is_empty() {
            return false;
        }
        self.name.rsplit_once(':').is_some_and(|(_, threshold)| {
            let digits = threshold.trim_start_matches(['-', '+']);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        })
    }

    fn push(&mut self, source: &str, c: char) -> Result<(), PathError> {
        if let Some(last) = self.filters.last() {
            return Err(PathError::invalid_filter(
                source,
                *last,
                format!("unexpected '{}' after filter", c),
            ));
        }
        self.name.push(c);
        Ok(())
    }

    fn compile(
        self,
        source: &str,
        config: &CompilerConfig,
        out: &mut Vec<Segment>,
    ) -> Result<(), PathError> {
        if self.name.is_empty() {
            return Err(PathError::empty_segment(source, self.start));
        }
        let head = if self.regex {
            compile_regex(source, &self.name)?
        } else {
            classify(source, self.start, &self.name, config)?
        };
        out.push(head);
        for filter in self.filters {
            out.push(parse_filter(source, filter)?);
        }
        Ok(())
    }
}

fn split_segments(source: &str) -> Result<Vec<RawSegment<'_>>, PathError> {
    let mut segments = Vec::new();
    let mut current = RawSegment::new(0);
    // Open character classes inside a regex segment, by position.
    let mut classes: Vec<usize> = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c == '~' && current.is_blank() {
            current.regex = true;
            continue;
        }
        match c {
            '\\' => {
                let escaped = chars.next().map(|(_, e)| e);
                match (escaped, current.regex) {
                    (Some(e @ ('.' | '\\')), false) => current.push(source, e)?,
                    // `\.` is how a regex gets its wildcard dot; a literal dot is `[.]`.
                    (Some('.'), true) => current.push(source, '.')?,
                    // Other escapes go through to the regex engine.
                    (Some(e), true) => {
                        current.push(source, '\\')?;
                        current.push(source, e)?;
                    }
                    _ => {
                        return Err(PathError::InvalidEscape {
                            expression: source.to_string(),
                            position: pos,
                        });
                    }
                }
            }
            '.' if !classes.is_empty() => current.push(source, c)?,
            '.' if current.in_fuzzy_threshold()
                && chars.peek().is_some_and(|&(_, next)| next.is_ascii_digit()) =>
            {
                current.push(source, c)?
            }
            '.' => {
                segments.push(std::mem::replace(&mut current, RawSegment::new(pos + 1)));
            }
            '[' if current.regex => {
                classes.push(pos);
                current.push(source, c)?;
            }
            ']' if current.regex && !classes.is_empty() => {
                classes.pop();
                current.push(source, c)?;
            }
            '[' => {
                let close = find_closing(source, pos)?;
                current.filters.push(&source[pos + 1..close]);
                while chars.next_if(|&(i, _)| i <= close).is_some() {}
            }
            ']' => return Err(PathError::unbalanced(source, pos, ']')),
            c => current.push(source, c)?,
        }
    }
    if let Some(&open) = classes.first() {
        return Err(PathError::unbalanced(source, open, '['));
    }
    segments.push(current);
    Ok(segments)
}

/// Finds the `]` matching the `[` at `open`, skipping quoted text.
fn find_closing(source: &str, open: usize) -> Result<usize, PathError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in source[open..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }
    Err(PathError::unbalanced(source, open, '['))
}

// --- Segment Classification ---

fn classify(
    source: &str,
    start: usize,
    name: &str,
    config: &CompilerConfig,
) -> Result<Segment, PathError> {
    if name == "*" {
        return Ok(Segment::WildcardSingle);
    }
    if name == "**" {
        return Ok(Segment::WildcardDeep);
    }
    if let Some(body) = name.strip_prefix('%') {
        return compile_fuzzy(source, start, body, config);
    }
    if name.contains('*') {
        return Ok(Segment::Glob(name.to_string()));
    }
    Ok(Segment::Literal(name.to_string()))
}

fn compile_fuzzy(
    source: &str,
    start: usize,
    body: &str,
    config: &CompilerConfig,
) -> Result<Segment, PathError> {
    let (name, threshold) = match body.rsplit_once(':') {
        Some((name, threshold)) => {
            let parsed = threshold
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or_else(|| PathError::FuzzyThreshold {
                    expression: source.to_string(),
                    threshold: threshold.to_string(),
                })?;
            (name, parsed)
        }
        None => (body, config.default_fuzzy_threshold),
    };
    if name.is_empty() {
        return Err(PathError::empty_segment(source, start));
    }
    Ok(Segment::Fuzzy {
        name: name.to_string(),
        threshold,
    })
}

fn compile_regex(source: &str, pattern: &str) -> Result<Segment, PathError> {
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| PathError::InvalidRegex {
        expression: source.to_string(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(Segment::Regex(RegexPattern {
        source: pattern.to_string(),
        regex,
    }))
}

// --- Filter Parsers ---

fn parse_filter(source: &str, filter: &str) -> Result<Segment, PathError> {
    let body = filter.trim();
    if body.starts_with('?') {
        return match predicate_filter(body) {
            Ok(("", predicate)) => Ok(Segment::Predicate(predicate)),
            Ok((rest, _)) => Err(PathError::invalid_filter(
                source,
                filter,
                format!("unexpected input '{}'", rest),
            )),
            Err(e) => Err(PathError::invalid_filter(source, filter, e.to_string())),
        };
    }
    match body.split_once('=') {
        Some((key, raw)) => {
            let key = key.trim();
            if key.is_empty() {
                return Err(PathError::invalid_filter(source, filter, "missing attribute name"));
            }
            let raw = raw.trim();
            let (value, bare) = attr_value(raw);
            Ok(Segment::AttrEquals {
                key: key.to_string(),
                value,
                bare,
            })
        }
        None if body.is_empty() => {
            Err(PathError::invalid_filter(source, filter, "empty filter"))
        }
        None => Ok(Segment::AttrExists(body.to_string())),
    }
}

/// Reads the right-hand side of `[key=value]`: a quoted string, a JSON scalar,
/// or bare text. Unquoted text is also returned for matching string attributes.
fn attr_value(raw: &str) -> (Value, Option<String>) {
    match literal(raw) {
        Ok(("", value)) if raw.starts_with(['\'', '"']) => (value, None),
        Ok(("", value)) => (value, Some(raw.to_string())),
        _ => (Value::String(raw.to_string()), None),
    }
}

fn predicate_filter(input: &str) -> IResult<&str, Predicate> {
    preceded(char('?'), delimited(ws(char('(')), or_expr, ws(char(')')))).parse(input)
}

fn or_expr(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(ws(tag("or")), and_expr)).parse(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, p| Predicate::Or(Box::new(acc), Box::new(p))),
    ))
}

fn and_expr(input: &str) -> IResult<&str, Predicate> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(preceded(ws(tag("and")), term)).parse(input)?;
    Ok((
        input,
        rest.into_iter()
            .fold(first, |acc, p| Predicate::And(Box::new(acc), Box::new(p))),
    ))
}

fn term(input: &str) -> IResult<&str, Predicate> {
    alt((
        delimited(ws(char('(')), or_expr, ws(char(')'))),
        comparison,
    ))
    .parse(input)
}

fn comparison(input: &str) -> IResult<&str, Predicate> {
    let (input, left) = ws(operand).parse(input)?;
    let (input, rest) = opt(pair(ws(cmp_op), ws(operand))).parse(input)?;
    let predicate = match rest {
        Some((op, right)) => Predicate::Compare { left, op, right },
        None => Predicate::Truthy(left),
    };
    Ok((input, predicate))
}

fn cmp_op(input: &str) -> IResult<&str, CmpOp> {
    alt((
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Gt, tag(">")),
        value(CmpOp::Lt, tag("<")),
    ))
    .parse(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((
        map(
            preceded(
                tag("@."),
                take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
            ),
            |key: &str| Operand::Attr(key.to_string()),
        ),
        map(literal, Operand::Literal),
    ))
    .parse(input)
}

// --- Literal Parsers ---

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        string_literal,
        number,
        value(Value::Null, tag("null")),
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
    ))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(
        alt((
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        )),
        |s: &str| Value::String(s.to_string()),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map(
        recognize((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
            opt((
                alt((char('e'), char('E'))),
                opt(alt((char('+'), char('-')))),
                digit1,
            )),
        )),
        number_value,
    )
    .parse(input)
}

fn number_value(text: &str) -> Value {
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segments(source: &str) -> Vec<Segment> {
        parse_path(source).unwrap().segments().to_vec()
    }

    #[test]
    fn test_literal_path() {
        assert_eq!(
            segments("app.config.debug"),
            vec![
                Segment::Literal("app".into()),
                Segment::Literal("config".into()),
                Segment::Literal("debug".into()),
            ]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            segments(r"app.v1\.2.back\\slash"),
            vec![
                Segment::Literal("app".into()),
                Segment::Literal("v1.2".into()),
                Segment::Literal(r"back\slash".into()),
            ]
        );
    }

    #[test]
    fn test_wildcards_and_globs() {
        assert_eq!(
            segments("app.*.**.conf*.*base"),
            vec![
                Segment::Literal("app".into()),
                Segment::WildcardSingle,
                Segment::WildcardDeep,
                Segment::Glob("conf*".into()),
                Segment::Glob("*base".into()),
            ]
        );
    }

    #[test]
    fn test_regex_segment_keeps_escapes_and_classes() {
        let segs = segments(r"app.~db\d+.~[a.c]x");
        match &segs[1] {
            Segment::Regex(p) => {
                assert_eq!(p.source, r"db\d+");
                assert!(p.regex.is_match("db12"));
                assert!(!p.regex.is_match("xdb12"));
            }
            other => panic!("expected regex, got {:?}", other),
        }
        match &segs[2] {
            Segment::Regex(p) => assert!(p.regex.is_match(".x")),
            other => panic!("expected regex, got {:?}", other),
        }
    }

    #[test]
    fn test_regex_escaped_dot_is_a_wildcard() {
        let segs = segments(r"app.~con\.*.~v1[.]0");
        assert_eq!(segs.len(), 3);
        match (&segs[1], &segs[2]) {
            (Segment::Regex(wild), Segment::Regex(literal)) => {
                assert_eq!(wild.source, "con.*");
                assert!(wild.regex.is_match("config"));
                assert!(wild.regex.is_match("con"));
                assert!(literal.regex.is_match("v1.0"));
                assert!(!literal.regex.is_match("v1x0"));
            }
            other => panic!("expected two regexes, got {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_segment() {
        assert_eq!(
            segments("app.%confg:0.7"),
            vec![
                Segment::Literal("app".into()),
                Segment::Fuzzy {
                    name: "confg".into(),
                    threshold: 0.7
                },
            ]
        );
        assert_eq!(
            segments("%confg:0.75.db")[1],
            Segment::Literal("db".into())
        );
        for (source, threshold, len) in [("%x:1.db", 1.0, 2), ("%x:0.db", 0.0, 2), ("%x:1", 1.0, 1)] {
            let segs = segments(source);
            assert_eq!(segs.len(), len, "{}", source);
            assert_eq!(
                segs[0],
                Segment::Fuzzy {
                    name: "x".into(),
                    threshold
                }
            );
        }
        assert_eq!(
            segments("%db")[0],
            Segment::Fuzzy {
                name: "db".into(),
                threshold: 0.8
            }
        );
    }

    #[test]
    fn test_attribute_filters() {
        assert_eq!(
            segments("app.*[debug=true][name='a.b']"),
            vec![
                Segment::Literal("app".into()),
                Segment::WildcardSingle,
                Segment::AttrEquals {
                    key: "debug".into(),
                    value: json!(true),
                    bare: Some("true".into()),
                },
                Segment::AttrEquals {
                    key: "name".into(),
                    value: json!("a.b"),
                    bare: None,
                },
            ]
        );
        assert_eq!(
            segments("db[port]")[1],
            Segment::AttrExists("port".into())
        );
        assert_eq!(
            segments("db[host=local host]")[1],
            Segment::AttrEquals {
                key: "host".into(),
                value: json!("local host"),
                bare: None,
            }
        );
    }

    #[test]
    fn test_predicate_filter() {
        let segs = segments("**[?(@.size >= 10 and @.kind == 'disk' or @.pinned)]");
        assert_eq!(segs[0], Segment::WildcardDeep);
        let expected = Predicate::Or(
            Box::new(Predicate::And(
                Box::new(Predicate::Compare {
                    left: Operand::Attr("size".into()),
                    op: CmpOp::Ge,
                    right: Operand::Literal(json!(10)),
                }),
                Box::new(Predicate::Compare {
                    left: Operand::Attr("kind".into()),
                    op: CmpOp::Eq,
                    right: Operand::Literal(json!("disk")),
                }),
            )),
            Box::new(Predicate::Truthy(Operand::Attr("pinned".into()))),
        );
        assert_eq!(segs[1], Segment::Predicate(expected));
    }

    #[test]
    fn test_predicate_parentheses() {
        let segs = segments("x[?((@.a < 1 or @.b != 2.5) and @.c)]");
        assert!(matches!(&segs[1], Segment::Predicate(Predicate::And(..))));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_path("app.[x"),
            Err(PathError::UnbalancedBracket { bracket: '[', .. })
        ));
        assert!(matches!(
            parse_path("app.x]"),
            Err(PathError::UnbalancedBracket { bracket: ']', position: 5, .. })
        ));
        assert!(matches!(
            parse_path(r"app.\q"),
            Err(PathError::InvalidEscape { position: 4, .. })
        ));
        assert!(matches!(parse_path(r"app\"), Err(PathError::InvalidEscape { .. })));
        assert!(matches!(parse_path("~a(b"), Err(PathError::InvalidRegex { .. })));
        assert!(matches!(parse_path("~[ab"), Err(PathError::UnbalancedBracket { .. })));
        assert!(matches!(parse_path("%db:1.5"), Err(PathError::FuzzyThreshold { .. })));
        assert!(matches!(parse_path("%db:-0.1"), Err(PathError::FuzzyThreshold { .. })));
        assert!(matches!(parse_path("%db:high"), Err(PathError::FuzzyThreshold { .. })));
    }

    #[test]
    fn test_empty_segments() {
        for source in ["", "app..x", ".app", "app.", "app.[debug]", "~", "%:0.5"] {
            assert!(
                matches!(parse_path(source), Err(PathError::EmptySegment { .. })),
                "expected empty segment error for {:?}",
                source
            );
        }
    }

    #[test]
    fn test_invalid_filters() {
        assert!(matches!(parse_path("a[]"), Err(PathError::InvalidFilter { .. })));
        assert!(matches!(parse_path("a[=1]"), Err(PathError::InvalidFilter { .. })));
        assert!(matches!(parse_path("a[?(@.x >)]"), Err(PathError::InvalidFilter { .. })));
        assert!(matches!(parse_path("a[x]b"), Err(PathError::InvalidFilter { .. })));
    }
}
