//! Segment matchers: the per-segment building blocks of a compiled pattern.
//!
//! A matcher answers two questions about one path segment (the text between
//! two `/` delimiters): does it match, and if so, which named parameter does it
//! bind. The family is closed: a segment is either a literal or a
//! regex-backed parameter. Typed parameters (integers, UUIDs) are regex-backed
//! matchers with a predefined expression, so they share the exact same
//! contract.
//!
//! Matchers are immutable after construction and hold no reference into any
//! request, so a compiled route table can be shared across coroutines without
//! locking.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::core::ParamVec;
use crate::error::PatternErrorKind;

const ANY_EXPRESSION: &str = "[^/]+";
const INTEGER_EXPRESSION: &str = "[0-9]+";
const UUID_EXPRESSION: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Which flavour of regex-backed parameter a matcher implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// `{name}` or `:name` - any non-empty segment
    Any,
    /// `{name:int}` - ASCII digits only
    Integer,
    /// `{name:uuid}` - hyphenated hex UUID, any case
    Uuid,
    /// `{name:EXPR}`, `:name(EXPR)` or `(EXPR)` - caller supplied expression
    Custom,
}

impl ParamKind {
    /// Resolve the expression written after `:` inside braces.
    ///
    /// The reserved words `int` and `uuid` select the typed matchers; anything
    /// else is taken as a regular expression.
    #[must_use]
    pub fn from_annotation(annotation: &str) -> Self {
        match annotation {
            "int" => ParamKind::Integer,
            "uuid" => ParamKind::Uuid,
            _ => ParamKind::Custom,
        }
    }

    fn builtin_expression(self) -> Option<&'static str> {
        match self {
            ParamKind::Any => Some(ANY_EXPRESSION),
            ParamKind::Integer => Some(INTEGER_EXPRESSION),
            ParamKind::Uuid => Some(UUID_EXPRESSION),
            ParamKind::Custom => None,
        }
    }
}

/// Matches one fixed string exactly. Binds nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatcher {
    text: Box<str>,
}

impl LiteralMatcher {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Binds a named parameter when the whole segment matches an expression.
#[derive(Clone)]
pub struct RegexMatcher {
    name: Arc<str>,
    expression: Box<str>,
    kind: ParamKind,
    regex: Regex,
}

impl RegexMatcher {
    /// Build a matcher for a caller supplied expression.
    ///
    /// The expression is anchored to the whole segment (`^(?:EXPR)$`), so
    /// `[0-9]+` does not accept `12ab`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternErrorKind::EmptyExpression`] for an empty expression and
    /// [`PatternErrorKind::InvalidRegex`] if the expression does not compile.
    pub fn new(name: &str, expression: &str) -> Result<Self, PatternErrorKind> {
        Self::build(name, expression, ParamKind::Custom)
    }

    /// Build a typed matcher (`Any`, `Integer`, `Uuid`).
    ///
    /// # Errors
    ///
    /// Returns [`PatternErrorKind::EmptyExpression`] when called with
    /// [`ParamKind::Custom`], which has no built-in expression.
    pub fn typed(name: &str, kind: ParamKind) -> Result<Self, PatternErrorKind> {
        let expression = kind
            .builtin_expression()
            .ok_or(PatternErrorKind::EmptyExpression)?;
        Self::build(name, expression, kind)
    }

    /// Shorthand for a matcher that accepts any non-empty segment.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the built-in expression is a constant.
    pub fn any(name: &str) -> Result<Self, PatternErrorKind> {
        Self::typed(name, ParamKind::Any)
    }

    fn build(name: &str, expression: &str, kind: ParamKind) -> Result<Self, PatternErrorKind> {
        if expression.is_empty() {
            return Err(PatternErrorKind::EmptyExpression);
        }
        let anchored = format!("^(?:{expression})$");
        let regex =
            Regex::new(&anchored).map_err(|e| PatternErrorKind::InvalidRegex(e.to_string()))?;
        Ok(Self {
            name: Arc::from(name),
            expression: expression.into(),
            kind,
            regex,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The expression as written, before anchoring.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

impl PartialEq for RegexMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.expression == other.expression
    }
}

impl Eq for RegexMatcher {}

impl fmt::Debug for RegexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("name", &self.name)
            .field("expression", &self.expression)
            .field("kind", &self.kind)
            .finish()
    }
}

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentMatcher {
    Literal(LiteralMatcher),
    Regex(RegexMatcher),
}

impl SegmentMatcher {
    /// Pure predicate: does `segment` satisfy this element?
    #[inline]
    #[must_use]
    pub fn check_match(&self, segment: &str) -> bool {
        match self {
            SegmentMatcher::Literal(lit) => lit.text() == segment,
            SegmentMatcher::Regex(re) => re.regex.is_match(segment),
        }
    }

    /// Record the bound parameter, if any.
    ///
    /// Only called right after [`check_match`](Self::check_match) succeeded on
    /// the same text, so it never re-validates.
    #[inline]
    pub fn extract_param(&self, params: &mut ParamVec, segment: &str) {
        match self {
            SegmentMatcher::Literal(_) => {}
            SegmentMatcher::Regex(re) => {
                params.push((Arc::clone(&re.name), segment.to_string()));
            }
        }
    }

    /// Name of the parameter this element binds, if it binds one.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            SegmentMatcher::Literal(_) => None,
            SegmentMatcher::Regex(re) => Some(re.name()),
        }
    }
}

impl From<LiteralMatcher> for SegmentMatcher {
    fn from(value: LiteralMatcher) -> Self {
        SegmentMatcher::Literal(value)
    }
}

impl From<RegexMatcher> for SegmentMatcher {
    fn from(value: RegexMatcher) -> Self {
        SegmentMatcher::Regex(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_exact_only() {
        let m = SegmentMatcher::from(LiteralMatcher::new("users"));
        assert!(m.check_match("users"));
        assert!(!m.check_match("Users"));
        assert!(!m.check_match("users2"));

        let mut params = ParamVec::new();
        m.extract_param(&mut params, "users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_regex_is_anchored() {
        let m = SegmentMatcher::from(RegexMatcher::new("id", "[0-9]+").unwrap());
        assert!(m.check_match("42"));
        assert!(!m.check_match("42a"));
        assert!(!m.check_match("a42"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_group() {
        let m = SegmentMatcher::from(RegexMatcher::new("fmt", "json|xml").unwrap());
        assert!(m.check_match("json"));
        assert!(m.check_match("xml"));
        assert!(!m.check_match("jsonx"));
        assert!(!m.check_match("xjson"));
    }

    #[test]
    fn test_regex_extracts_named_param() {
        let m = SegmentMatcher::from(RegexMatcher::any("id").unwrap());
        let mut params = ParamVec::new();
        assert!(m.check_match("abc"));
        m.extract_param(&mut params, "abc");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0.as_ref(), "id");
        assert_eq!(params[0].1, "abc");
    }

    #[test]
    fn test_typed_integer_and_uuid() {
        let int = SegmentMatcher::from(RegexMatcher::typed("n", ParamKind::Integer).unwrap());
        assert!(int.check_match("0042"));
        assert!(!int.check_match("-1"));
        assert!(!int.check_match("4.2"));

        let uuid = SegmentMatcher::from(RegexMatcher::typed("u", ParamKind::Uuid).unwrap());
        assert!(uuid.check_match("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(uuid.check_match("67E55044-10B1-426F-9247-BB680E5FE0C8"));
        assert!(!uuid.check_match("67e55044"));
    }

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        let err = RegexMatcher::new("id", "([a-z").unwrap_err();
        assert!(matches!(err, PatternErrorKind::InvalidRegex(_)));
        assert_eq!(
            RegexMatcher::new("id", "").unwrap_err(),
            PatternErrorKind::EmptyExpression
        );
        assert_eq!(
            RegexMatcher::typed("id", ParamKind::Custom).unwrap_err(),
            PatternErrorKind::EmptyExpression
        );
    }

    #[test]
    fn test_structural_equality_ignores_compiled_state() {
        let a = RegexMatcher::new("id", "[a-z]+").unwrap();
        let b = RegexMatcher::new("id", "[a-z]+").unwrap();
        let c = RegexMatcher::new("key", "[a-z]+").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
