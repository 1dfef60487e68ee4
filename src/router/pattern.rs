//! Path compiler: turns a route pattern string into a [`CompiledPattern`].
//!
//! Compilation happens once, at registration time. Every failure mode
//! (unbalanced delimiters, bad names, unparsable regex) is reported here so a
//! malformed route stops startup instead of failing per request.
//!
//! ## Pattern syntax
//!
//! | Segment       | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `users`       | literal                                              |
//! | `{id}`        | parameter `id`, any non-empty segment                |
//! | `{id:int}`    | parameter `id`, digits only                          |
//! | `{id:uuid}`   | parameter `id`, hyphenated UUID                      |
//! | `{id:EXPR}`   | parameter `id`, whole segment must match `EXPR`      |
//! | `:id`         | parameter `id`, any non-empty segment                |
//! | `:id(EXPR)`   | parameter `id`, whole segment must match `EXPR`      |
//! | `(EXPR)`      | anonymous parameter named by its index (`"0"`, ...)  |
//!
//! Names are `[A-Za-z0-9_]` and may not be all digits; those are reserved for
//! anonymous parameters. Braces in a literal segment must balance (`a{b}`).
//!
//! Expressions cannot contain `/`, since segments are split first.

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use super::core::ParamVec;
use super::matcher::{LiteralMatcher, ParamKind, RegexMatcher, SegmentMatcher};
use crate::error::{PatternCompileError, PatternErrorKind};

/// Inline capacity for split request paths. Deeper paths spill to the heap.
pub const MAX_INLINE_SEGMENTS: usize = 16;

/// Segments of a request path, borrowed from the path itself.
pub type SegmentVec<'a> = SmallVec<[&'a str; MAX_INLINE_SEGMENTS]>;

/// Split a path into its non-empty `/`-delimited segments.
///
/// Shared by the compiler and the dispatcher so that patterns and request
/// paths are always split the same way. Leading, trailing and doubled slashes
/// produce no segments, so `/`, `` and `//` all split to nothing.
#[inline]
#[must_use]
pub fn split_segments(path: &str) -> SegmentVec<'_> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// An ordered sequence of segment matchers, one per pattern segment.
#[derive(Clone)]
pub struct CompiledPattern {
    source: Arc<str>,
    matchers: Vec<SegmentMatcher>,
}

impl CompiledPattern {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternCompileError`] naming the pattern and the zero-based
    /// index of the offending segment.
    ///
    /// # Example
    ///
    /// ```
    /// use brrtmux::router::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::compile("/users/{id:int}").unwrap();
    /// assert_eq!(pattern.len(), 2);
    /// assert!(pattern.matches(&["users", "42"]));
    /// assert!(!pattern.matches(&["users", "bob"]));
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, PatternCompileError> {
        let segments = split_segments(pattern);
        let mut matchers = Vec::with_capacity(segments.len());
        let mut names: SmallVec<[Arc<str>; 8]> = SmallVec::new();

        for (index, segment) in segments.iter().enumerate() {
            let matcher = compile_segment(segment, names.len())
                .map_err(|kind| PatternCompileError::new(pattern, index, kind))?;
            if let Some(name) = matcher.param_name() {
                if names.iter().any(|n| n.as_ref() == name) {
                    return Err(PatternCompileError::new(
                        pattern,
                        index,
                        PatternErrorKind::DuplicateName(name.to_string()),
                    ));
                }
                names.push(Arc::from(name));
            }
            matchers.push(matcher);
        }

        Ok(Self {
            source: Arc::from(pattern),
            matchers,
        })
    }

    /// The pattern exactly as it was registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    #[must_use]
    pub fn matchers(&self) -> &[SegmentMatcher] {
        &self.matchers
    }

    /// Number of segments; a request must have exactly this many to match.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// True for the root pattern (`/` or the empty string).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Names bound by this pattern, in segment order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().filter_map(SegmentMatcher::param_name)
    }

    /// Same segment count and every matcher accepts its segment.
    ///
    /// Each segment decision is final; there is no backtracking.
    #[inline]
    #[must_use]
    pub fn matches(&self, segments: &[&str]) -> bool {
        self.matchers.len() == segments.len()
            && self
                .matchers
                .iter()
                .zip(segments)
                .all(|(m, s)| m.check_match(s))
    }

    /// Extract parameters for segments that already passed [`matches`](Self::matches).
    #[inline]
    pub fn extract(&self, segments: &[&str], params: &mut ParamVec) {
        for (m, s) in self.matchers.iter().zip(segments) {
            m.extract_param(params, s);
        }
    }
}

/// Structural equality: the matcher sequences, not the source spelling.
/// `/a/b/` and `/a/b` compare equal.
impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.matchers == other.matchers
    }
}

impl Eq for CompiledPattern {}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("matchers", &self.matchers)
            .finish()
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile_segment(segment: &str, param_index: usize) -> Result<SegmentMatcher, PatternErrorKind> {
    if segment.starts_with('{') {
        let inner = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or(PatternErrorKind::UnbalancedBraces)?;
        return match inner.split_once(':') {
            Some((name, annotation)) => {
                validate_name(name)?;
                match ParamKind::from_annotation(annotation) {
                    ParamKind::Custom => RegexMatcher::new(name, annotation),
                    kind => RegexMatcher::typed(name, kind),
                }
            }
            None => {
                validate_name(inner)?;
                RegexMatcher::any(inner)
            }
        }
        .map(SegmentMatcher::from);
    }

    if let Some(rest) = segment.strip_prefix(':') {
        return match rest.split_once('(') {
            Some((name, tail)) => {
                validate_name(name)?;
                let expression = tail
                    .strip_suffix(')')
                    .ok_or(PatternErrorKind::UnbalancedParens)?;
                RegexMatcher::new(name, expression)
            }
            None => {
                validate_name(rest)?;
                RegexMatcher::any(rest)
            }
        }
        .map(SegmentMatcher::from);
    }

    if segment.starts_with('(') {
        let expression = segment[1..]
            .strip_suffix(')')
            .ok_or(PatternErrorKind::UnbalancedParens)?;
        return RegexMatcher::new(&param_index.to_string(), expression).map(SegmentMatcher::from);
    }

    if !braces_balanced(segment) {
        return Err(PatternErrorKind::UnbalancedBraces);
    }
    Ok(LiteralMatcher::new(segment).into())
}

/// Braces in a literal must nest: `a{b}` is fine, `id}` and `a{b` are not.
fn braces_balanced(segment: &str) -> bool {
    let mut depth = 0usize;
    for c in segment.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn validate_name(name: &str) -> Result<(), PatternErrorKind> {
    if name.is_empty() {
        return Err(PatternErrorKind::EmptyName);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternErrorKind::InvalidName(name.to_string()));
    }
    // All-digit names belong to anonymous `(EXPR)` parameters.
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PatternErrorKind::InvalidName(name.to_string()));
    }
    Ok(())
}
