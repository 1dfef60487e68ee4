//! Error types for route registration and server control.
//!
//! Dispatch never produces an error: an unmatched request is a
//! [`RouteOutcome`](crate::router::RouteOutcome), not a failure. Everything in
//! this module is raised while the multiplexer is being configured or started.

use std::io;
use thiserror::Error;

/// What was wrong with a single segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternErrorKind {
    /// `{id` or `id}`
    #[error("unbalanced braces")]
    UnbalancedBraces,
    /// `:id(\d+` or `(abc`
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    /// `{}`, `{:int}` or a bare `:`
    #[error("empty parameter name")]
    EmptyName,
    /// Parameter names are restricted to `[A-Za-z0-9_]` and may not be all
    /// digits.
    #[error("invalid parameter name `{0}`")]
    InvalidName(String),
    /// `{id:}` or `()`
    #[error("empty expression")]
    EmptyExpression,
    /// The embedded expression did not compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
    /// The same name is bound twice within one pattern.
    #[error("duplicate parameter name `{0}`")]
    DuplicateName(String),
}

/// A route pattern failed to compile.
///
/// Raised synchronously by the registration API so that a malformed route
/// blocks startup instead of failing per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid route pattern `{pattern}` at segment {segment}: {kind}")]
pub struct PatternCompileError {
    /// The full pattern as registered
    pub pattern: String,
    /// Zero-based index of the offending non-empty segment
    pub segment: usize,
    /// The specific failure
    pub kind: PatternErrorKind,
}

impl PatternCompileError {
    pub(crate) fn new(pattern: &str, segment: usize, kind: PatternErrorKind) -> Self {
        Self {
            pattern: pattern.to_string(),
            segment,
            kind,
        }
    }
}

/// Errors surfaced by the [`Multiplexer`](crate::Multiplexer) façade.
#[derive(Debug, Error)]
pub enum MuxError {
    /// A route pattern could not be compiled; nothing was registered.
    #[error(transparent)]
    Pattern(#[from] PatternCompileError),

    /// Routes and plugins cannot change once `listen` has been called.
    #[error("route table is frozen: {0} after listen")]
    Frozen(&'static str),

    /// `listen` was called while a server is already running.
    #[error("multiplexer is already listening on {0}")]
    AlreadyListening(String),

    /// The address/port pair did not resolve to a socket address.
    #[error("invalid listen address `{0}`")]
    InvalidAddress(String),

    /// The transport failed to bind or start.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_display() {
        let err = PatternCompileError::new("/a/{id", 1, PatternErrorKind::UnbalancedBraces);
        assert_eq!(
            err.to_string(),
            "invalid route pattern `/a/{id` at segment 1: unbalanced braces"
        );
    }

    #[test]
    fn test_mux_error_from_pattern() {
        let err: MuxError =
            PatternCompileError::new("/{}", 0, PatternErrorKind::EmptyName).into();
        assert!(matches!(err, MuxError::Pattern(_)));
        assert!(err.to_string().contains("empty parameter name"));
    }
}
