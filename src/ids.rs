//! Per-request identifiers.
//!
//! Every [`HandlerRequest`](crate::dispatcher::HandlerRequest) carries a
//! [`RequestId`]. The transport adopts the caller's `x-request-id` when it is
//! a valid ULID so log lines line up across services; otherwise a fresh id is
//! minted.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use ulid::Ulid;

/// Header carrying a request id from an upstream service.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID naming one request in logs.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId {
    ulid: Ulid,
    propagated: bool,
}

impl RequestId {
    /// Mint a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ulid: Ulid::new(),
            propagated: false,
        }
    }

    /// Adopt the first `x-request-id` header that parses as a ULID, or mint a
    /// fresh id. Header names compare case-insensitively.
    #[must_use]
    pub fn from_headers(headers: &[(Arc<str>, String)]) -> Self {
        headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
            .find_map(|(_, value)| value.trim().parse().ok())
            .unwrap_or_default()
    }

    /// True if the id came from the caller rather than being minted here.
    #[must_use]
    pub fn is_propagated(&self) -> bool {
        self.propagated
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.ulid, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(|ulid| Self {
            ulid,
            propagated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(Arc<str>, String)> {
        pairs
            .iter()
            .map(|(k, v)| (Arc::from(*k), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_caller_id_is_adopted() {
        let id = RequestId::from_headers(&headers(&[
            ("accept", "*/*"),
            ("X-Request-Id", " 01ARZ3NDEKTSV4RRFFQ69G5FAV "),
        ]));
        assert!(id.is_propagated());
        assert_eq!(id.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    }

    #[test]
    fn test_invalid_caller_id_is_skipped() {
        let id = RequestId::from_headers(&headers(&[
            ("x-request-id", "not-a-ulid"),
            ("x-request-id", "01ARZ3NDEKTSV4RRFFQ69G5FAV"),
        ]));
        assert_eq!(id.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");

        let minted = RequestId::from_headers(&headers(&[("x-request-id", "nope")]));
        assert!(!minted.is_propagated());
        assert_eq!(minted.to_string().len(), 26);
    }

    #[test]
    fn test_minted_ids_differ() {
        assert_ne!(RequestId::new(), RequestId::new());
        assert!(!RequestId::default().is_propagated());
    }
}
