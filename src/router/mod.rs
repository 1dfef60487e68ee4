//! # Router Module
//!
//! Pattern compilation and route lookup for the multiplexer.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns into ordered sequences of segment matchers
//! - Storing candidates per HTTP method, in registration order
//! - Finding the first candidate whose pattern matches a request path
//! - Extracting path parameters from the matched candidate
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Compilation**: At registration, patterns such as `/users/{id:int}` are
//!    split on `/` and each segment becomes a [`SegmentMatcher`]: a literal, or a
//!    regex-backed parameter.
//!
//! 2. **Matching**: For each request, the path is split the same way and the
//!    method's candidates are scanned in registration order. A candidate
//!    matches when it has the same number of segments and every matcher accepts
//!    its segment. The first match wins.
//!
//! ## Example
//!
//! ```rust
//! use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
//! use brrtmux::router::{Handler, Lookup, Router};
//! use http::Method;
//! use std::sync::Arc;
//!
//! let handler: Handler = Arc::new(|_res: &mut HandlerResponse, _req: &HandlerRequest| {});
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/pets/{id:int}", handler).unwrap();
//!
//! assert!(matches!(router.lookup(&Method::GET, "/pets/7"), Lookup::Found(_)));
//! assert!(matches!(router.lookup(&Method::GET, "/pets/rex"), Lookup::NotFound));
//! ```
//!
//! ## Performance
//!
//! Lookup is O(n) in the number of candidates for the request method. That is
//! the price of strict registration-order semantics; tables of a few hundred
//! routes still match in well under a microsecond per candidate.

mod core;
mod matcher;
mod pattern;
#[cfg(test)]
mod tests;

pub use self::core::{
    Candidate, Handler, Lookup, ParamVec, RouteOutcome, Router, MAX_INLINE_PARAMS,
};
pub use self::matcher::{LiteralMatcher, ParamKind, RegexMatcher, SegmentMatcher};
pub use self::pattern::{split_segments, CompiledPattern, SegmentVec, MAX_INLINE_SEGMENTS};
