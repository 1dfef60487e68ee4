//! Router core module - hot path for request routing.
//!
//! # JSF Compliance (Rule 206)
//!
//! Lookup splits the request path into a stack-allocated [`SegmentVec`] and
//! extracts parameters into a stack-allocated [`ParamVec`], so the common case
//! performs no heap allocation beyond the parameter values themselves.

// JSF Rule 206: Deny heap allocations in the hot path
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::{split_segments, CompiledPattern};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::PatternCompileError;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` shared with the compiled matchers, so binding a
/// parameter clones a pointer, not a string. Values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A route handler. Bound at registration, only invoked at dispatch.
pub type Handler = Arc<dyn Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync>;

/// Lookups slower than this are logged at `warn`.
const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// A compiled pattern together with the handler it routes to.
#[derive(Clone)]
pub struct Candidate {
    pattern: CompiledPattern,
    handler: Handler,
}

impl Candidate {
    #[must_use]
    pub fn new(pattern: CompiledPattern, handler: Handler) -> Self {
        Self { pattern, handler }
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Result of looking a request up in the [`Router`].
pub enum Lookup<'r> {
    /// The first candidate, in registration order, whose pattern matched.
    Found(&'r Candidate),
    /// Nothing is registered for this method, but other methods have routes.
    /// Carries the methods whose candidates do match this path (possibly none).
    MethodNotAllowed(Vec<Method>),
    /// No candidate for this method matched.
    NotFound,
}

/// What [`Dispatcher::dispatch`](crate::dispatcher::Dispatcher::dispatch)
/// decided for one request.
///
/// Unmatched requests are ordinary outcomes, never errors. The transport maps
/// them onto protocol responses (404, 405).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A handler ran. `pattern` is the source of the pattern that matched.
    Matched { pattern: Arc<str> },
    /// No registered pattern matched, or the base path did not.
    NotFound,
    /// The method has no routes at all; `allowed` lists the methods that do
    /// route this path.
    MethodNotAllowed { allowed: Vec<Method> },
}

impl RouteOutcome {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteOutcome::Matched { .. })
    }
}

/// Per-method ordered candidate lists.
///
/// Insertion order is load-bearing: lookup returns the *first* registered
/// candidate that matches, never the most specific one. Register specific
/// routes before general ones.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Candidate>>,
    route_count: usize,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append it to the candidates for `method`.
    ///
    /// An identical earlier registration is kept and keeps winning.
    ///
    /// # Errors
    ///
    /// Returns the compile error and leaves the table untouched.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), PatternCompileError> {
        let compiled = CompiledPattern::compile(pattern)?;
        self.insert(method, Candidate::new(compiled, handler));
        Ok(())
    }

    /// Append an already compiled candidate.
    pub fn insert(&mut self, method: Method, candidate: Candidate) {
        let list = self.routes.entry(method.clone()).or_default();
        let shadowed = list.iter().any(|c| c.pattern == candidate.pattern);
        if shadowed {
            warn!(
                method = %method,
                pattern = %candidate.pattern,
                "Route is unreachable: an identical pattern was registered earlier"
            );
        }
        debug!(
            method = %method,
            pattern = %candidate.pattern,
            segments = candidate.pattern.len(),
            position = list.len(),
            "Route added"
        );
        list.push(candidate);
        self.route_count += 1;
    }

    /// Total candidates across all methods.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }

    /// Candidates for one method, in registration order.
    #[must_use]
    pub fn candidates(&self, method: &Method) -> &[Candidate] {
        self.routes.get(method).map_or(&[], Vec::as_slice)
    }

    /// Methods that have at least one candidate, sorted by name.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.routes.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Look up a raw path (no base path handling).
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let segments = split_segments(path);
        self.lookup_segments(method, &segments)
    }

    /// Look up an already split path.
    #[must_use]
    pub fn lookup_segments(&self, method: &Method, segments: &[&str]) -> Lookup<'_> {
        // RT1: Route match attempt
        debug!(
            method = %method,
            segments = ?segments,
            "Route match attempt"
        );
        let match_start = Instant::now();

        let Some(candidates) = self.routes.get(method) else {
            if self.is_empty() {
                return Lookup::NotFound;
            }
            let allowed = self.allowed_methods(segments);
            warn!(
                method = %method,
                allowed = ?allowed,
                "No routes registered for method"
            );
            return Lookup::MethodNotAllowed(allowed);
        };

        let found = candidates.iter().find(|c| c.pattern.matches(segments));
        let match_duration = match_start.elapsed();

        match found {
            Some(candidate) => {
                if match_duration > SLOW_MATCH_THRESHOLD {
                    warn!(
                        method = %method,
                        route_pattern = %candidate.pattern,
                        candidates = candidates.len(),
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        route_pattern = %candidate.pattern,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
                Lookup::Found(candidate)
            }
            None => {
                // RT4: No route found (404)
                debug!(
                    method = %method,
                    candidates = candidates.len(),
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
                Lookup::NotFound
            }
        }
    }

    /// Methods with a candidate matching `segments`, sorted by name.
    #[must_use]
    pub fn allowed_methods(&self, segments: &[&str]) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .routes
            .iter()
            .filter(|(_, list)| list.iter().any(|c| c.pattern.matches(segments)))
            .map(|(m, _)| m.clone())
            .collect();
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        allowed
    }

    /// Log every registered route, in dispatch order per method.
    pub fn dump_routes(&self) {
        info!(routes_count = self.route_count, "Routing table");
        for method in self.methods() {
            for (position, candidate) in self.candidates(&method).iter().enumerate() {
                info!(
                    method = %method,
                    position,
                    pattern = %candidate.pattern,
                    params = ?candidate.pattern.param_names().collect::<Vec<_>>(),
                    "[route]"
                );
            }
        }
    }
}
