//! Dispatcher core module - hot path for request dispatch.
//!
//! # JSF Compliance (Rule 206)
//!
//! Headers and parameters use `SmallVec` so typical requests never touch the
//! heap for their bookkeeping.

// JSF Rule 206: Deny heap allocations in the hot path
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::error::PatternCompileError;
use crate::ids::RequestId;
use crate::middleware::{MiddlewareChain, Plugin};
use crate::router::{split_segments, Handler, Lookup, ParamVec, RouteOutcome, Router};

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers (JSF: no heap in hot path)
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` so repeated names (Content-Type, Authorization)
/// clone in O(1).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// An already parsed request, as handed to plugins and handlers.
///
/// Plugins receive it mutably and may rewrite anything route dispatch reads,
/// most usefully `path`. Handlers receive it read-only with `path_params`
/// filled in.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, without the query string
    pub path: String,
    /// Path parameters bound by the matched pattern
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers, lowercase names
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Build a request from a method and a request target.
    ///
    /// Anything after `?` is parsed as a form-urlencoded query string.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let query_params = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            path_params: ParamVec::new(),
            query_params,
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Add a header; the name is stored lowercase.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?limit=10&limit=20` yields `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap for compatibility
    /// Note: This allocates - use get_path_param() in hot paths
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// The response a handler populates.
///
/// Starts out as `200` with a `null` body. A string body is written as
/// `text/plain`, anything else as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut res = Self::new(status, HeaderVec::new(), body);
        res.set_header("content-type", "application/json");
        res
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = body;
    }

    /// Serialize `value` into the body.
    ///
    /// # Errors
    ///
    /// Returns the serialization error and leaves the body unchanged.
    pub fn set_json<T: Serialize>(&mut self, value: &T) -> serde_json::Result<()> {
        self.body = serde_json::to_value(value)?;
        Ok(())
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.to_string()));
    }
}

/// Base path, route table and plugin chain: everything dispatch reads.
///
/// Built mutably while the multiplexer is being configured, then frozen into
/// an `Arc<Dispatcher>` and shared read-only by every serving coroutine.
#[derive(Clone, Default)]
pub struct Dispatcher {
    base_path: String,
    router: Router,
    middlewares: MiddlewareChain,
}

impl Dispatcher {
    /// Create a dispatcher with no base path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher that only serves paths under `base_path`.
    ///
    /// The base path is normalised to a leading `/` and no trailing `/`;
    /// `""` and `"/"` both mean "no base path".
    #[must_use]
    pub fn with_base_path(base_path: &str) -> Self {
        let trimmed = base_path.trim_end_matches('/');
        let base_path = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self {
            base_path,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Compile and register a route.
    ///
    /// # Errors
    ///
    /// Returns the compile error; the route table is unchanged.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), PatternCompileError> {
        self.router.add_route(method, pattern, handler)
    }

    /// Add a plugin to the end of the chain.
    pub fn add_middleware(&mut self, plugin: Arc<dyn Plugin>) {
        self.middlewares.push(plugin);
    }

    /// Strip the base path from `path`.
    ///
    /// The base path must end on a segment boundary: with base `/api`,
    /// `/api` and `/api/x` are accepted but `/apix` is not.
    #[must_use]
    pub fn strip_base_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        path.strip_prefix(self.base_path.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Run the plugin chain, route the request and invoke the matched handler.
    ///
    /// Every plugin's `before` runs first, in registration order, and dispatch
    /// always proceeds afterwards. Then every plugin's `after` runs with the
    /// outcome. Unmatched requests leave `res` untouched. A panicking handler
    /// is contained: the outcome stays `Matched` and `res` becomes a 500
    /// error, so `after` hooks still observe the request.
    pub fn dispatch(&self, res: &mut HandlerResponse, req: &mut HandlerRequest) -> RouteOutcome {
        let start = Instant::now();
        self.middlewares.run_before(res, req);
        let outcome = self.route(res, req);
        self.middlewares
            .run_after(req, res, &outcome, start.elapsed());
        outcome
    }

    fn route(&self, res: &mut HandlerResponse, req: &mut HandlerRequest) -> RouteOutcome {
        let Some(rest) = self.strip_base_path(&req.path) else {
            debug!(
                request_id = %req.request_id,
                path = %req.path,
                base_path = %self.base_path,
                "Base path mismatch"
            );
            return RouteOutcome::NotFound;
        };
        let segments = split_segments(rest);

        match self.router.lookup_segments(&req.method, &segments) {
            Lookup::Found(candidate) => {
                let mut params = ParamVec::new();
                candidate.pattern().extract(&segments, &mut params);
                req.path_params = params;
                debug!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    route_pattern = %candidate.pattern(),
                    path_params = ?req.path_params,
                    "Dispatching to handler"
                );
                let handler = candidate.handler();
                let request: &HandlerRequest = req;
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| handler(&mut *res, request)));
                if let Err(payload) = result {
                    error!(
                        request_id = %req.request_id,
                        method = %req.method,
                        path = %req.path,
                        route_pattern = %candidate.pattern(),
                        panic = %panic_message(payload.as_ref()),
                        "Handler panicked"
                    );
                    *res = HandlerResponse::error(500, "Internal Server Error");
                }
                RouteOutcome::Matched {
                    pattern: candidate.pattern().source_arc(),
                }
            }
            Lookup::MethodNotAllowed(allowed) => RouteOutcome::MethodNotAllowed { allowed },
            Lookup::NotFound => RouteOutcome::NotFound,
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
