//! # brrtmux
//!
//! **brrtmux** is a small, deterministic HTTP request multiplexer for the `may`
//! coroutine runtime.
//!
//! ## Overview
//!
//! Route patterns are compiled once, at registration, into a sequence of
//! per-segment matchers. Incoming requests are routed by method and then by
//! scanning that method's routes in registration order; the first route whose
//! matchers all accept the request's segments wins. Before routing, an ordered
//! chain of plugins may rewrite the request.
//!
//! ## Architecture
//!
//! - **[`router`]** - Segment matchers, the path compiler and the route table
//! - **[`dispatcher`]** - Request/response types, base-path stripping and dispatch
//! - **[`middleware`]** - The plugin chain plus bundled metrics and tracing plugins
//! - **[`server`]** - `may_minihttp` transport adapter
//! - **[`multiplexer`]** - The registration and lifecycle façade
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::MuxService
//!     participant Dispatcher
//!     participant Plugins as MiddlewareChain
//!     participant Router
//!     participant Handler
//!
//!     Client->>Server: HTTP request
//!     Server->>Dispatcher: dispatch(res, req)
//!     Dispatcher->>Plugins: before(res, req) in order
//!     Dispatcher->>Dispatcher: strip base path
//!     Dispatcher->>Router: lookup_segments(method, segments)
//!     alt first match
//!         Router-->>Dispatcher: Found(candidate)
//!         Dispatcher->>Handler: handler(res, req + path params)
//!     else no candidate matches
//!         Router-->>Dispatcher: NotFound
//!     else method has no routes
//!         Router-->>Dispatcher: MethodNotAllowed(allowed)
//!     end
//!     Dispatcher->>Plugins: after(req, res, outcome, latency)
//!     Dispatcher-->>Server: RouteOutcome
//!     Server-->>Client: 200 / 404 / 405 + Allow
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
//! use brrtmux::Multiplexer;
//! use serde_json::json;
//!
//! fn main() -> Result<(), brrtmux::MuxError> {
//!     let mut mux = Multiplexer::with_base_path("/api");
//!     mux.get("/users/{id:int}", |res: &mut HandlerResponse, req: &HandlerRequest| {
//!         res.set_body(json!({ "id": req.get_path_param("id") }));
//!     })?;
//!     mux.listen("0.0.0.0", "8080")?;
//!     mux.join()
//! }
//! ```
//!
//! ## Configuration
//!
//! | Variable             | Default              | Meaning                        |
//! |----------------------|----------------------|--------------------------------|
//! | `BRRTMUX_STACK_SIZE` | `0x4000`             | coroutine stack size in bytes  |
//! | `BRRTMUX_WORKERS`    | available parallelism| scheduler worker threads       |
//! | `BRRTMUX_LOG_LEVEL`  | `info`               | log level for [`logging`]      |
//! | `BRRTMUX_LOG_FORMAT` | `json`               | `json` or `pretty`             |

pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod multiplexer;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use error::{MuxError, PatternCompileError, PatternErrorKind};
pub use ids::RequestId;
pub use middleware::{MetricsPlugin, Plugin, TracingPlugin};
pub use multiplexer::Multiplexer;
pub use router::{CompiledPattern, Handler, RouteOutcome, Router, SegmentMatcher};
