//! # Middleware Module
//!
//! The plugin chain that runs around route dispatch.
//!
//! Plugins run in registration order. Each one sees the same mutable request
//! before routing and may rewrite it; none of them can stop routing. After the
//! outcome is known each plugin gets an `after` call, which is where the
//! bundled [`MetricsPlugin`] and [`TracingPlugin`] do their work.
//!
//! ```rust
//! use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
//! use brrtmux::Multiplexer;
//!
//! let mut mux = Multiplexer::new();
//! mux.use_plugin(|_res: &mut HandlerResponse, req: &mut HandlerRequest| {
//!     if req.path.len() > 1 && req.path.ends_with('/') {
//!         req.path.pop();
//!     }
//! })
//! .unwrap();
//! ```

mod core;
mod metrics;
mod tracing;

pub use self::core::{MiddlewareChain, Plugin};
pub use self::metrics::MetricsPlugin;
pub use self::tracing::TracingPlugin;
