use std::time::Duration;

use tracing::{info, warn};

use super::Plugin;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::router::RouteOutcome;

/// Requests slower than this are logged at `warn`.
const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(500);

/// Plugin emitting one structured log line per request.
///
/// Matched requests log at `info`, unmatched and slow ones at `warn`.
pub struct TracingPlugin {
    slow_threshold: Duration,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }
}

impl TracingPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }
}

impl Plugin for TracingPlugin {
    fn after(
        &self,
        req: &HandlerRequest,
        res: &mut HandlerResponse,
        outcome: &RouteOutcome,
        latency: Duration,
    ) {
        let latency_us = latency.as_micros() as u64;
        match outcome {
            RouteOutcome::Matched { pattern } if latency > self.slow_threshold => warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                route_pattern = %pattern,
                status = res.status,
                latency_us,
                "Slow request"
            ),
            RouteOutcome::Matched { pattern } => info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                route_pattern = %pattern,
                status = res.status,
                latency_us,
                "Request handled"
            ),
            RouteOutcome::NotFound => warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                latency_us,
                "No route matched"
            ),
            RouteOutcome::MethodNotAllowed { allowed } => warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                allowed = ?allowed,
                latency_us,
                "Method not allowed"
            ),
        }
    }
}
