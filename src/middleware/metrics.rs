use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Plugin;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::router::RouteOutcome;

/// Plugin collecting request counters.
///
/// All counters use atomic operations for thread-safe updates without locks.
///
/// Metrics collected:
/// - Total request count
/// - Requests that matched no route, split by outcome
/// - Average latency (plugin chain + routing + handler)
/// - Coroutine stack size of the serving coroutine
#[derive(Default)]
pub struct MetricsPlugin {
    request_count: AtomicUsize,
    not_found: AtomicUsize,
    method_not_allowed: AtomicUsize,
    total_latency_ns: AtomicU64,
    stack_size: AtomicUsize,
}

impl MetricsPlugin {
    /// Create a new metrics plugin with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests dispatched
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests that ended as `NotFound`
    pub fn not_found_count(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Requests that ended as `MethodNotAllowed`
    pub fn method_not_allowed_count(&self) -> usize {
        self.method_not_allowed.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Stack size of the last coroutine that served a request, or the
    /// configured default when dispatch ran outside a coroutine.
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of the counters.
    pub fn render(&self) -> String {
        format!(
            "# HELP brrtmux_requests_total Total number of dispatched requests\n\
             # TYPE brrtmux_requests_total counter\n\
             brrtmux_requests_total {}\n\
             # HELP brrtmux_unmatched_total Requests that matched no route\n\
             # TYPE brrtmux_unmatched_total counter\n\
             brrtmux_unmatched_total{{outcome=\"not_found\"}} {}\n\
             brrtmux_unmatched_total{{outcome=\"method_not_allowed\"}} {}\n\
             # HELP brrtmux_request_latency_seconds Average request latency in seconds\n\
             # TYPE brrtmux_request_latency_seconds gauge\n\
             brrtmux_request_latency_seconds {}\n\
             # HELP brrtmux_coroutine_stack_bytes Coroutine stack size\n\
             # TYPE brrtmux_coroutine_stack_bytes gauge\n\
             brrtmux_coroutine_stack_bytes {}\n",
            self.request_count(),
            self.not_found_count(),
            self.method_not_allowed_count(),
            self.average_latency().as_secs_f64(),
            self.stack_size(),
        )
    }
}

impl Plugin for MetricsPlugin {
    fn before(&self, _res: &mut HandlerResponse, _req: &mut HandlerRequest) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    fn after(
        &self,
        _req: &HandlerRequest,
        _res: &mut HandlerResponse,
        outcome: &RouteOutcome,
        latency: Duration,
    ) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        match outcome {
            RouteOutcome::Matched { .. } => {}
            RouteOutcome::NotFound => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            RouteOutcome::MethodNotAllowed { .. } => {
                self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
            }
        }
        let size = if may::coroutine::is_coroutine() {
            may::coroutine::current().stack_size()
        } else {
            may::config().get_stack_size()
        };
        self.stack_size.store(size, Ordering::Relaxed);
    }
}
