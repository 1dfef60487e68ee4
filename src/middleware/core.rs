use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::router::RouteOutcome;

/// A step in the plugin chain.
///
/// `before` runs ahead of route lookup and may rewrite the request (normalise
/// the path, add headers, stash ids). It cannot stop dispatch: the chain always
/// runs to completion and routing always follows. `after` runs once the
/// outcome is known, with the time spent since the first `before`.
///
/// Any `Fn(&mut HandlerResponse, &mut HandlerRequest)` closure is a plugin with
/// a no-op `after`.
pub trait Plugin: Send + Sync {
    fn before(&self, _res: &mut HandlerResponse, _req: &mut HandlerRequest) {}

    fn after(
        &self,
        _req: &HandlerRequest,
        _res: &mut HandlerResponse,
        _outcome: &RouteOutcome,
        _latency: Duration,
    ) {
    }
}

impl<F> Plugin for F
where
    F: Fn(&mut HandlerResponse, &mut HandlerRequest) + Send + Sync,
{
    fn before(&self, res: &mut HandlerResponse, req: &mut HandlerRequest) {
        self(res, req);
    }
}

/// Ordered list of plugins, run in registration order.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn run_before(&self, res: &mut HandlerResponse, req: &mut HandlerRequest) {
        for plugin in &self.plugins {
            plugin.before(res, req);
        }
    }

    pub fn run_after(
        &self,
        req: &HandlerRequest,
        res: &mut HandlerResponse,
        outcome: &RouteOutcome,
        latency: Duration,
    ) {
        for plugin in &self.plugins {
            plugin.after(req, res, outcome, latency);
        }
    }
}
