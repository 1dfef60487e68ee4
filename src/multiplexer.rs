//! # Multiplexer
//!
//! The user-facing façade: register routes and plugins, then `listen`.
//!
//! ```rust
//! use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
//! use brrtmux::{Multiplexer, RouteOutcome};
//! use http::Method;
//! use serde_json::json;
//!
//! let mut mux = Multiplexer::with_base_path("/api");
//! mux.get("/users/{id:int}", |res: &mut HandlerResponse, req: &HandlerRequest| {
//!     res.set_body(json!({ "id": req.get_path_param("id") }));
//! })
//! .unwrap();
//!
//! let mut req = HandlerRequest::new(Method::GET, "/api/users/42");
//! let mut res = HandlerResponse::default();
//! assert!(mux.dispatch(&mut res, &mut req).is_matched());
//! assert_eq!(res.body, json!({ "id": "42" }));
//!
//! let mut req = HandlerRequest::new(Method::GET, "/api/users/abc");
//! assert_eq!(mux.dispatch(&mut res, &mut req), RouteOutcome::NotFound);
//! ```
//!
//! ## Lifecycle
//!
//! Registration takes `&mut self` and is only possible before `listen`.
//! `listen` freezes the configuration into an `Arc<Dispatcher>` shared by all
//! serving coroutines; later registration attempts fail with
//! [`MuxError::Frozen`]. The configuration stays frozen after `stop`.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use http::Method;
use tracing::{error, info};

use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use crate::error::MuxError;
use crate::middleware::Plugin;
use crate::router::{Handler, RouteOutcome, Router};
use crate::runtime_config::RuntimeConfig;
use crate::server::{HttpServer, MuxService, ServerHandle};

/// HTTP request multiplexer.
pub struct Multiplexer {
    dispatcher: Dispatcher,
    frozen: Option<Arc<Dispatcher>>,
    server: Option<ServerHandle>,
    runtime_config: RuntimeConfig,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer {
    /// Create a multiplexer with no base path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_path("")
    }

    /// Create a multiplexer that only serves requests under `base_path`.
    ///
    /// `"/api"`, `"api"` and `"/api/"` are equivalent; `""` and `"/"` mean
    /// no base path.
    #[must_use]
    pub fn with_base_path(base_path: &str) -> Self {
        Self {
            dispatcher: Dispatcher::with_base_path(base_path),
            frozen: None,
            server: None,
            runtime_config: RuntimeConfig::from_env(),
        }
    }

    /// Override the coroutine runtime settings applied by [`listen`](Self::listen).
    #[must_use]
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn head<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::HEAD, pattern, handler)
    }

    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, pattern, handler)
    }

    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::PATCH, pattern, handler)
    }

    pub fn options<F>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.handle(Method::OPTIONS, pattern, handler)
    }

    /// Register `handler` for `method` requests matching `pattern`.
    ///
    /// Routes are tried in registration order and the first match wins.
    ///
    /// # Errors
    ///
    /// - [`MuxError::Pattern`] if the pattern does not compile; the route
    ///   table is left unchanged
    /// - [`MuxError::Frozen`] after [`listen`](Self::listen)
    pub fn handle<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(&mut HandlerResponse, &HandlerRequest) + Send + Sync + 'static,
    {
        self.ensure_mutable("route registration")?;
        let handler: Handler = Arc::new(handler);
        match self.dispatcher.add_route(method.clone(), pattern, handler) {
            Ok(()) => {
                info!(
                    method = %method,
                    pattern = %pattern,
                    route_count = self.dispatcher.router().route_count(),
                    "Route registered"
                );
                Ok(())
            }
            Err(e) => {
                error!(method = %method, pattern = %pattern, error = %e, "Route rejected");
                Err(e.into())
            }
        }
    }

    /// Append a plugin to the chain.
    ///
    /// # Errors
    ///
    /// [`MuxError::Frozen`] after [`listen`](Self::listen).
    pub fn use_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> Result<(), MuxError> {
        self.use_shared_plugin(Arc::new(plugin))
    }

    /// Append a plugin the caller keeps a handle to, e.g. to read metrics.
    ///
    /// # Errors
    ///
    /// [`MuxError::Frozen`] after [`listen`](Self::listen).
    pub fn use_shared_plugin(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), MuxError> {
        self.ensure_mutable("plugin registration")?;
        self.dispatcher.add_middleware(plugin);
        info!(
            plugin_count = self.dispatcher.middlewares().len(),
            "Plugin registered"
        );
        Ok(())
    }

    /// Dispatch a request in-process, without the transport.
    pub fn dispatch(&self, res: &mut HandlerResponse, req: &mut HandlerRequest) -> RouteOutcome {
        self.dispatcher.dispatch(res, req)
    }

    /// Freeze the configuration and start serving on `address:port`.
    ///
    /// Applies the [`RuntimeConfig`] to the coroutine runtime, starts the
    /// server and returns once it accepts connections.
    ///
    /// # Errors
    ///
    /// - [`MuxError::AlreadyListening`] if a server is running
    /// - [`MuxError::InvalidAddress`] if `address:port` does not resolve
    /// - [`MuxError::Transport`] if binding fails or the server never comes up
    pub fn listen(&mut self, address: &str, port: &str) -> Result<(), MuxError> {
        if let Some(server) = &self.server {
            return Err(MuxError::AlreadyListening(server.addr().to_string()));
        }
        let addr = resolve_addr(address, port)?;

        let dispatcher = match &self.frozen {
            Some(frozen) => Arc::clone(frozen),
            None => {
                let frozen = Arc::new(self.dispatcher.clone());
                self.frozen = Some(Arc::clone(&frozen));
                info!(
                    route_count = frozen.router().route_count(),
                    plugin_count = frozen.middlewares().len(),
                    base_path = %frozen.base_path(),
                    "Route table frozen"
                );
                frozen.router().dump_routes();
                frozen
            }
        };

        self.runtime_config.apply();
        let handle = HttpServer(MuxService::new(dispatcher)).start(addr)?;
        if let Err(e) = handle.wait_ready() {
            handle.stop();
            return Err(e.into());
        }
        self.server = Some(handle);
        Ok(())
    }

    /// Stop the server, if one is running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.server.take() {
            handle.stop();
        }
    }

    /// Block until the server exits.
    ///
    /// Returns immediately when not listening.
    ///
    /// # Errors
    ///
    /// [`MuxError::Transport`] if the server coroutine panicked.
    pub fn join(&mut self) -> Result<(), MuxError> {
        match self.server.take() {
            Some(handle) => handle.join().map_err(|_| {
                MuxError::Transport(std::io::Error::other("server coroutine panicked"))
            }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.server.is_some()
    }

    /// True once `listen` has been called; registration is closed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Address the running server was bound to.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ServerHandle::addr)
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        self.dispatcher.base_path()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), MuxError> {
        if self.frozen.is_some() {
            error!(operation, "Configuration change rejected after listen");
            return Err(MuxError::Frozen(operation));
        }
        Ok(())
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Join `address` and `port` into a socket address; bare IPv6 hosts are
/// bracketed.
fn resolve_addr(address: &str, port: &str) -> Result<SocketAddr, MuxError> {
    let host = if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]")
    } else {
        address.to_string()
    };
    let joined = format!("{host}:{port}");
    joined
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or(MuxError::InvalidAddress(joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_addr() {
        assert_eq!(
            resolve_addr("127.0.0.1", "8080").ok(),
            "127.0.0.1:8080".parse().ok()
        );
        assert_eq!(resolve_addr("::1", "9000").ok(), "[::1]:9000".parse().ok());
        assert!(matches!(
            resolve_addr("127.0.0.1", "notaport"),
            Err(MuxError::InvalidAddress(a)) if a == "127.0.0.1:notaport"
        ));
    }

    #[test]
    fn test_registration_failure_leaves_table_untouched() {
        let mut mux = Multiplexer::new();
        mux.get("/ok", |_: &mut HandlerResponse, _: &HandlerRequest| {})
            .unwrap();
        let err = mux
            .get("/users/{id:[0-9+}", |_: &mut HandlerResponse, _: &HandlerRequest| {})
            .unwrap_err();
        assert!(matches!(err, MuxError::Pattern(_)));
        assert_eq!(mux.router().route_count(), 1);
    }

    #[test]
    fn test_not_listening_by_default() {
        let mut mux = Multiplexer::new();
        assert!(!mux.is_listening());
        assert!(!mux.is_frozen());
        assert!(mux.local_addr().is_none());
        assert!(mux.join().is_ok());
    }
}
