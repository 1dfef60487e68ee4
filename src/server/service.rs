use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{error, warn};

use super::request::parse_request;
use super::response::{
    write_handler_response, write_json_error, write_method_not_allowed, write_not_found,
};
use crate::dispatcher::{panic_message, Dispatcher, HandlerResponse};
use crate::router::RouteOutcome;

/// `may_minihttp` service driving a frozen [`Dispatcher`].
///
/// Cloned once per connection; every clone shares the same dispatcher.
pub struct MuxService {
    dispatcher: Arc<Dispatcher>,
}

impl MuxService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Clone for MuxService {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl HttpService for MuxService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let mut request = match parse_request(req) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejecting request with invalid method");
                write_json_error(res, &Method::GET, 400, json!({ "error": "Bad Request" }));
                return Ok(());
            }
        };
        let mut response = HandlerResponse::default();

        // Handler panics are contained by the dispatcher; this guards plugins.
        let dispatcher = &self.dispatcher;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.dispatch(&mut response, &mut request)
        }));

        match outcome {
            Ok(RouteOutcome::Matched { .. }) => {
                write_handler_response(res, &request.method, response);
            }
            Ok(RouteOutcome::NotFound) => write_not_found(res, &request.method, &request.path),
            Ok(RouteOutcome::MethodNotAllowed { allowed }) => {
                write_method_not_allowed(res, &request.method, &allowed);
            }
            Err(payload) => {
                error!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    panic = %panic_message(payload.as_ref()),
                    "Plugin panicked during dispatch"
                );
                write_json_error(
                    res,
                    &request.method,
                    500,
                    json!({ "error": "Internal Server Error" }),
                );
            }
        }
        Ok(())
    }
}
