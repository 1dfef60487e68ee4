//! # Server Module
//!
//! Adapter between `may_minihttp` and the [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! Each connection runs in its own coroutine with a clone of [`MuxService`],
//! which parses the wire request, dispatches it and translates the outcome:
//!
//! | Outcome              | Response                                   |
//! |----------------------|--------------------------------------------|
//! | `Matched`            | the handler's status, headers and body     |
//! | `NotFound`           | `404` JSON error                           |
//! | `MethodNotAllowed`   | `405` JSON error with an `Allow` header    |
//! | handler/plugin panic | `500` JSON error                           |
//! | header table full    | `500` JSON error                           |
//! | unparseable method   | `400` JSON error                           |
//!
//! HEAD responses are written without a body.

mod http_server;
mod request;
mod response;
mod service;

pub use self::http_server::{HttpServer, ServerHandle};
pub use self::request::parse_request;
pub use self::response::{write_handler_response, write_json_error, MAX_INTERNED_HEADERS};
pub use self::service::MuxService;
