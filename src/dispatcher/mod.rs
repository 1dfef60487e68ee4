//! # Dispatcher Module
//!
//! Turns a parsed request into a handler invocation.
//!
//! ## Overview
//!
//! The [`Dispatcher`] owns the three things dispatch reads: the base path, the
//! route table and the plugin chain. While the multiplexer is being configured
//! it is mutated in place; when serving starts it is frozen into an
//! `Arc<Dispatcher>` that every connection shares without locking.
//!
//! ## Request Flow
//!
//! 1. Every plugin's `before` hook runs, in registration order
//! 2. The base path is stripped (a mismatch is `NotFound`)
//! 3. The remaining path is split into segments
//! 4. The method's candidates are scanned; the first match wins
//! 5. Path parameters are attached and the handler runs
//! 6. Every plugin's `after` hook runs with the outcome and latency
//!
//! ## Outcomes
//!
//! Dispatch never fails. It returns a [`RouteOutcome`](crate::router::RouteOutcome)
//! that the transport translates into a protocol response:
//! - `Matched` - the handler populated the response
//! - `NotFound` - no pattern matched (or the base path did not)
//! - `MethodNotAllowed` - the method has no routes at all
//!
//! A panicking handler is contained inside dispatch and turned into a 500
//! response with a `Matched` outcome.

mod core;

pub use self::core::{Dispatcher, HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};
pub(crate) use self::core::panic_message;
