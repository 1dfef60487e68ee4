use std::sync::OnceLock;

use dashmap::DashMap;
use http::Method;
use may_minihttp::Response;
use serde_json::{json, Value};
use smallvec::SmallVec;
use tracing::error;

use crate::dispatcher::{HandlerResponse, MAX_INLINE_HEADERS};

/// Upper bound on distinct dynamic header lines kept alive for the process.
pub const MAX_INTERNED_HEADERS: usize = 4096;

const JSON_CONTENT_TYPE: &str = "Content-Type: application/json";
const TEXT_CONTENT_TYPE: &str = "Content-Type: text/plain";

/// Interned `name: value` lines.
///
/// may_minihttp only accepts `&'static str` header lines, so each distinct
/// line is leaked once and reused for every later response carrying it.
/// Handler headers count against `capacity`; `Allow` lines do not, since the
/// frozen route table bounds how many distinct ones exist.
pub(crate) struct HeaderInterner {
    lines: DashMap<String, &'static str>,
    capacity: usize,
}

impl HeaderInterner {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            lines: DashMap::new(),
            capacity,
        }
    }

    /// A `'static` copy of `line`, or `None` once `capacity` lines are held.
    pub(crate) fn intern(&self, line: String) -> Option<&'static str> {
        if let Some(existing) = self.lines.get(&line) {
            return Some(*existing);
        }
        if self.lines.len() >= self.capacity {
            return None;
        }
        Some(self.insert(line))
    }

    fn intern_unbounded(&self, line: String) -> &'static str {
        match self.lines.get(&line) {
            Some(existing) => *existing,
            None => self.insert(line),
        }
    }

    fn insert(&self, line: String) -> &'static str {
        let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
        *self.lines.entry(line).or_insert(leaked)
    }

    /// Resolve every handler header, or return the name of the first one that
    /// no longer fits.
    pub(crate) fn resolve<'h>(
        &self,
        headers: impl IntoIterator<Item = (&'h str, &'h str)>,
    ) -> Result<SmallVec<[&'static str; MAX_INLINE_HEADERS]>, String> {
        headers
            .into_iter()
            .map(|(name, value)| {
                self.intern(format!("{name}: {value}"))
                    .ok_or_else(|| name.to_string())
            })
            .collect()
    }
}

fn interner() -> &'static HeaderInterner {
    static INTERNER: OnceLock<HeaderInterner> = OnceLock::new();
    INTERNER.get_or_init(|| HeaderInterner::new(MAX_INTERNED_HEADERS))
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// HEAD responses carry headers only.
fn write_body(res: &mut Response, method: &Method, body: Vec<u8>) {
    if *method != Method::HEAD {
        res.body_vec(body);
    }
}

/// Write a handler's response to the wire.
///
/// A string body is sent as `text/plain`, anything else as JSON, unless the
/// handler set its own `content-type`. If a handler header cannot be interned
/// the whole response is replaced by a 500 rather than sent without it.
pub fn write_handler_response(res: &mut Response, method: &Method, response: HandlerResponse) {
    let HandlerResponse {
        status,
        headers,
        body,
    } = response;

    let resolved = interner().resolve(headers.iter().map(|(k, v)| (&**k, v.as_str())));
    let lines = match resolved {
        Ok(lines) => lines,
        Err(name) => {
            error!(
                header = %name,
                max = MAX_INTERNED_HEADERS,
                "Response header table full, answering 500"
            );
            write_json_error(
                res,
                method,
                500,
                json!({ "error": "Internal Server Error", "reason": "response header capacity exhausted" }),
            );
            return;
        }
    };

    res.status_code(usize::from(status), status_reason(status));
    for line in lines {
        res.header(line);
    }
    let has_content_type = headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));

    match body {
        Value::String(s) => {
            if !has_content_type {
                res.header(TEXT_CONTENT_TYPE);
            }
            write_body(res, method, s.into_bytes());
        }
        other => {
            if !has_content_type {
                res.header(JSON_CONTENT_TYPE);
            }
            match serde_json::to_vec(&other) {
                Ok(bytes) => write_body(res, method, bytes),
                Err(e) => {
                    error!(error = %e, "Failed to serialize response body");
                    write_body(res, method, Vec::new());
                }
            }
        }
    }
}

pub fn write_json_error(res: &mut Response, method: &Method, status: u16, body: Value) {
    res.status_code(usize::from(status), status_reason(status));
    res.header(JSON_CONTENT_TYPE);
    write_body(res, method, body.to_string().into_bytes());
}

pub fn write_not_found(res: &mut Response, method: &Method, path: &str) {
    write_json_error(
        res,
        method,
        404,
        json!({ "error": "Not Found", "method": method.as_str(), "path": path }),
    );
}

/// 405 with an `Allow` header listing the methods that do match the path.
pub fn write_method_not_allowed(res: &mut Response, method: &Method, allowed: &[Method]) {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    res.header(interner().intern_unbounded(format!("Allow: {allow}")));
    write_json_error(
        res,
        method,
        405,
        json!({ "error": "Method Not Allowed", "method": method.as_str(), "allowed": allow }),
    );
}
