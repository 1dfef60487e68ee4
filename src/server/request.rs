use std::io::Read;
use std::sync::Arc;

use http::Method;
use may_minihttp::Request;
use tracing::debug;

use crate::dispatcher::{HandlerRequest, HeaderVec};
use crate::ids::RequestId;

/// Convert a raw `may_minihttp` request into a [`HandlerRequest`].
///
/// Header names are lowercased. A body that parses as JSON is attached;
/// anything else is dropped.
///
/// # Errors
///
/// Returns an error if the method token is not a valid HTTP method.
pub fn parse_request(req: Request) -> Result<HandlerRequest, http::method::InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let mut parsed = HandlerRequest::new(method, req.path());

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase()),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();
    parsed.request_id = RequestId::from_headers(&headers);
    parsed.headers = headers;

    let mut body = String::new();
    if let Ok(size) = req.body().read_to_string(&mut body) {
        if size > 0 {
            parsed.body = serde_json::from_str(&body).ok();
            debug!(
                request_id = %parsed.request_id,
                body_size_bytes = size,
                json = parsed.body.is_some(),
                "Request body read"
            );
        }
    }

    debug!(
        request_id = %parsed.request_id,
        request_id_propagated = parsed.request_id.is_propagated(),
        method = %parsed.method,
        path = %parsed.path,
        headers_count = parsed.headers.len(),
        query_count = parsed.query_params.len(),
        "HTTP request parsed"
    );

    Ok(parsed)
}
