//! Wire messages: the `http` crate representation validators work on.

use std::collections::BTreeMap;

/// Request as seen on the wire: method, absolute URI, headers, raw body.
pub type WireRequest = http::Request<Vec<u8>>;

/// Response as seen on the wire: status, headers, raw body.
pub type WireResponse = http::Response<Vec<u8>>;

/// Header name → ordered values, as kept by test clients.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Media type of a `Content-Type` value, parameters and case stripped.
///
/// `"Application/JSON; charset=utf-8"` → `"application/json"`
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Whether a media type carries JSON (`application/json`, `application/problem+json`, ...).
#[must_use]
pub fn is_json_media_type(media: &str) -> bool {
    media == "application/json" || media.ends_with("+json") || media.ends_with("/json")
}

/// `Content-Type` header of a wire message, if present and readable.
#[must_use]
pub fn content_type(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
}
