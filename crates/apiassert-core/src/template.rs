//! Concrete request path → OpenAPI path template
//!
//! Purely syntactic: numeric segments are assumed to be identifiers. The
//! document is never consulted, so a literal numeric segment (`/reports/2024`)
//! is templated as well, and distinct placeholders (`{userId}`, `{orderId}`)
//! all come out as `{id}`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::message::WireRequest;

/// Placeholder substituted for numeric path segments.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Replace every all-digit path segment with `{id}`.
///
/// `/orders/42/items/7` → `/orders/{id}/items/{id}`
#[must_use]
pub fn path_template(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_numeric_segment(segment) {
                ID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_numeric_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Identifies one operation of the document: path template + lower-cased method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct OperationAddress {
    pub path: String,
    pub method: String,
}

impl OperationAddress {
    #[must_use]
    pub fn new(path: impl Into<String>, method: &str) -> Self {
        Self {
            path: path.into(),
            method: method.to_ascii_lowercase(),
        }
    }

    /// Address of the operation a request was sent to, numeric segments templated.
    #[must_use]
    pub fn from_request(request: &WireRequest) -> Self {
        Self::new(
            path_template(request.uri().path()),
            request.method().as_str(),
        )
    }
}

impl fmt::Display for OperationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.path, self.method)
    }
}
