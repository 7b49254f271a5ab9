//! Request validation against the operation its path and method match

use std::borrow::Cow;
use std::sync::Arc;

use apiassert_core::message::content_type;
use apiassert_core::{OperationAddress, WireRequest};

use crate::checks::{check_body, coerce, find_media, schema_errors};
use crate::document::{LookupMiss, SchemaDocument};
use crate::error::ValidationFailed;
use crate::spec::{ParamLocation, Parameter};

/// Header parameters OpenAPI says to ignore; they are described elsewhere.
const RESERVED_HEADERS: &[&str] = &["accept", "content-type", "authorization"];

/// Validates wire requests against one document.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    document: Arc<SchemaDocument>,
}

impl RequestValidator {
    #[must_use]
    pub fn new(document: Arc<SchemaDocument>) -> Self {
        Self { document }
    }

    /// Check a request; on success returns the address of the matched operation.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found: unknown path or method, unresolved
    /// reference, missing/invalid parameter, body or content type.
    pub fn validate(&self, request: &WireRequest) -> Result<OperationAddress, ValidationFailed> {
        let path = request.uri().path();
        let method = request.method().as_str();
        let root = self.document.root();

        let matched = self
            .document
            .match_request(path, method)
            .map_err(|miss| match miss {
                LookupMiss::NoPath => ValidationFailed::NoMatchingPath {
                    method: method.to_string(),
                    path: path.to_string(),
                },
                LookupMiss::NoMethod(m) => {
                    ValidationFailed::NoSuchOperation(OperationAddress::new(path, &m))
                }
            })?;
        let op = matched.operation;
        op.ensure_resolved()?;
        let label = op.label();
        let path_params = decode_path_params(&label, &matched.path_params)?;

        let query: Vec<(String, String)> = request
            .uri()
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let cookies = request_cookies(request);

        for param in &op.parameters {
            let values: Vec<&str> = match param.location {
                ParamLocation::Path => path_params
                    .iter()
                    .filter(|(name, _)| *name == param.name)
                    .map(|(_, v)| v.as_ref())
                    .collect(),
                ParamLocation::Query => {
                    let array_name = format!("{}[]", param.name);
                    query
                        .iter()
                        .filter(|(k, _)| *k == param.name || *k == array_name)
                        .map(|(_, v)| v.as_str())
                        .collect()
                }
                ParamLocation::Header => {
                    if RESERVED_HEADERS.contains(&param.name.to_ascii_lowercase().as_str()) {
                        continue;
                    }
                    request
                        .headers()
                        .get_all(param.name.as_str())
                        .iter()
                        .filter_map(|v| v.to_str().ok())
                        .collect()
                }
                ParamLocation::Cookie => cookies
                    .iter()
                    .filter(|(k, _)| *k == param.name)
                    .map(|(_, v)| *v)
                    .collect(),
            };

            if values.is_empty() {
                if param.required {
                    return Err(ValidationFailed::MissingParameter {
                        operation: label,
                        location: param.location,
                        name: param.name.clone(),
                    });
                }
                continue;
            }
            self.check_parameter(&label, param, &values)?;
        }

        if let Some(rb) = &op.request_body {
            let body = request.body();
            if body.is_empty() {
                if rb.required {
                    return Err(ValidationFailed::MissingBody { operation: label });
                }
            } else if !rb.content.is_empty() {
                let context = format!("request of {label}");
                let expected: Vec<String> = rb.content.keys().cloned().collect();
                let Some(media) = content_type(request.headers()) else {
                    return Err(ValidationFailed::ContentType {
                        context,
                        found: None,
                        expected,
                    });
                };
                let Some(schema) = find_media(&rb.content, &media) else {
                    return Err(ValidationFailed::ContentType {
                        context,
                        found: Some(media),
                        expected,
                    });
                };
                check_body(root, &media, schema.as_ref(), body, &context)?;
            }
        }

        Ok(OperationAddress::new(op.path.clone(), &op.method))
    }

    fn check_parameter(
        &self,
        operation: &str,
        param: &Parameter,
        values: &[&str],
    ) -> Result<(), ValidationFailed> {
        let root = self.document.root();
        let instance = coerce(values, &param.schema, root);
        let context = format!("{} parameter \"{}\" of {operation}", param.location, param.name);
        let errors = schema_errors(root, &param.schema, &instance, &context)?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailed::InvalidParameter {
                operation: operation.to_string(),
                location: param.location,
                name: param.name.clone(),
                message: errors.join("; "),
            })
        }
    }
}

/// Captured path segments are still percent-encoded; schemas see the decoded text.
fn decode_path_params<'a>(
    operation: &str,
    raw: &'a [(String, String)],
) -> Result<Vec<(&'a str, Cow<'a, str>)>, ValidationFailed> {
    raw.iter()
        .map(|(name, value)| {
            percent_encoding::percent_decode_str(value)
                .decode_utf8()
                .map(|decoded| (name.as_str(), decoded))
                .map_err(|e| ValidationFailed::InvalidParameter {
                    operation: operation.to_string(),
                    location: ParamLocation::Path,
                    name: name.clone(),
                    message: format!("invalid percent-encoding: {e}"),
                })
        })
        .collect()
}

/// `Cookie: a=1; b=2` → `[("a", "1"), ("b", "2")]`
fn request_cookies(request: &WireRequest) -> Vec<(&str, &str)> {
    request
        .headers()
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .collect()
}
