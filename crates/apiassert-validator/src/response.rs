//! Response validation against an addressed operation

use std::sync::Arc;

use apiassert_core::message::content_type;
use apiassert_core::{OperationAddress, WireResponse};

use crate::checks::{check_body, coerce, find_media, schema_errors};
use crate::document::SchemaDocument;
use crate::error::ValidationFailed;

/// Validates wire responses against one document.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    document: Arc<SchemaDocument>,
}

impl ResponseValidator {
    #[must_use]
    pub fn new(document: Arc<SchemaDocument>) -> Self {
        Self { document }
    }

    /// Check a response to the operation at `address`.
    ///
    /// The address path must equal a declared path template exactly
    /// (after stripping a server base path); it is not pattern-matched.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found: unknown operation, unresolved
    /// reference, undeclared status, missing/invalid header, content type
    /// or body.
    pub fn validate(
        &self,
        address: &OperationAddress,
        response: &WireResponse,
    ) -> Result<(), ValidationFailed> {
        let root = self.document.root();
        let op = self
            .document
            .find_operation(&address.path, &address.method)
            .ok_or_else(|| ValidationFailed::NoSuchOperation(address.clone()))?;
        op.ensure_resolved()?;

        let status = response.status().as_u16();
        let spec = op
            .response_for(status)
            .ok_or_else(|| ValidationFailed::UndeclaredStatus {
                operation: op.label(),
                status,
                declared: op.declared_statuses(),
            })?;
        let context = format!("response of {} {status}", op.label());

        for header in &spec.headers {
            // Content-Type is described by `content`, not `headers`
            if header.name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            let values: Vec<&str> = response
                .headers()
                .get_all(header.name.as_str())
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if values.is_empty() {
                if header.required {
                    return Err(ValidationFailed::MissingHeader {
                        context,
                        name: header.name.clone(),
                    });
                }
                continue;
            }
            if let Some(schema) = &header.schema {
                let instance = coerce(&values, schema, root);
                let errors = schema_errors(root, schema, &instance, &context)?;
                if !errors.is_empty() {
                    return Err(ValidationFailed::InvalidHeader {
                        context,
                        name: header.name.clone(),
                        message: errors.join("; "),
                    });
                }
            }
        }

        let body = response.body();
        if spec.content.is_empty() || body.is_empty() {
            return Ok(());
        }
        let expected: Vec<String> = spec.content.keys().cloned().collect();
        let Some(media) = content_type(response.headers()) else {
            return Err(ValidationFailed::ContentType {
                context,
                found: None,
                expected,
            });
        };
        let Some(schema) = find_media(&spec.content, &media) else {
            return Err(ValidationFailed::ContentType {
                context,
                found: Some(media),
                expected,
            });
        };
        check_body(root, &media, schema.as_ref(), body, &context)
    }
}
