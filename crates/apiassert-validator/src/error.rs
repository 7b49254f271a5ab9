//! Fatal errors and validation failures

use std::path::PathBuf;

use apiassert_core::{AdapterError, OperationAddress};

use crate::spec::ParamLocation;

/// Instructions shown when the validator is set up without its collaborators.
pub const DEPENDENCY_MESSAGE: &str = "\
Please, add REST and Browser module in configuration.
--
modules:
    enabled:
        - ApiValidator:
            depends: [REST, Browser]
--";

/// Problems that stop a test before anything is validated.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("Schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing required module(s): {}\n{}", .0.join(", "), DEPENDENCY_MESSAGE)]
    MissingDependency(Vec<&'static str>),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// A message that does not conform to the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailed {
    #[error("OpenAPI spec contains no path matching {method} {path}")]
    NoMatchingPath { method: String, path: String },
    #[error("OpenAPI spec contains no such operation {0}")]
    NoSuchOperation(OperationAddress),
    #[error("Unresolvable reference {reference} in {operation}")]
    UnresolvedReference { operation: String, reference: String },
    #[error("Schema for {context} cannot be compiled: {message}")]
    InvalidSchema { context: String, message: String },
    #[error("Status {status} is not declared for {operation} (declared: {})", .declared.join(", "))]
    UndeclaredStatus {
        operation: String,
        status: u16,
        declared: Vec<String>,
    },
    #[error("Missing required {location} parameter \"{name}\" for {operation}")]
    MissingParameter {
        operation: String,
        location: ParamLocation,
        name: String,
    },
    #[error("Invalid {location} parameter \"{name}\" for {operation}: {message}")]
    InvalidParameter {
        operation: String,
        location: ParamLocation,
        name: String,
        message: String,
    },
    #[error("Missing required header \"{name}\" in {context}")]
    MissingHeader { context: String, name: String },
    #[error("Invalid header \"{name}\" in {context}: {message}")]
    InvalidHeader {
        context: String,
        name: String,
        message: String,
    },
    #[error("Request body is required for {operation}")]
    MissingBody { operation: String },
    #[error("{}", content_type_message(.context, .found.as_deref(), .expected))]
    ContentType {
        context: String,
        found: Option<String>,
        expected: Vec<String>,
    },
    #[error("Body of {context} is not valid JSON: {message}")]
    MalformedBody { context: String, message: String },
    #[error("Body of {context} does not match schema: {}", .errors.join("; "))]
    Body {
        context: String,
        errors: Vec<String>,
    },
}

fn content_type_message(context: &str, found: Option<&str>, expected: &[String]) -> String {
    match found {
        Some(found) => format!(
            "Content-Type \"{found}\" of {context} is not declared (expected one of {expected:?})"
        ),
        None => format!("Missing Content-Type header in {context} (expected one of {expected:?})"),
    }
}
