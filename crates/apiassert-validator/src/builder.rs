//! Validator construction from a schema file or text

use std::path::Path;
use std::sync::Arc;

use crate::document::{SchemaDocument, parse_json, parse_yaml, read_document};
use crate::error::ValidatorError;
use crate::request::RequestValidator;
use crate::response::ResponseValidator;

/// Holds one parsed document and hands out validators sharing it.
#[derive(Debug, Clone)]
pub struct ValidatorBuilder {
    document: Arc<SchemaDocument>,
}

impl ValidatorBuilder {
    /// # Errors
    ///
    /// Returns error if the file is missing or not a YAML OpenAPI document.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ValidatorError> {
        Self::from_yaml(&read_document(path)?)
    }

    /// # Errors
    ///
    /// Returns error if the file is missing or not a JSON OpenAPI document.
    pub fn from_json_file(path: &Path) -> Result<Self, ValidatorError> {
        Self::from_json(&read_document(path)?)
    }

    /// Format picked from the extension, else sniffed from the content.
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing or not an OpenAPI document.
    pub fn from_file(path: &Path) -> Result<Self, ValidatorError> {
        SchemaDocument::load(path).map(Self::from_document)
    }

    /// # Errors
    ///
    /// Returns error if the text is not a YAML OpenAPI document.
    pub fn from_yaml(content: &str) -> Result<Self, ValidatorError> {
        SchemaDocument::from_value(parse_yaml(content)?).map(Self::from_document)
    }

    /// # Errors
    ///
    /// Returns error if the text is not a JSON OpenAPI document.
    pub fn from_json(content: &str) -> Result<Self, ValidatorError> {
        SchemaDocument::from_value(parse_json(content)?).map(Self::from_document)
    }

    #[must_use]
    pub fn from_document(document: impl Into<Arc<SchemaDocument>>) -> Self {
        Self {
            document: document.into(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Arc<SchemaDocument> {
        &self.document
    }

    #[must_use]
    pub fn request_validator(&self) -> RequestValidator {
        RequestValidator::new(Arc::clone(&self.document))
    }

    #[must_use]
    pub fn response_validator(&self) -> ResponseValidator {
        ResponseValidator::new(Arc::clone(&self.document))
    }
}
