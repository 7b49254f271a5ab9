//! Validation façade and the assertion capability built on it

use std::path::{Path, PathBuf};

use apiassert_core::{
    HeaderSource, MessageAdapter, OperationAddress, RestClient, ValidationOutcome,
};

use crate::builder::ValidatorBuilder;
use crate::cache::SchemaCache;
use crate::error::ValidatorError;
use crate::request::RequestValidator;
use crate::response::ResponseValidator;

/// Validates the last recorded exchange against the document at `schema_file`.
///
/// Each call reads the document again and validates freshly built wire
/// messages; parsing is skipped while the file content is unchanged.
#[derive(Debug)]
pub struct ValidationFacade<R, H> {
    adapter: MessageAdapter<R, H>,
    schema_file: PathBuf,
    cache: SchemaCache,
}

impl<R: RestClient, H: HeaderSource> ValidationFacade<R, H> {
    /// # Errors
    ///
    /// Returns [`ValidatorError::SchemaNotFound`] if `schema_file` does not exist.
    pub fn new(
        adapter: MessageAdapter<R, H>,
        schema_file: impl Into<PathBuf>,
    ) -> Result<Self, ValidatorError> {
        let schema_file = schema_file.into();
        if !schema_file.is_file() {
            return Err(ValidatorError::SchemaNotFound(schema_file));
        }
        Ok(Self {
            adapter,
            schema_file,
            cache: SchemaCache::new(),
        })
    }

    #[must_use]
    pub fn schema_file(&self) -> &Path {
        &self.schema_file
    }

    #[must_use]
    pub fn adapter(&self) -> &MessageAdapter<R, H> {
        &self.adapter
    }

    /// Mutable access, e.g. to send the next request through the client.
    pub fn adapter_mut(&mut self) -> &mut MessageAdapter<R, H> {
        &mut self.adapter
    }

    fn builder(&self) -> Result<ValidatorBuilder, ValidatorError> {
        self.cache
            .load(&self.schema_file)
            .map(ValidatorBuilder::from_document)
    }

    /// # Errors
    ///
    /// Returns error if the document cannot be loaded.
    pub fn request_validator(&self) -> Result<RequestValidator, ValidatorError> {
        Ok(self.builder()?.request_validator())
    }

    /// # Errors
    ///
    /// Returns error if the document cannot be loaded.
    pub fn response_validator(&self) -> Result<ResponseValidator, ValidatorError> {
        Ok(self.builder()?.response_validator())
    }

    /// Validate the last request.
    ///
    /// # Errors
    ///
    /// Returns error only for fatal problems: the document cannot be loaded
    /// or no request has been recorded. Mismatches are reported in the outcome.
    pub fn validate_request(&self) -> Result<ValidationOutcome, ValidatorError> {
        let validator = self.request_validator()?;
        let request = self.adapter.wire_request()?;
        let outcome = ValidationOutcome::from(validator.validate(&request).map(|_| ()));
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            valid = outcome.valid,
            "request validated"
        );
        Ok(outcome)
    }

    /// Validate the last response against the operation addressed by the
    /// last request's templated path and method.
    ///
    /// # Errors
    ///
    /// Returns error only for fatal problems: the document cannot be loaded
    /// or no exchange has been recorded. Mismatches are reported in the outcome.
    pub fn validate_response(&self) -> Result<ValidationOutcome, ValidatorError> {
        let validator = self.response_validator()?;
        let request = self.adapter.wire_request()?;
        let response = self.adapter.wire_response()?;
        let address = OperationAddress::from_request(&request);
        let outcome = ValidationOutcome::from(validator.validate(&address, &response));
        tracing::debug!(
            %address,
            status = response.status().as_u16(),
            valid = outcome.valid,
            "response validated"
        );
        Ok(outcome)
    }
}

/// Failure of a `see_*` assertion.
#[derive(Debug, thiserror::Error)]
pub enum AssertionError {
    /// The message does not conform to the document
    #[error("{0}")]
    Failed(String),
    /// The assertion could not be evaluated
    #[error(transparent)]
    Fatal(#[from] ValidatorError),
}

/// Contract assertions a test-runner plugin exposes to test authors.
pub trait AssertionProvider {
    /// # Errors
    ///
    /// Returns error if the request cannot be validated at all.
    fn validate_request(&self) -> Result<ValidationOutcome, ValidatorError>;

    /// # Errors
    ///
    /// Returns error if the response cannot be validated at all.
    fn validate_response(&self) -> Result<ValidationOutcome, ValidatorError>;

    /// Assert that the last request conforms to the document.
    ///
    /// # Errors
    ///
    /// [`AssertionError::Failed`] with the validator's message on mismatch.
    fn see_request_is_valid(&self) -> Result<(), AssertionError> {
        self.validate_request()?
            .into_result()
            .map_err(AssertionError::Failed)
    }

    /// Assert that the last response conforms to the document.
    ///
    /// # Errors
    ///
    /// [`AssertionError::Failed`] with the validator's message on mismatch.
    fn see_response_is_valid(&self) -> Result<(), AssertionError> {
        self.validate_response()?
            .into_result()
            .map_err(AssertionError::Failed)
    }
}

impl<R: RestClient, H: HeaderSource> AssertionProvider for ValidationFacade<R, H> {
    fn validate_request(&self) -> Result<ValidationOutcome, ValidatorError> {
        Self::validate_request(self)
    }

    fn validate_response(&self) -> Result<ValidationOutcome, ValidatorError> {
        Self::validate_response(self)
    }
}
