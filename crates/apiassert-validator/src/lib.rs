//! apiassert-validator: OpenAPI contract assertions for HTTP acceptance tests
//!
//! Loads an OpenAPI 3.x or Swagger 2.0 document and checks the last
//! exchange of a REST test client against it:
//!
//! - [`RequestValidator`]: matches the request to an operation, then checks
//!   parameters, content type and body
//! - [`ResponseValidator`]: checks status, headers and body of the response
//!   to an addressed operation
//! - [`ValidationFacade`] / [`AssertionProvider`]: the `see_*_is_valid`
//!   assertions a test calls

pub mod builder;
pub mod cache;
mod checks;
pub mod document;
pub mod error;
pub mod facade;
pub mod module;
pub mod recorder;
pub mod request;
pub mod response;
pub mod spec;

pub use builder::ValidatorBuilder;
pub use cache::SchemaCache;
pub use document::SchemaDocument;
pub use error::{DEPENDENCY_MESSAGE, ValidationFailed, ValidatorError};
pub use facade::{AssertionError, AssertionProvider, ValidationFacade};
pub use module::ModuleBuilder;
pub use recorder::RecordingClient;
pub use request::RequestValidator;
pub use response::ResponseValidator;
pub use spec::{Operation, ParamLocation, StatusKey};
