//! apiassert-core: Exchange model and message adaptation for OpenAPI assertions
//!
//! This crate turns the last exchange of a REST test client into standard
//! `http` wire messages, derives the path template used to address an
//! OpenAPI operation, and defines the outcome type validators report.

pub mod adapter;
pub mod config;
pub mod exchange;
pub mod message;
pub mod outcome;
pub mod schema;
pub mod template;

pub use adapter::{AdapterError, MessageAdapter};
pub use config::{Config, ConfigError};
pub use exchange::{
    ClientRequest, ClientResponse, ExchangeError, HeaderSource, RecordedExchange, RestClient,
};
pub use message::{HeaderValues, WireRequest, WireResponse};
pub use outcome::ValidationOutcome;
pub use template::{ID_PLACEHOLDER, OperationAddress, path_template};
