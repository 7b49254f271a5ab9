//! Client-side exchange types and the collaborator traits the adapter reads from.
//!
//! A REST test client keeps its own notion of the last request and response
//! (method, URI, content); the headers it sends live in a separate browser
//! collaborator. Both are abstracted here so any client can plug in.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::message::HeaderValues;

/// Last request as recorded by the test client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientRequest {
    /// HTTP method, e.g. "GET"
    pub method: String,
    /// Absolute URI, e.g. "http://localhost/users/42?full=1"
    pub uri: String,
    /// Raw request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ClientRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            content: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Last response as recorded by the test client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, name → values
    #[serde(default)]
    pub headers: HeaderValues,
    /// Raw response body
    #[serde(default)]
    pub content: String,
}

impl ClientResponse {
    #[must_use]
    pub fn new(status: u16, content: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderValues::new(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }
}

/// A REST test client that remembers its last exchange.
pub trait RestClient {
    /// Last request sent, `None` before the first exchange.
    fn last_request(&self) -> Option<&ClientRequest>;
    /// Last response received, `None` before the first exchange.
    fn last_response(&self) -> Option<&ClientResponse>;
}

/// Supplies the headers the browser sent with the last request.
pub trait HeaderSource {
    fn headers(&self) -> &HeaderValues;
}

impl<T: RestClient + ?Sized> RestClient for &T {
    fn last_request(&self) -> Option<&ClientRequest> {
        (**self).last_request()
    }

    fn last_response(&self) -> Option<&ClientResponse> {
        (**self).last_response()
    }
}

impl<T: HeaderSource + ?Sized> HeaderSource for &T {
    fn headers(&self) -> &HeaderValues {
        (**self).headers()
    }
}

/// One exchange captured to (or loaded from) a JSON file.
///
/// Acts as both collaborators, so a recorded exchange can be validated
/// without a live client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordedExchange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ClientRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ClientResponse>,
    /// Request headers sent by the browser
    #[serde(default)]
    pub headers: HeaderValues,
}

impl RecordedExchange {
    #[must_use]
    pub fn new(request: ClientRequest, response: ClientResponse) -> Self {
        Self {
            request: Some(request),
            response: Some(response),
            headers: HeaderValues::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Load a recorded exchange from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid exchange.
    pub fn load(path: &Path) -> Result<Self, ExchangeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExchangeError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content).map_err(|e| ExchangeError::Parse(e.to_string()))
    }
}

impl RestClient for RecordedExchange {
    fn last_request(&self) -> Option<&ClientRequest> {
        self.request.as_ref()
    }

    fn last_response(&self) -> Option<&ClientResponse> {
        self.response.as_ref()
    }
}

impl HeaderSource for RecordedExchange {
    fn headers(&self) -> &HeaderValues {
        &self.headers
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid exchange: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_exchange() {
        let json = r#"{
            "request": {"method": "GET", "uri": "http://localhost/users/42"},
            "response": {"status": 200, "content": "{\"id\":42}"}
        }"#;
        let ex: RecordedExchange = serde_json::from_str(json).unwrap();
        assert_eq!(ex.last_request().unwrap().method, "GET");
        assert!(ex.last_request().unwrap().content.is_none());
        assert_eq!(ex.last_response().unwrap().status, 200);
        assert!(ex.last_response().unwrap().headers.is_empty());
        assert!(ex.headers().is_empty());
    }

    #[test]
    fn deserialize_with_headers() {
        let json = r#"{
            "request": {"method": "POST", "uri": "http://localhost/users", "content": "{}"},
            "response": {
                "status": 201,
                "headers": {"Content-Type": ["application/json"], "Set-Cookie": ["a=1", "b=2"]},
                "content": ""
            },
            "headers": {"Content-Type": ["application/json"]}
        }"#;
        let ex: RecordedExchange = serde_json::from_str(json).unwrap();
        let resp = ex.last_response().unwrap();
        assert_eq!(resp.headers["Set-Cookie"], vec!["a=1", "b=2"]);
        assert_eq!(ex.headers()["Content-Type"], vec!["application/json"]);
    }

    #[test]
    fn empty_exchange_has_nothing_recorded() {
        let ex = RecordedExchange::default();
        assert!(ex.last_request().is_none());
        assert!(ex.last_response().is_none());
    }

    #[test]
    fn builders_append_header_values() {
        let resp = ClientResponse::new(200, "")
            .with_header("Vary", "Accept")
            .with_header("Vary", "Origin");
        assert_eq!(resp.headers["Vary"], vec!["Accept", "Origin"]);

        let ex = RecordedExchange::new(ClientRequest::new("GET", "http://x/"), resp)
            .with_header("Accept", "application/json");
        assert_eq!(ex.headers["Accept"], vec!["application/json"]);
    }

    #[test]
    fn borrowed_client_delegates() {
        fn status_of(client: impl RestClient) -> Option<u16> {
            client.last_response().map(|r| r.status)
        }
        let ex = RecordedExchange::new(
            ClientRequest::new("GET", "http://x/"),
            ClientResponse::new(204, ""),
        );
        assert_eq!(status_of(&ex), Some(204));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange.json");
        let ex = RecordedExchange::new(
            ClientRequest::new("DELETE", "http://localhost/users/1"),
            ClientResponse::new(204, ""),
        );
        std::fs::write(&path, serde_json::to_string(&ex).unwrap()).unwrap();

        let loaded = RecordedExchange::load(&path).unwrap();
        assert_eq!(loaded, ex);
    }

    #[test]
    fn load_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = RecordedExchange::load(&path).unwrap_err();
        assert!(matches!(err, ExchangeError::Parse(_)));
    }
}
