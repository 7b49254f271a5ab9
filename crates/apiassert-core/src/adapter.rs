//! Client exchange → wire message conversion
//!
//! No I/O. The request headers come from the header source, not from the
//! client request, because that is where the browser keeps them.

use crate::exchange::{ClientRequest, ClientResponse, HeaderSource, RestClient};
use crate::message::{HeaderValues, WireRequest, WireResponse};

/// Converts the last exchange of a REST client into wire messages.
#[derive(Debug)]
pub struct MessageAdapter<R, H> {
    rest: R,
    browser: H,
}

impl<R: RestClient, H: HeaderSource> MessageAdapter<R, H> {
    #[must_use]
    pub fn new(rest: R, browser: H) -> Self {
        Self { rest, browser }
    }

    #[must_use]
    pub fn rest(&self) -> &R {
        &self.rest
    }

    pub fn rest_mut(&mut self) -> &mut R {
        &mut self.rest
    }

    #[must_use]
    pub fn browser(&self) -> &H {
        &self.browser
    }

    /// Last request in the client's own representation.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NoRequest`] before the first exchange.
    pub fn request(&self) -> Result<&ClientRequest, AdapterError> {
        self.rest.last_request().ok_or(AdapterError::NoRequest)
    }

    /// Last response in the client's own representation.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NoResponse`] before the first exchange.
    pub fn response(&self) -> Result<&ClientResponse, AdapterError> {
        self.rest.last_response().ok_or(AdapterError::NoResponse)
    }

    /// Last request as a wire message.
    ///
    /// # Errors
    ///
    /// Returns error if no request was recorded or it cannot be represented
    /// as an HTTP message (bad method, URI or header).
    pub fn wire_request(&self) -> Result<WireRequest, AdapterError> {
        let request = self.request()?;
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.uri.as_str());
        if let Some(headers) = builder.headers_mut() {
            append_headers(headers, self.browser.headers())?;
        }
        let body = request.content.clone().unwrap_or_default().into_bytes();
        builder.body(body).map_err(|e| {
            AdapterError::InvalidRequest(format!("{} {}: {e}", request.method, request.uri))
        })
    }

    /// Last response as a wire message.
    ///
    /// # Errors
    ///
    /// Returns error if no response was recorded or it cannot be represented
    /// as an HTTP message (bad status or header).
    pub fn wire_response(&self) -> Result<WireResponse, AdapterError> {
        let response = self.response()?;
        let mut builder = http::Response::builder().status(response.status);
        if let Some(headers) = builder.headers_mut() {
            append_headers(headers, &response.headers)?;
        }
        builder
            .body(response.content.clone().into_bytes())
            .map_err(|e| AdapterError::InvalidResponse(format!("status {}: {e}", response.status)))
    }
}

fn append_headers(map: &mut http::HeaderMap, values: &HeaderValues) -> Result<(), AdapterError> {
    for (name, list) in values {
        let header_name = http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AdapterError::InvalidHeader(name.clone()))?;
        for value in list {
            let header_value = http::HeaderValue::from_str(value)
                .map_err(|_| AdapterError::InvalidHeader(name.clone()))?;
            map.append(header_name.clone(), header_value);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("No request recorded yet: send a request before validating it")]
    NoRequest,
    #[error("No response recorded yet: send a request before validating its response")]
    NoResponse,
    #[error("Invalid request {0}")]
    InvalidRequest(String),
    #[error("Invalid response {0}")]
    InvalidResponse(String),
    #[error("Invalid header {0}")]
    InvalidHeader(String),
}
