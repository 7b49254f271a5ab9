//! REST client that records its last exchange
//!
//! Plays both collaborator roles: it is the REST client whose last
//! request/response get validated and the browser holding the headers sent.

use std::time::Duration;

use apiassert_core::{
    ClientRequest, ClientResponse, Config, HeaderSource, HeaderValues, RestClient,
};

use crate::error::ValidatorError;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP client remembering the last request sent and response received.
#[derive(Debug)]
pub struct RecordingClient {
    client: reqwest::blocking::Client,
    base_url: url::Url,
    headers: HeaderValues,
    last_request: Option<ClientRequest>,
    last_response: Option<ClientResponse>,
}

impl RecordingClient {
    /// # Errors
    ///
    /// Returns error if `base_url` is not an absolute URL or the HTTP client
    /// cannot be created.
    pub fn new(base_url: &str) -> Result<Self, ValidatorError> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| ValidatorError::Config(format!("invalid base_url {base_url:?}: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| ValidatorError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            headers: HeaderValues::new(),
            last_request: None,
            last_response: None,
        })
    }

    /// Client for `config.base_url`, with `config.headers` preset.
    ///
    /// # Errors
    ///
    /// Returns error if no base URL is configured or it is invalid.
    pub fn from_config(config: &Config) -> Result<Self, ValidatorError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| ValidatorError::Config("base_url is not set".into()))?;
        let mut client = Self::new(base_url)?;
        for (name, value) in &config.headers {
            client.have_http_header(name, value);
        }
        Ok(client)
    }

    /// Send `name: value` with every following request, replacing earlier values.
    pub fn have_http_header(&mut self, name: &str, value: &str) {
        self.delete_header(name);
        self.headers.insert(name.to_string(), vec![value.to_string()]);
    }

    pub fn delete_header(&mut self, name: &str) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    }

    /// Send a request to `path` (relative to the base URL) and record it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Http`] if the method or URL is invalid or
    /// the request fails. The request stays recorded; the response is cleared.
    pub fn send(
        &mut self,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<&ClientResponse, ValidatorError> {
        let url = self.url_for(path)?;
        let mut request = ClientRequest::new(method.to_ascii_uppercase(), url.as_str());
        if let Some(body) = body {
            request = request.with_content(body);
        }
        self.last_request = Some(request);
        self.last_response = None;

        let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ValidatorError::Http(format!("invalid HTTP method '{method}'")))?;
        let mut builder = self.client.request(method, url);
        for (name, values) in &self.headers {
            for value in values {
                builder = builder.header(name, value);
            }
        }
        if let Some(body) = body {
            builder = builder.body(body.to_string());
        }

        let resp = builder
            .send()
            .map_err(|e| ValidatorError::Http(e.to_string()))?;
        let mut response = ClientResponse::new(resp.status().as_u16(), "");
        for (name, value) in resp.headers() {
            if let Ok(value) = value.to_str() {
                response = response.with_header(name.as_str(), value);
            }
        }
        response.content = resp
            .text()
            .map_err(|e| ValidatorError::Http(e.to_string()))?;
        tracing::debug!(
            status = response.status,
            bytes = response.content.len(),
            "response recorded"
        );
        Ok(self.last_response.insert(response))
    }

    /// Send `body` serialized as JSON.
    ///
    /// Sets a persistent `Content-Type: application/json` header unless one
    /// is already present, so the recorded headers describe the body.
    ///
    /// # Errors
    ///
    /// Same as [`RecordingClient::send`].
    pub fn send_json(
        &mut self,
        method: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<&ClientResponse, ValidatorError> {
        let has_content_type = self
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            self.have_http_header("Content-Type", "application/json");
        }
        self.send(method, path, Some(&body.to_string()))
    }

    fn url_for(&self, path: &str) -> Result<url::Url, ValidatorError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url::Url::parse(&joined)
            .map_err(|e| ValidatorError::Http(format!("invalid URL {joined}: {e}")))
    }
}

impl RestClient for RecordingClient {
    fn last_request(&self) -> Option<&ClientRequest> {
        self.last_request.as_ref()
    }

    fn last_response(&self) -> Option<&ClientResponse> {
        self.last_response.as_ref()
    }
}

impl HeaderSource for RecordingClient {
    fn headers(&self) -> &HeaderValues {
        &self.headers
    }
}
