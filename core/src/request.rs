//! Single-exchange request builder with an expected-status contract.
//!
//! Every ETAPI call goes through [`Request`]: build it, attach headers and an
//! optional body, then [`Request::send`] it through a [`Transport`]. The
//! response body is returned as text only when the status matches exactly.

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// A request descriptor, built right before the call and consumed by it.
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpMethod,
    url: String,
    expected_status: u16,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>, expected_status: u16) -> Self {
        Self {
            method,
            url: url.into(),
            expected_status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header. A later value for the same key (ignoring ASCII case)
    /// replaces the earlier one in place.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |request, (k, v)| request.header(k, v))
    }

    /// Attach a body. An empty string means no body is sent.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    /// The plain-data form handed to a transport.
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Execute the exchange and return the raw body on the expected status.
    pub fn send<T: Transport + ?Sized>(self, transport: &T) -> Result<String, ApiError> {
        debug!(
            method = %self.method,
            url = %self.url,
            expected = self.expected_status,
            "sending request"
        );
        let response = transport.execute(&self.to_http())?;
        check_status(response, self.expected_status)
    }
}

/// Compare the response status to the single expected code.
fn check_status(response: HttpResponse, expected: u16) -> Result<String, ApiError> {
    if response.status == expected {
        return Ok(response.body);
    }
    warn!(expected, actual = response.status, "unexpected response status");
    Err(ApiError::RequestFailed {
        expected,
        actual: response.status,
        body: response.body,
    })
}
