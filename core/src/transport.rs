//! Blocking HTTP transport backed by ureq.

use std::time::Duration;

use ureq::typestate::{WithBody, WithoutBody};
use ureq::RequestBuilder;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Default deadline for a whole exchange (connect, send, read).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on a response body. Note content is unbounded.
pub const DEFAULT_MAX_BODY_SIZE: u64 = u64::MAX;

/// Settings fixed when the client is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on a single request, applied to every call.
    pub timeout: Duration,
    /// Largest response body read, in bytes. Longer bodies fail as
    /// [`ApiError::Transport`].
    pub max_body_size: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// [`Transport`] that executes requests with a shared `ureq::Agent`.
///
/// The agent is configured with `http_status_as_error(false)` so 4xx/5xx
/// responses come back as data and the request layer decides what counts as
/// success.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_size: u64,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(options: &ClientOptions) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(options.timeout))
            .build()
            .new_agent();
        Self {
            agent,
            max_body_size: options.max_body_size,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientOptions::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref();

        let mut response = match request.method {
            HttpMethod::Get => without_body(self.agent.get(url), headers).call(),
            HttpMethod::Head => without_body(self.agent.head(url), headers).call(),
            HttpMethod::Post => send(with_body(self.agent.post(url), headers), body),
            HttpMethod::Put => send(with_body(self.agent.put(url), headers), body),
        }?;

        let status = response.status().as_u16();
        let body = if request.method == HttpMethod::Head {
            String::new()
        } else {
            let bytes = response
                .body_mut()
                .with_config()
                .limit(self.max_body_size)
                .read_to_vec()?;
            String::from_utf8(bytes).map_err(ApiError::InvalidBody)?
        };

        Ok(HttpResponse { status, body })
    }
}

fn without_body(
    mut builder: RequestBuilder<WithoutBody>,
    headers: &[(String, String)],
) -> RequestBuilder<WithoutBody> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn with_body(
    mut builder: RequestBuilder<WithBody>,
    headers: &[(String, String)],
) -> RequestBuilder<WithBody> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body),
        None => builder.send_empty(),
    }
}
