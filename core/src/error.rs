//! Error types for the ETAPI client.
//!
//! # Design
//! Every failure a caller can observe is one `ApiError` variant. Composite
//! operations wrap the first failure in `Context` so the printed chain reads
//! like "failed to get current day note: request failed: ...", while
//! [`ApiError::root`] still exposes the underlying variant for matching.
//!
//! Display strings never repeat their source; print the chain (for example
//! with `anyhow`'s `{:#}`) to see the whole story.

use thiserror::Error;

/// Errors returned by `NoteClient` operations and the request layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base address is missing an `http`/`https` scheme or a host.
    #[error("invalid server URL '{0}': expected an http:// or https:// address")]
    InvalidUrl(String),

    /// DNS, connection, TLS or timeout failure below the HTTP layer.
    #[error("transport error")]
    Transport(#[from] ureq::Error),

    /// The server answered with a status other than the one the call expects.
    #[error("request failed: expected HTTP {expected}, got {actual}, body is '{body}'")]
    RequestFailed {
        expected: u16,
        actual: u16,
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response body '{body}'")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The server sent a body that is not valid UTF-8 text.
    #[error("response body is not valid UTF-8")]
    InvalidBody(#[source] std::string::FromUtf8Error),

    /// The request payload could not be encoded as JSON.
    #[error("failed to encode request body")]
    Encode(#[source] serde_json::Error),

    /// Login succeeded but the response carried no `authToken`.
    #[error("login response did not contain an auth token")]
    AuthTokenMissing,

    /// An authenticated operation was attempted before a token was set.
    #[error("no auth token set: log in first")]
    Unauthenticated,

    /// A title search matched no note.
    #[error("no note titled '{title}' found on {date}")]
    NotFound { title: String, date: String },

    /// Operation-level context around an underlying failure.
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// The innermost error, skipping any `Context` layers.
    pub fn root(&self) -> &ApiError {
        let mut current = self;
        while let ApiError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// True when the failure means "the resource is absent", either because a
    /// search found nothing or because the server answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            ApiError::NotFound { .. } | ApiError::RequestFailed { actual: 404, .. }
        )
    }
}

/// Attach operation context to a failed result.
pub trait Context<T> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError>;

    fn with_context<F, S>(self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> Context<T> for Result<T, ApiError> {
    fn context(self, context: impl Into<String>) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Context {
            context: context.into(),
            source: Box::new(source),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| ApiError::Context {
            context: f().into(),
            source: Box::new(source),
        })
    }
}
