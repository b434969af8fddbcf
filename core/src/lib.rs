//! Blocking client core for Trilium's ETAPI.
//!
//! # Overview
//! Day-scoped note taking on top of a remote note tree: log in, resolve the
//! note for a calendar day, create notes under it, list and search its
//! children by title, and read or overwrite note content.
//!
//! # Design
//! - [`Request`] is the only way a call reaches the network. It carries one
//!   expected status and turns any other status into
//!   [`ApiError::RequestFailed`].
//! - I/O goes through the [`Transport`] trait. [`UreqTransport`] is the
//!   production implementation; its timeout is fixed at construction through
//!   [`ClientOptions`].
//! - [`NoteClient`] holds the base URL and token and composes requests into
//!   domain operations. It is single-threaded and synchronous.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{format_date, NoteClient};
pub use error::{ApiError, Context};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use request::Request;
pub use transport::{ClientOptions, UreqTransport, DEFAULT_MAX_BODY_SIZE, DEFAULT_TIMEOUT};
pub use types::{CreateNote, CreatedNote, LoginRequest, LoginResponse, Note};

pub use chrono::NaiveDate;
