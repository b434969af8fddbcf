//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Debug)]
enum Reply {
    Response(u16, String),
    Fail,
}

/// Replays canned replies in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a reply for the HEAD probe sent by `NoteClient::connect`.
    pub fn connected() -> Self {
        Self::new().respond(200, "")
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Reply::Response(status, body.to_string()));
        self
    }

    /// Queue a connection-refused failure.
    pub fn fail(self) -> Self {
        self.replies.borrow_mut().push_back(Reply::Fail);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Response(status, body)) => Ok(HttpResponse { status, body }),
            Some(Reply::Fail) => Err(ApiError::Transport(ureq::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))),
            None => panic!("no scripted reply for {} {}", request.method, request.url),
        }
    }
}
