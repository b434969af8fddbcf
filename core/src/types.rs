//! ETAPI payloads.
//!
//! # Design
//! These mirror the server's camelCase JSON but are defined independently of
//! the mock server crate; integration tests catch schema drift. Fields the
//! client never reads are ignored on decode.

use serde::{Deserialize, Serialize};

/// Title used by `save_note` when the caller gives none.
pub const DEFAULT_NOTE_TITLE: &str = "Note";

/// Content kind of notes created by this client.
pub const NOTE_TYPE: &str = "code";

/// MIME type of notes created by this client.
pub const NOTE_MIME: &str = "text/x-markdown";

/// A note as returned by `GET notes/{id}` and `GET calendar/days/{date}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "noteId")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub blob_id: String,
    /// Direct children only, in server order. Absent in the JSON means none.
    #[serde(default)]
    pub child_note_ids: Vec<String>,
}

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub password: String,
    pub token_name: String,
}

/// Response of `POST auth/login`. The token is optional here so a missing
/// field can be reported as `AuthTokenMissing` rather than a decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Body of `POST create-note`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub parent_note_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mime: String,
    pub content: String,
}

/// Response of `POST create-note`: the new note plus its branch, of which
/// only the note is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedNote {
    pub note: Note,
}
