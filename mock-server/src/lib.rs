//! In-memory stand-in for the subset of Trilium's ETAPI the client uses.
//!
//! One password, any number of issued tokens, and a note tree whose day
//! notes are created on first access under a single root note.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_PASSWORD: &str = "secret";
pub const ROOT_NOTE_ID: &str = "root";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mime: String,
    pub is_protected: bool,
    pub blob_id: String,
    pub child_note_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub password: String,
    pub token_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub parent_note_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mime: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_id: String,
    pub note_id: String,
    pub parent_note_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Created {
    pub note: Note,
    pub branch: Branch,
}

/// Server state: credentials, issued tokens and the note tree.
#[derive(Debug)]
pub struct Store {
    password: String,
    /// token -> token name
    tokens: HashMap<String, String>,
    notes: HashMap<String, Note>,
    contents: HashMap<String, String>,
    /// `YYYY-MM-DD` -> day note id
    days: HashMap<String, String>,
}

impl Store {
    pub fn new(password: &str) -> Self {
        let root = Note {
            note_id: ROOT_NOTE_ID.to_string(),
            title: "root".to_string(),
            kind: "text".to_string(),
            mime: "text/html".to_string(),
            is_protected: false,
            blob_id: new_id(),
            child_note_ids: Vec::new(),
        };
        Self {
            password: password.to_string(),
            tokens: HashMap::new(),
            notes: HashMap::from([(ROOT_NOTE_ID.to_string(), root)]),
            contents: HashMap::from([(ROOT_NOTE_ID.to_string(), String::new())]),
            days: HashMap::new(),
        }
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn content(&self, id: &str) -> Option<&str> {
        self.contents.get(id).map(String::as_str)
    }

    /// Names of every issued token.
    pub fn token_names(&self) -> Vec<String> {
        self.tokens.values().cloned().collect()
    }

    /// Add a child note, or `None` when the parent does not exist.
    pub fn insert(
        &mut self,
        parent_id: &str,
        title: &str,
        kind: &str,
        mime: &str,
        content: &str,
    ) -> Option<Note> {
        let note = Note {
            note_id: new_id(),
            title: title.to_string(),
            kind: kind.to_string(),
            mime: mime.to_string(),
            is_protected: false,
            blob_id: new_id(),
            child_note_ids: Vec::new(),
        };
        let parent = self.notes.get_mut(parent_id)?;
        parent.child_note_ids.push(note.note_id.clone());
        self.contents.insert(note.note_id.clone(), content.to_string());
        self.notes.insert(note.note_id.clone(), note.clone());
        Some(note)
    }

    /// The day note for `date`, created under the root if missing.
    pub fn day_note(&mut self, date: &str) -> Option<Note> {
        if let Some(note) = self.days.get(date).and_then(|id| self.notes.get(id)) {
            return Some(note.clone());
        }
        let note = self.insert(ROOT_NOTE_ID, date, "text", "text/html", "")?;
        self.days.insert(date.to_string(), note.note_id.clone());
        Some(note)
    }

    fn check_token(&self, headers: &HeaderMap) -> Result<(), EtapiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if self.tokens.contains_key(token) {
            Ok(())
        } else {
            Err(EtapiError::new(
                StatusCode::UNAUTHORIZED,
                "NOT_AUTHENTICATED",
                "missing or unknown auth token",
            ))
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error body in the shape ETAPI uses: `{status, code, message}`.
#[derive(Debug)]
pub struct EtapiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl EtapiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn note_not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOTE_NOT_FOUND",
            format!("Note '{id}' not found."),
        )
    }
}

impl IntoResponse for EtapiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": self.status.as_u16(),
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn new_db(password: &str) -> Db {
    Arc::new(RwLock::new(Store::new(password)))
}

pub fn app() -> Router {
    app_with_db(new_db(DEFAULT_PASSWORD))
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/etapi/auth/login", post(login))
        .route("/etapi/calendar/days/{date}", get(day_note))
        .route("/etapi/create-note", post(create_note))
        .route("/etapi/notes/{id}", get(get_note))
        .route("/etapi/notes/{id}/content", get(get_content).put(put_content))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_password(listener, DEFAULT_PASSWORD).await
}

pub async fn run_with_password(listener: TcpListener, password: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(new_db(password))).await
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

async fn index() -> &'static str {
    "mock ETAPI"
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Login>,
) -> Result<(StatusCode, Json<serde_json::Value>), EtapiError> {
    let mut store = db.write().await;
    if input.password != store.password {
        return Err(EtapiError::new(
            StatusCode::UNAUTHORIZED,
            "WRONG_PASSWORD",
            "Wrong password.",
        ));
    }
    let token = format!("{}_{}", new_id(), new_id());
    store.tokens.insert(token.clone(), input.token_name);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "authToken": token })),
    ))
}

async fn day_note(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(date): Path<String>,
) -> Result<Json<Note>, EtapiError> {
    let mut store = db.write().await;
    store.check_token(&headers)?;
    if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        return Err(EtapiError::new(
            StatusCode::BAD_REQUEST,
            "DATE_INVALID",
            format!("Date '{date}' is not valid."),
        ));
    }
    store
        .day_note(&date)
        .map(Json)
        .ok_or_else(|| EtapiError::note_not_found(ROOT_NOTE_ID))
}

async fn create_note(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateNote>,
) -> Result<(StatusCode, Json<Created>), EtapiError> {
    let mut store = db.write().await;
    store.check_token(&headers)?;
    let note = store
        .insert(
            &input.parent_note_id,
            &input.title,
            &input.kind,
            &input.mime,
            &input.content,
        )
        .ok_or_else(|| EtapiError::note_not_found(&input.parent_note_id))?;
    let branch = Branch {
        branch_id: format!("{}_{}", input.parent_note_id, note.note_id),
        note_id: note.note_id.clone(),
        parent_note_id: input.parent_note_id,
    };
    Ok((StatusCode::CREATED, Json(Created { note, branch })))
}

async fn get_note(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Note>, EtapiError> {
    let store = db.read().await;
    store.check_token(&headers)?;
    store
        .note(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| EtapiError::note_not_found(&id))
}

async fn get_content(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<String, EtapiError> {
    let store = db.read().await;
    store.check_token(&headers)?;
    store
        .content(&id)
        .map(str::to_string)
        .ok_or_else(|| EtapiError::note_not_found(&id))
}

async fn put_content(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, EtapiError> {
    let mut store = db.write().await;
    store.check_token(&headers)?;
    let content = store
        .contents
        .get_mut(&id)
        .ok_or_else(|| EtapiError::note_not_found(&id))?;
    *content = body;
    Ok(StatusCode::NO_CONTENT)
}
