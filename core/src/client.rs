//! ETAPI client: authentication, day notes, note CRUD and title search.
//!
//! # Design
//! `NoteClient` owns the base URL, the auth token and a [`Transport`]. Each
//! operation builds one or more [`Request`]s against `<base-url>/etapi/`,
//! sends them in order and decodes the JSON it gets back. Composite
//! operations stop at the first failure and wrap it with operation context;
//! nothing is retried and nothing is cached between calls.

use chrono::{Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, Context};
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::request::Request;
use crate::transport::{ClientOptions, UreqTransport};
use crate::types::{
    CreateNote, CreatedNote, LoginRequest, LoginResponse, Note, DEFAULT_NOTE_TITLE, NOTE_MIME,
    NOTE_TYPE,
};

const API_ROOT: &str = "etapi";

/// Blocking client for a Trilium ETAPI server.
#[derive(Debug)]
pub struct NoteClient<T = UreqTransport> {
    base_url: String,
    token: String,
    transport: T,
}

impl NoteClient<UreqTransport> {
    /// Connect with the default timeout. See [`NoteClient::connect`].
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn with_options(base_url: &str, options: ClientOptions) -> Result<Self, ApiError> {
        validate_base_url(base_url)?;
        Self::connect(base_url, UreqTransport::new(&options))
    }
}

impl<T: Transport> NoteClient<T> {
    /// Validate `base_url` and probe it with a HEAD request.
    ///
    /// The URL is checked before anything touches the network. Any HTTP
    /// answer to the probe counts as alive; only transport failures fail.
    pub fn connect(base_url: &str, transport: T) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        let probe = HttpRequest {
            method: HttpMethod::Head,
            url: base_url.clone(),
            headers: Vec::new(),
            body: None,
        };
        let response = transport
            .execute(&probe)
            .with_context(|| format!("server at {base_url} is unreachable"))?;
        debug!(url = %base_url, status = response.status, "server is reachable");
        Ok(Self {
            base_url,
            token: String::new(),
            transport,
        })
    }

    /// Use a token obtained earlier, typically loaded from the config file.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log in with `password`, labelling the token with this machine's
    /// hostname. Stores the token and returns it for the caller to persist.
    pub fn authorize(&mut self, password: &str) -> Result<String, ApiError> {
        self.authorize_as(password, &token_label())
    }

    /// Log in with an explicit token name.
    ///
    /// The stored token is only replaced after a fully successful exchange.
    pub fn authorize_as(&mut self, password: &str, token_name: &str) -> Result<String, ApiError> {
        let login = LoginRequest {
            password: password.to_string(),
            token_name: token_name.to_string(),
        };
        let body = Request::new(HttpMethod::Post, self.endpoint("auth/login"), 201)
            .header("Content-Type", "application/json")
            .body(encode(&login)?)
            .send(&self.transport)
            .context("failed to log in")?;
        let response: LoginResponse = decode(body).context("failed to log in")?;
        let token = response
            .auth_token
            .ok_or(ApiError::AuthTokenMissing)
            .context("failed to log in")?;
        info!(token_name, "obtained auth token");
        self.token = token.clone();
        Ok(token)
    }

    /// Resolve the day note for `date`.
    ///
    /// Trilium creates day notes on first access, so a missing note is not
    /// expected; if the server answers 404 anyway, `is_not_found()` on the
    /// returned error tells that apart from other failures.
    pub fn get_selected_day_note(&self, date: NaiveDate) -> Result<Note, ApiError> {
        self.day_note(date)
            .with_context(|| format!("failed to get day note for {}", format_date(date)))
    }

    pub fn get_current_day_note(&self) -> Result<Note, ApiError> {
        self.day_note(today()).context("failed to get current day note")
    }

    /// Create a note under today's day note.
    pub fn save_note(&self, content: &str, name: &str) -> Result<Note, ApiError> {
        self.save_note_in_date(today(), content, name)
    }

    /// Create a note under the day note of `date`. An empty `name` becomes
    /// [`DEFAULT_NOTE_TITLE`].
    pub fn save_note_in_date(
        &self,
        date: NaiveDate,
        content: &str,
        name: &str,
    ) -> Result<Note, ApiError> {
        let parent = self
            .day_note(date)
            .with_context(|| format!("failed to get day note for {}", format_date(date)))?;
        let title = if name.is_empty() { DEFAULT_NOTE_TITLE } else { name };
        let create = CreateNote {
            parent_note_id: parent.id,
            title: title.to_string(),
            kind: NOTE_TYPE.to_string(),
            mime: NOTE_MIME.to_string(),
            content: content.to_string(),
        };
        let created: CreatedNote = self
            .authed(HttpMethod::Post, "create-note", 201)
            .and_then(|req| {
                req.header("Content-Type", "application/json")
                    .body(encode(&create)?)
                    .send(&self.transport)
            })
            .and_then(decode)
            .with_context(|| format!("failed to create note '{title}'"))?;
        info!(id = %created.note.id, title, "created note");
        Ok(created.note)
    }

    pub fn fetch_note(&self, id: &str) -> Result<Note, ApiError> {
        self.authed(HttpMethod::Get, &format!("notes/{id}"), 200)
            .and_then(|req| req.send(&self.transport))
            .and_then(decode)
            .with_context(|| format!("failed to fetch note {id}"))
    }

    /// Fetch each note in order. The first failure is returned and nothing
    /// fetched before it is kept.
    pub fn fetch_children_notes<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Note>, ApiError> {
        ids.iter().map(|id| self.fetch_note(id.as_ref())).collect()
    }

    /// Raw note content, passed through unmodified.
    pub fn fetch_note_content(&self, id: &str) -> Result<String, ApiError> {
        self.authed(HttpMethod::Get, &format!("notes/{id}/content"), 200)
            .and_then(|req| req.send(&self.transport))
            .with_context(|| format!("failed to fetch content of note {id}"))
    }

    /// Replace the whole content of note `id`.
    pub fn update_note(&self, id: &str, content: &str) -> Result<(), ApiError> {
        self.authed(HttpMethod::Put, &format!("notes/{id}/content"), 204)
            .and_then(|req| {
                req.header("Content-Type", "text/plain")
                    .body(content)
                    .send(&self.transport)
            })
            .with_context(|| format!("failed to update note {id}"))?;
        info!(id, "updated note content");
        Ok(())
    }

    /// Every direct child of the day note for `date`, in server order.
    pub fn get_all_date_notes(&self, date: NaiveDate) -> Result<Vec<Note>, ApiError> {
        let day = self
            .day_note(date)
            .with_context(|| format!("failed to get day note for {}", format_date(date)))?;
        if day.child_note_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_children_notes(day.child_note_ids.as_slice())
            .with_context(|| format!("failed to fetch notes for {}", format_date(date)))
    }

    /// Notes under the day note for `date` accepted by `predicate`, in
    /// server order. An empty result is not an error here.
    pub fn find_in_date<P>(&self, date: NaiveDate, predicate: P) -> Result<Vec<Note>, ApiError>
    where
        P: Fn(&Note) -> bool,
    {
        let notes = self.get_all_date_notes(date)?;
        Ok(notes.into_iter().filter(|note| predicate(note)).collect())
    }

    /// Notes under `date` whose title equals `title` exactly.
    ///
    /// Fails with `NotFound` when nothing matches. Several matches are all
    /// returned; choosing among them is up to the caller.
    pub fn search_in_date(&self, date: NaiveDate, title: &str) -> Result<Vec<Note>, ApiError> {
        let matches = self.find_in_date(date, |note| note.title == title)?;
        if matches.is_empty() {
            return Err(ApiError::NotFound {
                title: title.to_string(),
                date: format_date(date),
            });
        }
        debug!(title, count = matches.len(), "search matched notes");
        Ok(matches)
    }

    pub fn search_in_today_notes(&self, title: &str) -> Result<Vec<Note>, ApiError> {
        self.search_in_date(today(), title)
    }

    fn day_note(&self, date: NaiveDate) -> Result<Note, ApiError> {
        let path = format!("calendar/days/{}", format_date(date));
        let body = self.authed(HttpMethod::Get, &path, 200)?.send(&self.transport)?;
        decode(body)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{API_ROOT}/{path}", self.base_url)
    }

    /// A request carrying the stored token; fails before any I/O if there
    /// is none.
    fn authed(&self, method: HttpMethod, path: &str, expected: u16) -> Result<Request, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::Unauthenticated);
        }
        Ok(Request::new(method, self.endpoint(path), expected)
            .header("Authorization", self.token.as_str()))
    }
}

/// Check the scheme and host, and strip trailing slashes.
fn validate_base_url(base_url: &str) -> Result<String, ApiError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let valid = match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
                && !rest.is_empty()
                && !rest.starts_with('/')
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::InvalidUrl(base_url.to_string()));
    }
    Ok(trimmed.to_string())
}

/// `YYYY-MM-DD`, the form ETAPI uses in calendar paths.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Token name shown in Trilium's ETAPI token list.
fn token_label() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("trnotes on {host}")
}

fn encode<S: Serialize>(value: &S) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(ApiError::Encode)
}

fn decode<D: DeserializeOwned>(body: String) -> Result<D, ApiError> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(source) => Err(ApiError::Decode { source, body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;

    const BASE: &str = "http://localhost:8080";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn note_json(id: &str, title: &str, children: &[&str]) -> String {
        serde_json::json!({
            "noteId": id,
            "title": title,
            "type": "code",
            "mime": "text/x-markdown",
            "isProtected": false,
            "blobId": format!("blob-{id}"),
            "childNoteIds": children,
        })
        .to_string()
    }

    /// A logged-in client over `transport`, which must start with the probe
    /// reply (see `ScriptedTransport::connected`).
    fn client(transport: ScriptedTransport) -> NoteClient<ScriptedTransport> {
        NoteClient::connect(BASE, transport).unwrap().with_token("tok")
    }

    #[test]
    fn rejects_url_without_scheme_before_any_request() {
        let transport = ScriptedTransport::new();
        for url in ["localhost:8080", "ftp://host", "http://", "://host", ""] {
            let err = NoteClient::connect(url, &transport).unwrap_err();
            assert!(matches!(err, ApiError::InvalidUrl(_)), "{url}");
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn with_options_rejects_bad_url_without_probing() {
        let err = NoteClient::with_options("example.com", ClientOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn connect_probes_with_head_and_strips_trailing_slash() {
        let transport = ScriptedTransport::new().respond(405, "");
        let client = NoteClient::connect("https://notes.example.com/", &transport).unwrap();
        assert_eq!(client.base_url(), "https://notes.example.com");
        assert!(client.token().is_empty());

        let sent = transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Head);
        assert_eq!(sent[0].url, "https://notes.example.com");
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        let transport = ScriptedTransport::new().fail();
        let err = NoteClient::connect(BASE, &transport).unwrap_err();
        assert!(matches!(err.root(), ApiError::Transport(_)));
    }

    #[test]
    fn authorize_stores_and_returns_token() {
        let transport = ScriptedTransport::new()
            .respond(200, "")
            .respond(201, r#"{"authToken":"abc123"}"#);
        let mut client = NoteClient::connect(BASE, &transport).unwrap();

        let token = client.authorize_as("hunter2", "trnotes on box").unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(client.token(), "abc123");

        let login = &transport.requests()[1];
        assert_eq!(login.method, HttpMethod::Post);
        assert_eq!(login.url, "http://localhost:8080/etapi/auth/login");
        assert_eq!(login.header("Authorization"), None);
        let body: serde_json::Value = serde_json::from_str(login.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["password"], "hunter2");
        assert_eq!(body["tokenName"], "trnotes on box");
    }

    #[test]
    fn authorize_labels_token_with_hostname() {
        let transport = ScriptedTransport::new()
            .respond(200, "")
            .respond(201, r#"{"authToken":"abc123"}"#);
        let mut client = NoteClient::connect(BASE, &transport).unwrap();
        client.authorize("pw").unwrap();

        let login = &transport.requests()[1];
        let body: serde_json::Value = serde_json::from_str(login.body.as_deref().unwrap()).unwrap();
        assert!(body["tokenName"].as_str().unwrap().starts_with("trnotes on "));
    }

    #[test]
    fn authorize_with_wrong_status_leaves_token_untouched() {
        let transport = ScriptedTransport::new()
            .respond(200, "")
            .respond(200, r#"{"authToken":"abc123"}"#);
        let mut client = NoteClient::connect(BASE, &transport).unwrap().with_token("old");

        let err = client.authorize_as("pw", "t").unwrap_err();
        assert!(matches!(
            err.root(),
            ApiError::RequestFailed { expected: 201, actual: 200, .. }
        ));
        assert_eq!(client.token(), "old");
    }

    #[test]
    fn authorize_without_token_field_fails() {
        let transport = ScriptedTransport::new().respond(200, "").respond(201, "{}");
        let mut client = NoteClient::connect(BASE, &transport).unwrap();
        let err = client.authorize_as("pw", "t").unwrap_err();
        assert!(matches!(err.root(), ApiError::AuthTokenMissing));
        assert!(client.token().is_empty());
    }

    #[test]
    fn authorize_with_malformed_body_is_a_decode_error() {
        let transport = ScriptedTransport::new().respond(200, "").respond(201, "<html>");
        let mut client = NoteClient::connect(BASE, &transport).unwrap();
        let err = client.authorize_as("pw", "t").unwrap_err();
        match err.root() {
            ApiError::Decode { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn authenticated_calls_require_a_token() {
        let transport = ScriptedTransport::new().respond(200, "");
        let client = NoteClient::connect(BASE, &transport).unwrap();
        let err = client.fetch_note("abc").unwrap_err();
        assert!(matches!(err.root(), ApiError::Unauthenticated));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn day_note_uses_calendar_path_and_token() {
        let client = client(ScriptedTransport::connected().respond(200, &note_json("day", "2024-01-31", &[])));
        let note = client.get_selected_day_note(date()).unwrap();
        assert_eq!(note.id, "day");

        let req = &client.transport().requests()[1];
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/etapi/calendar/days/2024-01-31");
        assert_eq!(req.header("Authorization"), Some("tok"));
    }

    #[test]
    fn missing_day_note_is_distinguishable() {
        let client = client(ScriptedTransport::connected().respond(404, r#"{"code":"NOT_FOUND"}"#));
        let err = client.get_selected_day_note(date()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "failed to get day note for 2024-01-31");
    }

    #[test]
    fn current_day_note_error_has_context() {
        let client = client(ScriptedTransport::connected().respond(500, "boom"));
        let err = client.get_current_day_note().unwrap_err();
        assert_eq!(err.to_string(), "failed to get current day note");
        assert!(matches!(err.root(), ApiError::RequestFailed { actual: 500, .. }));
    }

    #[test]
    fn save_note_creates_markdown_code_note_under_day() {
        let created = format!(
            r#"{{"note":{},"branch":{{"branchId":"b","noteId":"n1","parentNoteId":"day"}}}}"#,
            note_json("n1", "Note", &[])
        );
        let client = client(
            ScriptedTransport::connected()
                .respond(200, &note_json("day", "2024-01-31", &[]))
                .respond(201, &created),
        );

        let note = client.save_note_in_date(date(), "# hello", "").unwrap();
        assert_eq!(note.id, "n1");

        let req = &client.transport().requests()[2];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/etapi/create-note");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "parentNoteId": "day",
                "title": "Note",
                "type": "code",
                "mime": "text/x-markdown",
                "content": "# hello"
            })
        );
    }

    #[test]
    fn save_note_keeps_given_title() {
        let created = format!(r#"{{"note":{}}}"#, note_json("n1", "groceries", &[]));
        let client = client(
            ScriptedTransport::connected()
                .respond(200, &note_json("day", "2024-01-31", &[]))
                .respond(201, &created),
        );
        client.save_note_in_date(date(), "milk", "groceries").unwrap();
        let req = &client.transport().requests()[2];
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["title"], "groceries");
    }

    #[test]
    fn save_note_stops_when_parent_lookup_fails() {
        let client = client(ScriptedTransport::connected().fail());
        let err = client.save_note_in_date(date(), "x", "y").unwrap_err();
        assert!(matches!(err.root(), ApiError::Transport(_)));
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[test]
    fn fetch_children_keeps_input_order() {
        let client = client(
            ScriptedTransport::connected()
                .respond(200, &note_json("c", "third", &[]))
                .respond(200, &note_json("a", "first", &[])),
        );
        let notes = client.fetch_children_notes(&["c", "a"]).unwrap();
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn fetch_children_fails_fast_without_partial_results() {
        let client = client(
            ScriptedTransport::connected()
                .respond(200, &note_json("a", "first", &[]))
                .respond(500, "b is broken")
                .respond(200, &note_json("c", "third", &[])),
        );
        let err = client.fetch_children_notes(&["a", "b", "c"]).unwrap_err();
        assert_eq!(err.to_string(), "failed to fetch note b");
        match err.root() {
            ApiError::RequestFailed { body, .. } => assert_eq!(body, "b is broken"),
            other => panic!("unexpected error: {other:?}"),
        }
        // "c" is never requested.
        assert_eq!(client.transport().remaining(), 1);
    }

    #[test]
    fn fetch_content_passes_body_through() {
        let html = "<p>a &amp; b</p>\n";
        let client = client(ScriptedTransport::connected().respond(200, html));
        assert_eq!(client.fetch_note_content("n1").unwrap(), html);
        let req = &client.transport().requests()[1];
        assert_eq!(req.url, "http://localhost:8080/etapi/notes/n1/content");
    }

    #[test]
    fn update_note_sends_plain_text_and_expects_204() {
        let client = client(ScriptedTransport::connected().respond(204, ""));
        client.update_note("n1", "new text").unwrap();

        let req = &client.transport().requests()[1];
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:8080/etapi/notes/n1/content");
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.body.as_deref(), Some("new text"));
    }

    #[test]
    fn update_note_rejects_200_with_body() {
        let client = client(ScriptedTransport::connected().respond(200, r#"{"ok":true}"#));
        let err = client.update_note("n1", "x").unwrap_err();
        match err.root() {
            ApiError::RequestFailed {
                expected,
                actual,
                body,
            } => {
                assert_eq!((*expected, *actual), (204, 200));
                assert_eq!(body, r#"{"ok":true}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn date_without_children_field_has_no_notes() {
        let day = r#"{"noteId":"day","title":"2024-01-31","type":"text","mime":"text/html"}"#;
        let client = client(ScriptedTransport::connected().respond(200, day));
        assert!(client.get_all_date_notes(date()).unwrap().is_empty());
        assert_eq!(client.transport().requests().len(), 2);
    }

    fn day_with_three_children() -> ScriptedTransport {
        ScriptedTransport::connected()
            .respond(200, &note_json("day", "2024-01-31", &["a", "b", "c"]))
            .respond(200, &note_json("a", "todo", &[]))
            .respond(200, &note_json("b", "Todo", &[]))
            .respond(200, &note_json("c", "todo", &[]))
    }

    #[test]
    fn search_returns_every_exact_match_in_child_order() {
        let client = client(day_with_three_children());
        let matches = client.search_in_date(date(), "todo").unwrap();
        let ids: Vec<_> = matches.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn search_is_case_sensitive_and_exact() {
        let client = client(day_with_three_children());
        let matches = client.search_in_date(date(), "Todo").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");
    }

    #[test]
    fn search_without_match_is_not_found() {
        let client = client(day_with_three_children());
        let err = client.search_in_date(date(), "tod").unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.to_string(), "no note titled 'tod' found on 2024-01-31");
    }

    #[test]
    fn find_in_date_accepts_any_predicate() {
        let client = client(day_with_three_children());
        let found = client
            .find_in_date(date(), |note| note.title.eq_ignore_ascii_case("TODO"))
            .unwrap();
        assert_eq!(found.len(), 3);
    }
}
