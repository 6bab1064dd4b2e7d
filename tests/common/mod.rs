#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use linkapp::nfc::{NfcDriver, NfcError, NfcTag, NfcTech};
use serde_json::{Value, json};

pub const TOKEN: &str = "t0k3n";
pub const PASSWORD: &str = "hunter2";

/// What the mock backend knows and what it has seen.
#[derive(Debug)]
pub struct Backend {
    pub user: Value,
    pub fail_profile_write: bool,
    pub find_match: Value,
    pub requests: Vec<String>,
    pub request_ids: Vec<String>,
    pub bodies: Vec<Value>,
    pub next_message: usize,
}

impl Default for Backend {
    fn default() -> Self {
        Backend {
            user: json!({
                "id": "u1",
                "username": "ana",
                "email": "ana@example.com",
                "bio": "hello",
                "interests": ["climbing"],
            }),
            fail_profile_write: false,
            find_match: json!({ "id": "l1", "name": "Bo", "age": 29, "profile_pic_url": "https://img.test/bo.jpg" }),
            requests: vec![],
            request_ids: vec![],
            bodies: vec![],
            next_message: 0,
        }
    }
}

pub type Shared = Arc<Mutex<Backend>>;

fn seen(backend: &Shared, headers: &HeaderMap, what: String, body: Option<&Value>) {
    let mut backend = backend.lock().unwrap();
    backend.requests.push(what);
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        backend.request_ids.push(id.to_owned());
    }
    if let Some(body) = body {
        backend.bodies.push(body.clone());
    }
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "Missing or invalid token").into_response()),
    }
}

async fn login(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    seen(&backend, &headers, "POST /login".to_owned(), Some(&body));
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response();
    }
    let user = backend.lock().unwrap().user.clone();
    Json(json!({ "token": TOKEN, "user": user })).into_response()
}

async fn register(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    seen(&backend, &headers, "POST /register".to_owned(), Some(&body));
    let user = json!({ "id": "u2", "username": body["username"], "email": body["email"] });
    backend.lock().unwrap().user = user.clone();
    (StatusCode::CREATED, Json(json!({ "token": TOKEN, "user": user }))).into_response()
}

async fn get_profile(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, "GET /profile".to_owned(), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(backend.lock().unwrap().user.clone()).into_response()
}

async fn put_profile(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    seen(&backend, &headers, "PUT /profile".to_owned(), Some(&body));
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut backend = backend.lock().unwrap();
    if backend.fail_profile_write {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update profile").into_response();
    }
    if let (Some(user), Some(patch)) = (backend.user.as_object_mut(), body.as_object()) {
        for (field, value) in patch {
            user.insert(field.clone(), value.clone());
        }
        user.insert("updated".to_owned(), json!(true));
    }
    Json(backend.user.clone()).into_response()
}

async fn matches(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, "GET /matches".to_owned(), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!([{ "id": "m1", "name": "Bo" }, { "id": "m2", "name": "Cy", "score": 0.8 }])).into_response()
}

async fn start_searching(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, "POST /users/start-searching".to_owned(), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({ "message": "Started searching" })).into_response()
}

async fn stop_searching(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, "POST /users/stop-searching".to_owned(), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({ "message": "Stopped searching" })).into_response()
}

async fn find_match(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, "GET /users/find-match".to_owned(), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(backend.lock().unwrap().find_match.clone()).into_response()
}

async fn respond(
    State(backend): State<Shared>,
    Path(link_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    seen(&backend, &headers, format!("POST /users/links/{link_id}/respond"), Some(&body));
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    if body["accept"] == true {
        Json(json!({ "chatroom": { "id": "r1", "is_locked": true, "messages": [], "created_at": "2024-05-01T10:00:00Z" } })).into_response()
    } else {
        Json(json!({ "message": "Response recorded" })).into_response()
    }
}

async fn send_message(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    seen(&backend, &headers, "POST /messages".to_owned(), Some(&body));
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut backend = backend.lock().unwrap();
    backend.next_message += 1;
    Json(json!({
        "id": format!("msg{}", backend.next_message),
        "chatroom_id": body["recipientId"],
        "sender_id": "u1",
        "content": body["content"],
    }))
    .into_response()
}

async fn unlock(State(backend): State<Shared>, Path(chatroom_id): Path<String>, headers: HeaderMap) -> Response {
    seen(&backend, &headers, format!("POST /chatrooms/{chatroom_id}/unlock"), None);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({ "message": "Chatroom unlocked" })).into_response()
}

async fn nfc_unlock(
    State(backend): State<Shared>,
    Path(chatroom_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    seen(&backend, &headers, format!("POST /users/chatrooms/{chatroom_id}/nfc-unlock"), Some(&body));
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({ "message": "Chatroom unlocked via NFC", "chatroomId": chatroom_id })).into_response()
}

pub fn router(backend: Shared) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/profile", get(get_profile).put(put_profile))
        .route("/matches", get(matches))
        .route("/users/start-searching", post(start_searching))
        .route("/users/stop-searching", post(stop_searching))
        .route("/users/find-match", get(find_match))
        .route("/users/links/{link_id}/respond", post(respond))
        .route("/messages", post(send_message))
        .route("/chatrooms/{chatroom_id}/unlock", post(unlock))
        .route("/users/chatrooms/{chatroom_id}/nfc-unlock", post(nfc_unlock))
        .with_state(backend)
}

/// Serves `backend` on an ephemeral local port. Returns the base url.
pub async fn spawn(backend: Backend) -> (String, Shared) {
    linkapp::telemetry::init_tracing("linkapp=debug");
    let shared = Arc::new(Mutex::new(backend));
    let app = router(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), shared)
}

/// NFC reader that presents `tag` straight away, or has no hardware at all.
#[derive(Default)]
pub struct FakeNfc {
    pub unsupported: bool,
    pub tag: Option<NfcTag>,
    pub requests: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl FakeNfc {
    pub fn with_tag(id: &str) -> FakeNfc {
        FakeNfc {
            tag: Some(NfcTag { id: Some(id.to_owned()) }),
            ..Default::default()
        }
    }

    pub fn released(&self) -> bool {
        self.requests.load(Ordering::SeqCst) == self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NfcDriver for FakeNfc {
    async fn start(&self) -> Result<(), NfcError> {
        if self.unsupported {
            return Err(NfcError::HardwareUnavailable);
        }
        Ok(())
    }

    async fn request_technology(&self, tech: NfcTech) -> Result<(), NfcError> {
        assert_eq!(tech, NfcTech::Ndef);
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_tag(&self) -> Result<Option<NfcTag>, NfcError> {
        Ok(self.tag.clone())
    }

    fn cancel_technology_request(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
