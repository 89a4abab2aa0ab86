//! In-process stand-in for the chat backend.
//!
//! Every request is recorded as `"<METHOD> <path?query>"` so tests can count
//! network calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parlor::{
    api::ApiClient,
    bus::{self, Event, EventBus},
    session::{Session, SessionContext},
    store::Store,
};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use url::Url;

#[derive(Default)]
pub struct Backend {
    pub requests: Mutex<Vec<String>>,
    pub users: Mutex<HashMap<String, String>>,
    pub conversations: Mutex<HashMap<String, Vec<Value>>>,
    pub blocks: Mutex<Vec<(String, String)>>,
    pub friends: Mutex<Vec<String>>,
    /// Who `/sendMessage` and `/friendList` act for (the cookie session).
    pub acting_user: Mutex<Option<String>>,
    /// When set, `action=block` answers `status:false` with this message.
    pub block_rejection: Mutex<Option<String>>,
}

impl Backend {
    pub fn with_users(users: &[&str]) -> Arc<Self> {
        let backend = Self::default();
        {
            let mut map = backend.users.lock().unwrap();
            for user in users {
                map.insert(user.to_string(), "pw".to_string());
            }
        }
        Arc::new(backend)
    }

    pub fn act_as(&self, user: &str) {
        *self.acting_user.lock().unwrap() = Some(user.to_string());
    }

    pub fn add_message(&self, conversation_id: &str, from: &str, to: &str, body: &str) {
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .push(json!({"fromId": from, "toId": to, "message": body}));
    }

    /// Store a row exactly as given, for records the client must tolerate.
    pub fn add_raw(&self, conversation_id: &str, row: Value) {
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .push(row);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose `"<METHOD> <uri>"` starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

/// Notice texts a receiver has buffered so far.
pub fn drain_notices(rx: &mut broadcast::Receiver<Event>) -> Vec<String> {
    bus::drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            Event::Notice { message, .. } => Some(message),
            _ => None,
        })
        .collect()
}

async fn record(State(backend): State<Arc<Backend>>, req: Request, next: Next) -> Response {
    backend
        .requests
        .lock()
        .unwrap()
        .push(format!("{} {}", req.method(), req.uri()));
    next.run(req).await
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"status": true, "data": data}))
}

fn fail(message: &str) -> Json<Value> {
    Json(json!({"status": false, "message": message}))
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    let name = body["userName"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();
    let known = backend.users.lock().unwrap().get(&name).cloned();

    if known.as_deref() == Some(password) {
        backend.act_as(&name);
        Json(json!({"status": true, "user": {"userName": name, "token": format!("t-{}", name)}}))
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, fail("bad credentials")).into_response()
    }
}

async fn create_user(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["userName"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let mut users = backend.users.lock().unwrap();
    if users.contains_key(&name) {
        return fail("User already exists");
    }
    users.insert(name, password);
    Json(json!({"status": true}))
}

async fn get_conversations(
    State(backend): State<Arc<Backend>>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let user = q.get("username").cloned().unwrap_or_default().to_lowercase();
    let conversations = backend.conversations.lock().unwrap();
    let mut rows: Vec<Value> = conversations
        .iter()
        .filter(|(id, _)| id.split('_').any(|p| p == user))
        .map(|(id, msgs)| {
            let last = msgs.last().cloned().unwrap_or(Value::Null);
            json!({
                "conversationId": id,
                "messageCount": msgs.len(),
                "toId": last["toId"],
                "fromId": last["fromId"],
            })
        })
        .collect();
    rows.sort_by(|a, b| a["conversationId"].as_str().cmp(&b["conversationId"].as_str()));
    ok(Value::Array(rows))
}

async fn get_conversation(
    State(backend): State<Arc<Backend>>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let id = q.get("conversationId").cloned().unwrap_or_default();
    match backend.conversations.lock().unwrap().get(&id) {
        Some(msgs) => ok(Value::Array(msgs.clone())),
        None => fail("Conversation not found"),
    }
}

async fn send_message(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Json<Value> {
    let Some(from) = backend.acting_user.lock().unwrap().clone() else {
        return fail("Not logged in");
    };
    let to = body["toId"].as_str().unwrap_or_default().to_string();
    let text = body["message"].as_str().unwrap_or_default().to_string();

    if !backend.users.lock().unwrap().contains_key(&to) {
        return fail(&format!("User {} does not exist", to));
    }

    let forward = format!("{}_{}", from, to);
    let backward = format!("{}_{}", to, from);
    let id = if backend.conversations.lock().unwrap().contains_key(&backward) {
        backward
    } else {
        forward
    };
    backend.add_message(&id, &from, &to, &text);
    ok(json!([{"conversationId": id}]))
}

async fn block_list(
    State(backend): State<Arc<Backend>>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let arg = |k: &str| q.get(k).cloned().unwrap_or_default();
    match arg("action").as_str() {
        "getBlockList" => {
            let blocker = arg("blockerId");
            let rows: Vec<Value> = backend
                .blocks
                .lock()
                .unwrap()
                .iter()
                .filter(|(b, _)| *b == blocker)
                .map(|(_, blocked)| json!({"blockedId": blocked}))
                .collect();
            ok(Value::Array(rows))
        }
        "exists" => {
            let exists = backend.users.lock().unwrap().contains_key(&arg("username"));
            ok(json!([{"exists": exists}]))
        }
        "block" => {
            if let Some(message) = backend.block_rejection.lock().unwrap().clone() {
                return fail(&message);
            }
            backend
                .blocks
                .lock()
                .unwrap()
                .push((arg("blockerId"), arg("blockedId")));
            Json(json!({"status": true}))
        }
        "unblock" => {
            let (blocker, blocked) = (arg("blockerId"), arg("blockedId"));
            let mut blocks = backend.blocks.lock().unwrap();
            let before = blocks.len();
            blocks.retain(|(b, d)| !(*b == blocker && *d == blocked));
            if blocks.len() == before {
                fail("not blocked")
            } else {
                Json(json!({"status": true}))
            }
        }
        _ => fail("unknown action"),
    }
}

async fn friend_list(
    State(backend): State<Arc<Backend>>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    if backend.acting_user.lock().unwrap().is_none() {
        return fail("Not logged in");
    }
    let arg = |k: &str| q.get(k).cloned().unwrap_or_default();
    match arg("action").as_str() {
        "getFriends" => {
            let rows: Vec<Value> = backend
                .friends
                .lock()
                .unwrap()
                .iter()
                .map(|f| json!({"userName": f}))
                .collect();
            ok(Value::Array(rows))
        }
        "addFriend" => {
            let friend = arg("friendUser");
            if !backend.users.lock().unwrap().contains_key(&friend) {
                return fail("No such user");
            }
            backend.friends.lock().unwrap().push(friend);
            Json(json!({"status": true}))
        }
        "removeFriend" => {
            let friend = arg("friendUser");
            backend.friends.lock().unwrap().retain(|f| *f != friend);
            Json(json!({"status": true}))
        }
        _ => fail("unknown action"),
    }
}

pub fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/createUser", post(create_user))
        .route("/getConversations", get(get_conversations))
        .route("/getConversation", get(get_conversation))
        .route("/sendMessage", post(send_message))
        .route("/blockList", get(block_list))
        .route("/friendList", get(friend_list))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend)
}

/// Serve `backend` on a random local port.
pub async fn spawn(backend: Arc<Backend>) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

/// Everything a view needs, wired against a fresh mock backend.
pub struct Harness {
    pub backend: Arc<Backend>,
    pub api: ApiClient,
    pub bus: Arc<EventBus>,
    pub sessions: SessionContext,
    pub store: Store,
}

impl Harness {
    pub async fn new(backend: Arc<Backend>) -> Self {
        let url = spawn(backend.clone()).await;
        let store = Store::in_memory().await.unwrap();
        Self {
            backend,
            api: ApiClient::new(url, None).unwrap(),
            bus: Arc::new(EventBus::new()),
            sessions: SessionContext::new(store.clone()),
            store,
        }
    }

    /// Persist `user` as logged in and let the backend act for them.
    pub async fn log_in_as(&self, user: &str) -> Session {
        let session = Session::new(user);
        self.sessions.begin(&session).await.unwrap();
        self.backend.act_as(user);
        session
    }
}
