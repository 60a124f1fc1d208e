//! Shared helpers: a fake Yariga backend and credential builders.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use yariga_auth::ClientConfig;

/// Answer of the fake `POST /api/v1/users` endpoint.
#[derive(Clone)]
pub enum UsersReply {
    Ok(&'static str),
    Status(u16),
    Hang(Duration),
}

#[derive(Clone)]
pub struct Backend {
    pub reply: UsersReply,
    pub registrations: Arc<Mutex<Vec<Value>>>,
    pub authorizations: Arc<Mutex<Vec<Option<String>>>>,
    pub revoked: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    pub fn new(reply: UsersReply) -> Self {
        Self {
            reply,
            registrations: Arc::default(),
            authorizations: Arc::default(),
            revoked: Arc::default(),
        }
    }

    /// Serve the backend on an ephemeral port and return a config pointing at it.
    pub async fn spawn(&self) -> ClientConfig {
        let router = Router::new()
            .route("/api/v1/users", post(register))
            .route("/api/v1/properties", get(properties))
            .route("/revoke", post(revoke))
            .with_state(self.clone());

        let addr = serve(router).await;
        ClientConfig::default()
            .with_api_url(format!("http://{addr}/api/v1").parse().unwrap())
            .with_revoke_url(format!("http://{addr}/revoke").parse().unwrap())
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }

    /// Wait until the detached revocation task has reached the backend.
    pub async fn wait_for_revocation(&self) -> Vec<String> {
        for _ in 0..100 {
            let revoked = self.revoked.lock().unwrap().clone();
            if !revoked.is_empty() {
                return revoked;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Vec::new()
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn register(State(backend): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.registrations.lock().unwrap().push(body.clone());
    match backend.reply {
        UsersReply::Ok(id) => (
            StatusCode::OK,
            Json(json!({ "_id": id, "name": body["name"], "email": body["email"], "avatar": body["avatar"], "allProperties": [] })),
        ),
        UsersReply::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "message": "rejected" })),
        ),
        UsersReply::Hang(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(json!({ "_id": "late" })))
        }
    }
}

async fn properties(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    backend.authorizations.lock().unwrap().push(auth);
    Json(json!([]))
}

async fn revoke(
    State(backend): State<Backend>,
    Form(form): Form<std::collections::HashMap<String, String>>,
) -> StatusCode {
    if let Some(token) = form.get("token") {
        backend.revoked.lock().unwrap().push(token.clone());
    }
    StatusCode::OK
}

/// Unsigned JWT-shaped credential around `payload`.
pub fn credential_for(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

pub fn credential(name: &str, email: &str) -> String {
    credential_for(&json!({
        "iss": "https://accounts.google.com",
        "sub": email,
        "name": name,
        "email": email,
        "picture": format!("https://img.example.com/{name}.png"),
    }))
}
