#![allow(dead_code)]
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tower::ServiceExt;
use authkeeper_backend::{
    app::build_router,
    config::Config,
    repositories::{AuthStore, MemoryStore},
    state::AppState,
    utils::{password::Argon2Credentials, time::ManualClock},
};

pub const TEST_PASSWORD: &str = "secret123";

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("DATABASE_URL", "memory://"),
        ("JWT_SECRET", "integration-test-secret"),
        ("ACCESS_TOKEN_EXPIRE_MINUTES", "30"),
        ("REFRESH_TOKEN_EXPIRE_DAYS", "7"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

/// Argon2 with minimal cost so each hash takes microseconds.
pub fn cheap_credentials() -> Arc<Argon2Credentials> {
    Arc::new(Argon2Credentials::with_params(8, 1, 1).expect("argon2 params"))
}

/// Full application over a fresh memory store and a manual clock.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn AuthStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let store: Arc<dyn AuthStore> = Arc::new(MemoryStore::new(clock.clone()));
        Self::with_store(store, clock)
    }

    pub fn with_store(store: Arc<dyn AuthStore>, clock: Arc<ManualClock>) -> Self {
        let state = AppState::new(
            &test_config(),
            store.clone(),
            cheap_credentials(),
            clock.clone(),
        )
        .expect("app state");
        Self {
            router: build_router(state),
            clock,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Response<Body>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("call router");
        (response.status(), response)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, response) = self.send(request).await;
        (status, body_json(response).await)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send_json(json_request(
                "POST",
                "/users",
                None,
                serde_json::json!({ "username": username, "email": email, "password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send_json(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
    }

    /// Registers and logs in, returning the user id and token pair.
    pub async fn signed_in(&self, username: &str, email: &str) -> (i64, Tokens) {
        let user = self.register(username, email, TEST_PASSWORD).await;
        let (status, body) = self.login(email, TEST_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (user["id"].as_i64().expect("user id"), Tokens::from_json(&body))
    }

    pub async fn refresh(&self, refresh_token: &str) -> (StatusCode, Value) {
        self.send_json(json_request(
            "POST",
            "/auth/refresh",
            None,
            serde_json::json!({ "refresh_token": refresh_token }),
        ))
        .await
    }

    pub async fn me(&self, access_token: &str) -> (StatusCode, Value) {
        self.send_json(empty_request("GET", "/auth/me", Some(access_token)))
            .await
    }

    pub async fn logout(&self, access_token: &str) -> (StatusCode, Value) {
        self.send_json(empty_request("POST", "/auth/logout", Some(access_token)))
            .await
    }
}

#[derive(Debug, Clone)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

impl Tokens {
    pub fn from_json(body: &Value) -> Self {
        assert_eq!(body["token_type"], "bearer");
        Self {
            access: body["access_token"].as_str().expect("access_token").to_string(),
            refresh: body["refresh_token"]
                .as_str()
                .expect("refresh_token")
                .to_string(),
        }
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("build request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json body")
}
