//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tower::util::ServiceExt;

use cashpal::api;
use cashpal::auth::{PasswordService, TokenService};
use cashpal::store::MemoryStore;
use cashpal::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Full router over an in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(false)
    }

    pub fn with_user_directory() -> Self {
        Self::build(true)
    }

    fn build(expose_user_directory: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(SECRET, 24);
        let passwords = PasswordService::with_params(8, 1, 1).expect("cheap argon2 params");

        let state = AppState::new(store.clone(), tokens.clone(), passwords)
            .with_user_directory(expose_user_directory);

        Self {
            router: api::build_app(state),
            store,
            tokens,
        }
    }

    /// Send a request and decode the body as JSON (plain text becomes a JSON string)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    /// Register through the public endpoint and return (user id, token)
    pub async fn register(&self, username: &str) -> (i32, String) {
        let (status, body) = self
            .send(
                "POST",
                "/users",
                None,
                Some(serde_json::json!({ "username": username, "password": "pw-123456" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "registration failed: {body}");

        let user_id = body["id"].as_i64().unwrap() as i32;
        let token = self.tokens.issue(user_id, username).unwrap();
        (user_id, token)
    }

    /// Create an account as the token holder and return its id
    pub async fn create_account(&self, token: &str, name: &str) -> i32 {
        let (status, body) = self
            .send(
                "POST",
                "/accounts",
                Some(token),
                Some(serde_json::json!({ "account_name": name, "account_type": "joint" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "account creation failed: {body}");
        body["id"].as_i64().unwrap() as i32
    }
}

/// Setup test database - truncate tables, keep reference data
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Simple-protocol execution so the multi-statement schema runs as one batch
    pool.execute(include_str!("../../migrations/0001_init.sql"))
        .await
        .expect("Failed to apply schema");

    pool.execute(
        "TRUNCATE TABLE account_events, transactions, members, accounts, users RESTART IDENTITY CASCADE",
    )
    .await
    .expect("Failed to clean up DB");

    pool
}
