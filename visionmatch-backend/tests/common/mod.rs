// tests/common/mod.rs
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Serialize;
use std::sync::{Arc, Once};

use visionmatch_backend::api::{create_app, AppState};
use visionmatch_backend::config::Config;
use visionmatch_backend::db::init_schema;
use visionmatch_backend::repository::optician_repository::OpticianRepository;
use visionmatch_backend::service::email_service::EmailConfig;

static INIT: Once = Once::new();

/// テスト環境を初期化
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("visionmatch_backend=debug,tower_http=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Fresh in-memory database with the schema applied. Pooling is capped at
/// one connection so every query sees the same in-memory store.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    init_schema(&db).await.expect("Failed to create schema");
    db
}

pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        database_url: "sqlite::memory:".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        encryption_key: Some("test-encryption-secret".to_string()),
        admin_password: "admin123".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        environment: "development".to_string(),
    })
}

pub async fn setup_app_state() -> AppState {
    init_test_env();
    let db = setup_db().await;
    OpticianRepository::new(db.clone())
        .seed_if_empty()
        .await
        .expect("Failed to seed opticians");
    AppState::new(db, test_config(), EmailConfig::default()).expect("Failed to build app state")
}

pub async fn setup_app() -> (Router, AppState) {
    let app_state = setup_app_state().await;
    (create_app(app_state.clone()), app_state)
}

// --- Request helpers ---

pub fn json_request<T: Serialize>(method: Method, uri: &str, body: &T) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn admin_request(method: Method, uri: &str, password: &str) -> Request<Body> {
    let credentials = STANDARD.encode(format!("admin:{}", password));
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Basic {}", credentials))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}
