// src/api/mod.rs

pub mod dto;
pub mod handlers;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::repository::customer_repository::CustomerRepository;
use crate::repository::email_log_repository::EmailLogRepository;
use crate::repository::gdpr_audit_log_repository::AuditLogRepository;
use crate::repository::optician_repository::OpticianRepository;
use crate::service::audit_log_service::AuditLogService;
use crate::service::customer_service::CustomerService;
use crate::service::email_service::{EmailConfig, EmailService};
use crate::service::optician_service::OpticianService;
use crate::types::ApiResponse;
use crate::utils::crypto::CryptoContext;
use axum::{http, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use handlers::admin_handler::admin_router;
use handlers::customer_handler::customer_router;
use handlers::email_handler::email_router;
use handlers::gdpr_handler::gdpr_router;
use handlers::optician_handler::optician_router;

const REQUEST_BODY_LIMIT: usize = 1024 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub customer_service: Arc<CustomerService>,
    pub audit_log_service: Arc<AuditLogService>,
    pub email_service: Arc<EmailService>,
    pub optician_service: Arc<OpticianService>,
    pub crypto: Arc<CryptoContext>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    pub fn new(db: DbPool, config: Arc<Config>, email_config: EmailConfig) -> AppResult<Self> {
        let crypto = Arc::new(CryptoContext::new(config.encryption_key.as_deref()));

        let customer_repo = Arc::new(CustomerRepository::new(db.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(db.clone()));
        let email_log_repo = Arc::new(EmailLogRepository::new(db.clone()));
        let optician_repo = Arc::new(OpticianRepository::new(db));

        let audit_log_service = Arc::new(AuditLogService::new(audit_log_repo));
        let customer_service = Arc::new(CustomerService::new(
            customer_repo,
            audit_log_service.clone(),
            crypto.clone(),
        ));
        let email_service = Arc::new(EmailService::new(
            email_config,
            email_log_repo,
            crypto.clone(),
        )?);
        let optician_service = Arc::new(OpticianService::new(optician_repo));

        Ok(Self {
            customer_service,
            audit_log_service,
            email_service,
            optician_service,
            crypto,
            config,
        })
    }
}

async fn health_handler() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "service": "visionmatch-backend",
    }))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<http::HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
            http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// Full application router: every feature router under `/api`, plus the
/// health probe and the tower-http layers.
pub fn create_app(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(customer_router(app_state.clone()))
        .merge(gdpr_router(app_state.clone()))
        .merge(optician_router(app_state.clone()))
        .merge(email_router(app_state.clone()))
        .merge(admin_router(app_state.clone()))
        .route("/health", get(health_handler));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&app_state.config))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT))
}
