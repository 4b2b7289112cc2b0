// src/error.rs

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("GDPR consent required: {0}")]
    ConsentRequired(String),

    #[error("Grace period expired: {0}")]
    GracePeriodExpired(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::DbErr(db_err) => {
                // サーバーログには詳細を出す（レスポンスには出さない）
                tracing::error!(error = ?db_err, "Database error");

                let status = match db_err {
                    DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let message = match &db_err {
                    DbErr::RecordNotFound(_) => "The requested resource was not found",
                    _ => "A database error occurred",
                };

                (
                    status,
                    ErrorResponse {
                        success: false,
                        message: message.to_string(),
                        details: None,
                        error_type: "database_error".to_string(),
                    },
                )
            }
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "not_found".to_string(),
                },
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "validation_error".to_string(),
                },
            ),
            AppError::ValidationFailure(errors) => {
                let details: Vec<serde_json::Value> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errors)| {
                        errors
                            .iter()
                            .map(move |e| {
                                let message = e
                                    .message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string());
                                json!({ "field": field, "message": message })
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        success: false,
                        message: "Validation failed".to_string(),
                        details: Some(json!(details)),
                        error_type: "validation_error".to_string(),
                    },
                )
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "bad_request".to_string(),
                },
            ),
            AppError::ConsentRequired(message) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    success: false,
                    message,
                    details: Some(json!({ "code": "CONSENT_REQUIRED" })),
                    error_type: "consent_required".to_string(),
                },
            ),
            AppError::GracePeriodExpired(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "grace_period_expired".to_string(),
                },
            ),
            AppError::Unauthorized(message) => {
                // Basic認証のチャレンジヘッダーを付与する
                let body = ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "unauthorized".to_string(),
                };
                return (
                    StatusCode::UNAUTHORIZED,
                    [(
                        header::WWW_AUTHENTICATE,
                        "Basic realm=\"VisionMatch Admin\"",
                    )],
                    Json(body),
                )
                    .into_response();
            }
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    success: false,
                    message,
                    details: None,
                    error_type: "forbidden".to_string(),
                },
            ),
            AppError::InternalServerError(message) => {
                tracing::error!(%message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        success: false,
                        message: "An internal server error occurred".to_string(),
                        details: None,
                        error_type: "internal_server_error".to_string(),
                    },
                )
            }
            AppError::ExternalServiceError(message) => {
                tracing::error!(%message, "External service error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        success: false,
                        message: "External service error".to_string(),
                        details: None,
                        error_type: "external_service_error".to_string(),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub error_type: String,
}
