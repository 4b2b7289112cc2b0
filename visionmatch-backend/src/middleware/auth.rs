// src/middleware/auth.rs

use crate::api::AppState;
use crate::error::AppError;
use crate::service::customer_service::RequestMeta;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

const ADMIN_USERNAME: &str = "admin";

/// Marker extractor proving the request carried valid admin credentials.
///
/// HTTP Basic auth against the configured admin password. A missing or
/// invalid header rejects with 401 and a `WWW-Authenticate` challenge.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let encoded = header_value
            .strip_prefix("Basic ")
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        let Some((username, password)) = decoded.split_once(':') else {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };

        if username != ADMIN_USERNAME || password != state.config.admin_password {
            warn!("Rejected admin login attempt");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        Ok(AdminAuth)
    }
}

/// Best-effort client IP: first entry of `X-Forwarded-For`, then
/// `X-Real-IP`. `None` when neither header is present.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Requester metadata for audit entries, pulled from request headers.
pub fn request_meta(headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        ip: client_ip(headers),
        user_agent: user_agent(headers),
    }
}
