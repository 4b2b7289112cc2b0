// src/api/handlers/admin_handler.rs

use crate::api::dto::admin_dto::{AdminCustomerSummary, AdminStats, CleanupResponse};
use crate::api::dto::gdpr_dto::AuditLogEntryResponse;
use crate::api::AppState;
use crate::domain::customer_model::CustomerData;
use crate::domain::email_log_model::Model as EmailLogModel;
use crate::domain::optician_model::Model as OpticianModel;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AdminAuth;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tracing::info;

const ADMIN_EMAIL_HISTORY_LIMIT: u64 = 50;

/// Pseudonymized customer listing. PII stays encrypted; only presence
/// flags leave the database.
pub async fn list_customers_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AdminCustomerSummary>>> {
    let customers = app_state
        .customer_service
        .list_all()
        .await?
        .into_iter()
        .map(AdminCustomerSummary::from)
        .collect();
    Ok(ApiResponse::success(customers))
}

/// Single-customer view, including soft-deleted records. Rows with a
/// pending deletion are returned metadata-only, never decrypted.
pub async fn get_customer_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<CustomerData>> {
    let customer = app_state
        .customer_service
        .admin_view(&consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(ApiResponse::success(customer))
}

/// Unredacted audit trail for one consent id.
pub async fn audit_log_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<Vec<AuditLogEntryResponse>>> {
    let entries = app_state
        .audit_log_service
        .find_by_consent_id(&consent_id)
        .await?
        .into_iter()
        .map(|model| AuditLogEntryResponse::from_model(model, false))
        .collect();
    Ok(ApiResponse::success(entries))
}

pub async fn email_log_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<Vec<EmailLogModel>>> {
    let logs = app_state
        .email_service
        .recent(ADMIN_EMAIL_HISTORY_LIMIT)
        .await?;
    Ok(ApiResponse::success(logs))
}

pub async fn list_opticians_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OpticianModel>>> {
    let opticians = app_state.optician_service.list_all().await?;
    Ok(ApiResponse::success(opticians))
}

pub async fn stats_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<AdminStats>> {
    let (total_customers, pending_deletions) = app_state.customer_service.stats().await?;
    let total_audit_entries = app_state.audit_log_service.count_all().await?;
    let total_emails_sent = app_state.email_service.count_all().await?;
    let total_opticians = app_state.optician_service.count_all().await?;

    Ok(ApiResponse::success(AdminStats {
        total_customers,
        pending_deletions,
        total_audit_entries,
        total_emails_sent,
        total_opticians,
    }))
}

/// Manual trigger for the expiry sweep the scheduler runs every 24 h.
pub async fn cleanup_handler(
    _admin: AdminAuth,
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<CleanupResponse>> {
    let deleted_records = app_state
        .customer_service
        .cleanup_expired_data(Utc::now())
        .await?;
    info!(deleted_records, "Manual GDPR cleanup triggered via admin API");
    Ok(ApiResponse::success(CleanupResponse { deleted_records }))
}

// --- Router ---

pub fn admin_router(app_state: AppState) -> Router {
    Router::new()
        .route("/admin/customers", get(list_customers_handler))
        .route("/admin/customers/{consent_id}", get(get_customer_handler))
        .route("/admin/audit/{consent_id}", get(audit_log_handler))
        .route("/admin/emails", get(email_log_handler))
        .route("/admin/opticians", get(list_opticians_handler))
        .route("/admin/stats", get(stats_handler))
        .route("/admin/cleanup", post(cleanup_handler))
        .with_state(app_state)
}
