// src/api/handlers/gdpr_handler.rs

use crate::api::dto::customer_dto::parse_purposes;
use crate::api::dto::gdpr_dto::{
    AuditLogEntryResponse, CancelDeletionDto, ConsentStatusResponse, DeletionRequestDto,
    DeletionResponse, ExportDocument, RightsSummary, UpdateConsentDto,
};
use crate::api::AppState;
use crate::domain::customer_model::DELETION_GRACE_DAYS;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::request_meta;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

/// Right to erasure. Soft-deletes immediately or schedules the purge after
/// the grace period; repeating the request just moves the schedule.
pub async fn request_deletion_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<DeletionRequestDto>,
) -> AppResult<ApiResponse<DeletionResponse>> {
    payload.validate()?;

    let Some(scheduled_for) = app_state
        .customer_service
        .request_deletion(
            &payload.consent_id,
            payload.immediate_delete,
            payload.reason,
            request_meta(&headers),
        )
        .await?
    else {
        return Err(AppError::NotFound("Customer not found".to_string()));
    };

    let message = if payload.immediate_delete {
        "Your data has been scheduled for immediate deletion".to_string()
    } else {
        format!(
            "Your data will be deleted in {} days unless you cancel the request",
            DELETION_GRACE_DAYS
        )
    };

    Ok(ApiResponse::success_with_message(
        DeletionResponse {
            deletion_scheduled_for: scheduled_for,
            immediate: payload.immediate_delete,
        },
        message,
    ))
}

/// Cancel a pending deletion while the grace period is still open.
pub async fn cancel_deletion_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CancelDeletionDto>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;

    app_state
        .customer_service
        .cancel_deletion(&payload.consent_id, request_meta(&headers))
        .await?;

    Ok(ApiResponse::message(
        "Deletion request cancelled. Your data will be retained.",
    ))
}

/// Right to data portability: JSON document served as an attachment.
pub async fn export_data_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(consent_id): Path<String>,
) -> AppResult<Response> {
    let customer = app_state
        .customer_service
        .export_data(&consent_id, request_meta(&headers))
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    let document = ExportDocument::new(&consent_id, customer);
    let filename_stem: String = consent_id.chars().take(8).collect();

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"visionmatch-data-{}.json\"", filename_stem),
        )],
        Json(ApiResponse::success(document)),
    )
        .into_response())
}

/// Processing history for one consent id, newest first. Client IPs are
/// redacted from customer-facing output outside development.
pub async fn audit_log_handler(
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<Vec<AuditLogEntryResponse>>> {
    if !app_state.customer_service.exists(&consent_id).await? {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }

    let redact_ip = !app_state.config.is_development();
    let entries = app_state
        .audit_log_service
        .find_by_consent_id(&consent_id)
        .await?
        .into_iter()
        .map(|model| AuditLogEntryResponse::from_model(model, redact_ip))
        .collect();

    Ok(ApiResponse::success(entries))
}

/// Right to withdraw or narrow consent: replaces the purpose set.
pub async fn update_consent_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateConsentDto>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;

    let purposes = parse_purposes(&payload.data_processing_purposes).map_err(|invalid| {
        AppError::BadRequest(format!(
            "Invalid processing purposes: {}",
            invalid.join(", ")
        ))
    })?;

    app_state
        .customer_service
        .update_consent_purposes(
            &payload.consent_id,
            purposes,
            payload.reason,
            request_meta(&headers),
        )
        .await?;

    Ok(ApiResponse::message("Consent preferences updated"))
}

/// Consent metadata and rights summary. No PII, no access tracking.
pub async fn consent_status_handler(
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<ConsentStatusResponse>> {
    let model = app_state
        .customer_service
        .consent_status(&consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    Ok(ApiResponse::success(ConsentStatusResponse {
        data_processing_purposes: model.purposes(),
        consent_id: model.consent_id,
        consent_given: model.consent_given,
        consent_timestamp: model.consent_timestamp,
        deletion_requested: model.deletion_requested,
        deletion_scheduled_for: model.deletion_scheduled_for,
        data_retention_until: model.data_retention_until,
        gdpr_rights: RightsSummary::default(),
    }))
}

// --- Router ---

pub fn gdpr_router(app_state: AppState) -> Router {
    Router::new()
        .route("/gdpr/request-deletion", post(request_deletion_handler))
        .route("/gdpr/cancel-deletion", post(cancel_deletion_handler))
        .route("/gdpr/export-data/{consent_id}", get(export_data_handler))
        .route("/gdpr/audit-log/{consent_id}", get(audit_log_handler))
        .route("/gdpr/update-consent", post(update_consent_handler))
        .route(
            "/gdpr/consent-status/{consent_id}",
            get(consent_status_handler),
        )
        .with_state(app_state)
}
