// src/api/handlers/email_handler.rs

use crate::api::dto::email_dto::{
    AppointmentReminderDto, EmailStatusEntry, ResendQuizResultsDto, UnsubscribeDto,
};
use crate::api::AppState;
use crate::domain::customer_model::CustomerData;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::request_meta;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

/// Re-send the stored quiz results. 403 when the customer has withdrawn
/// the email-communication purpose.
pub async fn resend_quiz_results_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ResendQuizResultsDto>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;

    let model = app_state
        .customer_service
        .consent_status(&payload.consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    let customer = CustomerData::from_model(model, &app_state.crypto);

    app_state.email_service.send_quiz_results(&customer).await?;

    Ok(ApiResponse::message("Quiz results email sent"))
}

/// Remind the customer of an appointment the caller describes, for
/// bookings made outside the directory.
pub async fn appointment_reminder_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<AppointmentReminderDto>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;

    let model = app_state
        .customer_service
        .consent_status(&payload.consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    let customer = CustomerData::from_model(model, &app_state.crypto);

    app_state
        .email_service
        .send_appointment_reminder(&customer, &payload.appointment_details.into_details())
        .await?;

    Ok(ApiResponse::message("Appointment reminder sent"))
}

/// Delivery history for one consent id: type, time, status, subject.
/// Recipient addresses are never stored, so none are returned.
pub async fn email_status_handler(
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<Vec<EmailStatusEntry>>> {
    if !app_state.customer_service.exists(&consent_id).await? {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }

    let entries = app_state
        .email_service
        .history_for(&consent_id)
        .await?
        .into_iter()
        .map(EmailStatusEntry::from)
        .collect();

    Ok(ApiResponse::success(entries))
}

/// Drop the email-communication purpose after verifying the supplied
/// address against the stored one.
pub async fn unsubscribe_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UnsubscribeDto>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;

    app_state
        .customer_service
        .unsubscribe_email(
            &payload.consent_id,
            &payload.email,
            payload.reason,
            request_meta(&headers),
        )
        .await?;

    Ok(ApiResponse::message("Unsubscribed from email communication"))
}

// --- Router ---

pub fn email_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/email/resend-quiz-results",
            post(resend_quiz_results_handler),
        )
        .route(
            "/email/appointment-reminder",
            post(appointment_reminder_handler),
        )
        .route("/email/status/{consent_id}", get(email_status_handler))
        .route("/email/unsubscribe", post(unsubscribe_handler))
        .with_state(app_state)
}
