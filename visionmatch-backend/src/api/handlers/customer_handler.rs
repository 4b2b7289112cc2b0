// src/api/handlers/customer_handler.rs

use crate::api::dto::customer_dto::{
    parse_purposes, BookAppointmentDto, BookAppointmentResponse, CustomerProfileResponse,
    QuizSubmissionDto, QuizSubmissionResponse, UpdateCustomerDto, UpdateCustomerResponse,
};
use crate::api::dto::gdpr_dto::RightsSummary;
use crate::api::AppState;
use crate::domain::customer_model::{CustomerData, NewCustomer};
use crate::domain::gdpr_audit_log_model::{AuditAction, AuditEntry};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::request_meta;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tracing::warn;
use validator::Validate;

/// Consented quiz submission: creates the customer record and fires the
/// results email best-effort. Refused outright (no row, no audit entry)
/// without explicit consent.
pub async fn submit_quiz_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<QuizSubmissionDto>,
) -> AppResult<ApiResponse<QuizSubmissionResponse>> {
    payload.validate()?;

    if !payload.consent_given {
        return Err(AppError::ConsentRequired(
            "Explicit consent is required to process your data".to_string(),
        ));
    }

    let purposes = parse_purposes(&payload.data_processing_purposes).map_err(|invalid| {
        AppError::BadRequest(format!(
            "Invalid processing purposes: {}",
            invalid.join(", ")
        ))
    })?;

    let meta = request_meta(&headers);
    let purposes_label = if payload.data_processing_purposes.is_empty() {
        "default purposes".to_string()
    } else {
        payload.data_processing_purposes.join(", ")
    };

    let model = app_state
        .customer_service
        .submit_quiz(NewCustomer {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            zip_code: payload.zip_code,
            consent_ip: meta.ip.clone(),
            purposes,
            quiz_answers: payload.quiz_answers,
            ai_insights: payload.ai_insights,
        })
        .await?;

    app_state
        .audit_log_service
        .record(
            AuditEntry::new(
                &model.consent_id,
                AuditAction::ConsentGiven,
                format!("Consent given for: {}", purposes_label),
            )
            .with_requester(meta.ip, meta.user_agent),
        )
        .await;

    let customer = CustomerData::from_model(model, &app_state.crypto);
    let email_sent = match app_state.email_service.send_quiz_results(&customer).await {
        Ok(_) => true,
        Err(err) => {
            warn!(consent_id = %customer.consent_id, %err, "Quiz results email failed");
            false
        }
    };

    Ok(ApiResponse::created(QuizSubmissionResponse {
        customer_id: customer.id,
        consent_id: customer.consent_id,
        data_retention_until: customer.data_retention_until,
        email_sent,
    }))
}

/// Decrypted customer profile. Reads are access-tracked and audited.
pub async fn get_customer_handler(
    State(app_state): State<AppState>,
    Path(consent_id): Path<String>,
) -> AppResult<ApiResponse<CustomerProfileResponse>> {
    let customer = app_state
        .customer_service
        .find_by_consent_id(&consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    Ok(ApiResponse::success(CustomerProfileResponse {
        customer,
        gdpr_rights: RightsSummary::default(),
    }))
}

/// Partial update of the personal fields.
pub async fn update_customer_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(consent_id): Path<String>,
    Json(payload): Json<UpdateCustomerDto>,
) -> AppResult<ApiResponse<UpdateCustomerResponse>> {
    payload.validate()?;

    let updated = app_state
        .customer_service
        .update_personal_fields(&consent_id, payload.into_updates(), request_meta(&headers))
        .await?;

    Ok(ApiResponse::success(UpdateCustomerResponse {
        updated_fields: updated.iter().map(|f| f.to_string()).collect(),
    }))
}

/// Appointment request with a matched optician. The confirmation email is
/// best-effort; the booking audit entry is written regardless.
pub async fn book_appointment_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(consent_id): Path<String>,
    Json(payload): Json<BookAppointmentDto>,
) -> AppResult<ApiResponse<BookAppointmentResponse>> {
    payload.validate()?;

    let model = app_state
        .customer_service
        .consent_status(&consent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    let customer = CustomerData::from_model(model, &app_state.crypto);

    let optician = app_state
        .optician_service
        .find_by_id(payload.optician_id)
        .await?;

    let meta = request_meta(&headers);
    app_state
        .audit_log_service
        .record(
            AuditEntry::new(
                &consent_id,
                AuditAction::AppointmentBooked,
                format!(
                    "Appointment requested with {} for {} at {}",
                    optician.name, payload.preferred_date, payload.preferred_time
                ),
            )
            .with_requester(meta.ip, meta.user_agent),
        )
        .await;

    let email_sent = match app_state
        .email_service
        .send_appointment_confirmation(
            &customer,
            &optician,
            &payload.preferred_date,
            &payload.preferred_time,
        )
        .await
    {
        Ok(_) => true,
        Err(err) => {
            warn!(consent_id = %consent_id, %err, "Appointment confirmation email failed");
            false
        }
    };

    Ok(ApiResponse::success(BookAppointmentResponse {
        optician_name: optician.name,
        preferred_date: payload.preferred_date,
        preferred_time: payload.preferred_time,
        email_sent,
    }))
}

// --- Router ---

pub fn customer_router(app_state: AppState) -> Router {
    Router::new()
        .route("/customers/quiz-submit", post(submit_quiz_handler))
        .route(
            "/customers/{consent_id}",
            get(get_customer_handler).put(update_customer_handler),
        )
        .route(
            "/customers/{consent_id}/book-appointment",
            post(book_appointment_handler),
        )
        .with_state(app_state)
}
