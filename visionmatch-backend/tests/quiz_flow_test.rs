// tests/quiz_flow_test.rs
//
// HTTP-level coverage of the quiz and GDPR endpoints.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{admin_request, body_json, get_request, json_request, setup_app};
use serde_json::json;
use tower::util::ServiceExt;

fn quiz_payload() -> serde_json::Value {
    json!({
        "email": "jane.doe@example.com",
        "first_name": "Jane",
        "last_name": "Doe",
        "zip_code": "10001",
        "consent_given": true,
        "quiz_answers": {"frame_style": "round", "usage": "screens"}
    })
}

async fn submit_quiz(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/customers/quiz-submit",
            &quiz_payload(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    body["data"]["consent_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_quiz_submit_creates_customer() {
    let (app, _state) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/customers/quiz-submit",
            &quiz_payload(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let consent_id = body["data"]["consent_id"].as_str().unwrap();
    assert_eq!(consent_id.len(), 64);
    assert!(body["data"]["email_sent"].as_bool().unwrap());
    assert!(body["data"]["data_retention_until"].is_string());
}

#[tokio::test]
async fn test_quiz_submit_without_consent_is_rejected() {
    let (app, state) = setup_app().await;

    let mut payload = quiz_payload();
    payload["consent_given"] = json!(false);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/customers/quiz-submit",
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error_type"], "consent_required");

    // no row, no audit entry
    let (total, _) = state.customer_service.stats().await.unwrap();
    assert_eq!(total, 0);
    assert_eq!(state.audit_log_service.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn test_quiz_submit_validation_errors() {
    let (app, _state) = setup_app().await;

    let mut payload = quiz_payload();
    payload["email"] = json!("not-an-email");
    payload["zip_code"] = json!("12");

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/customers/quiz-submit",
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quiz_submit_rejects_unknown_purposes() {
    let (app, _state) = setup_app().await;

    let mut payload = quiz_payload();
    payload["data_processing_purposes"] = json!(["quiz_analysis", "telepathy"]);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/customers/quiz-submit",
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("telepathy"));
}

#[tokio::test]
async fn test_get_customer_profile() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/customers/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["customer"]["email"], "jane.doe@example.com");
    assert!(body["data"]["gdpr_rights"]["erasure"].is_string());

    let response = app
        .oneshot(get_request(&format!("/api/customers/{}", "e".repeat(64))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_gdpr_lifecycle_over_http() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    // export with attachment header
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/gdpr/export-data/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["customer_data"]["personal_data"]["email"],
        "jane.doe@example.com"
    );
    assert_eq!(body["data"]["export_info"]["format"], "json");

    // request deletion with grace period
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/request-deletion",
            &json!({ "consent_id": consent_id, "reason": "no longer interested" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["immediate"], false);

    // customer is now invisible
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/customers/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // cancel within the grace period
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/cancel-deletion",
            &json!({ "consent_id": consent_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // visible again
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/customers/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // audit trail records the whole journey
    let response = app
        .oneshot(get_request(&format!("/api/gdpr/audit-log/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action_type"].as_str().unwrap())
        .collect();
    for expected in [
        "consent_given",
        "data_saved",
        "data_exported",
        "deletion_requested",
        "deletion_cancelled",
    ] {
        assert!(actions.contains(&expected), "missing action {}", expected);
    }
}

#[tokio::test]
async fn test_cancel_after_grace_returns_grace_period_expired() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/request-deletion",
            &json!({ "consent_id": consent_id, "immediate_delete": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/cancel-deletion",
            &json!({ "consent_id": consent_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "grace_period_expired");
}

#[tokio::test]
async fn test_consent_status_and_update() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/update-consent",
            &json!({
                "consent_id": consent_id,
                "data_processing_purposes": ["quiz_analysis", "optician_matching"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(&format!(
            "/api/gdpr/consent-status/{}",
            consent_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["data_processing_purposes"],
        json!(["quiz_analysis", "optician_matching"])
    );
    // metadata only, no PII
    assert!(body["data"].get("email").is_none());
}

#[tokio::test]
async fn test_optician_search_and_booking() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/opticians/search?zip_code=10001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let opticians = body["data"]["opticians"].as_array().unwrap();
    assert!(!opticians.is_empty());
    let optician_id = opticians[0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/customers/{}/book-appointment", consent_id),
            &json!({
                "optician_id": optician_id,
                "preferred_date": "2026-09-15",
                "preferred_time": "14:30"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["email_sent"].as_bool().unwrap());

    // unknown optician id
    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/customers/{}/book-appointment", consent_id),
            &json!({
                "optician_id": 99999,
                "preferred_date": "2026-09-15",
                "preferred_time": "14:30"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_status_and_unsubscribe() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/email/status/{}", consent_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["email_type"], "quiz_results");

    // wrong address is refused
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/email/unsubscribe",
            &json!({ "consent_id": consent_id, "email": "wrong@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/email/unsubscribe",
            &json!({ "consent_id": consent_id, "email": "jane.doe@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // resend now fails on the withdrawn purpose
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/email/resend-quiz-results",
            &json!({ "consent_id": consent_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_appointment_reminder_email() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let reminder = json!({
        "consent_id": consent_id,
        "appointment_details": {
            "optician_name": "VisionCare Optometry",
            "date": "2026-09-15 14:00",
            "address": "123 Main Street, New York",
            "phone": "(212) 555-0101"
        }
    });

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/email/appointment-reminder",
            &reminder,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    // the reminder leaves its own delivery record
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/email/status/{}", consent_id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries
        .iter()
        .any(|e| e["email_type"] == "appointment_confirmation"));

    // unknown customer
    let mut unknown = reminder.clone();
    unknown["consent_id"] = json!("f".repeat(64));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/email/appointment-reminder",
            &unknown,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_optician_service_catalog() {
    let (app, _state) = setup_app().await;

    let response = app
        .oneshot(get_request("/api/opticians/meta/services"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["total_opticians"], 3);

    let services: Vec<&str> = body["data"]["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(services.contains(&"Eye Exams"));
    // deduplicated and sorted: both New York and Chicago offer eye exams
    assert_eq!(
        services.iter().filter(|s| **s == "Eye Exams").count(),
        1
    );
    let mut sorted = services.clone();
    sorted.sort_unstable();
    assert_eq!(services, sorted);

    assert!(body["data"]["specialties"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "Glaucoma Screening"));
}

#[tokio::test]
async fn test_admin_endpoints_require_basic_auth() {
    let (app, _state) = setup_app().await;
    submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/customers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("Basic"));

    let response = app
        .clone()
        .oneshot(admin_request(Method::GET, "/api/admin/customers", "wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(admin_request(
            Method::GET,
            "/api/admin/customers",
            "admin123",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let customers = body["data"].as_array().unwrap();
    assert_eq!(customers.len(), 1);
    // pseudonymized: flags only, never plaintext PII
    assert_eq!(customers[0]["has_email"], true);
    assert!(customers[0].get("email").is_none());
    assert!(!body.to_string().contains("jane.doe@example.com"));
}

#[tokio::test]
async fn test_admin_stats_and_cleanup() {
    let (app, _state) = setup_app().await;
    let consent_id = submit_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/gdpr/request-deletion",
            &json!({ "consent_id": consent_id, "immediate_delete": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(admin_request(Method::GET, "/api/admin/stats", "admin123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_customers"], 1);
    assert_eq!(body["data"]["pending_deletions"], 1);
    assert_eq!(body["data"]["total_opticians"], 3);

    let response = app
        .clone()
        .oneshot(admin_request(Method::POST, "/api/admin/cleanup", "admin123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["deleted_records"], 1);

    let response = app
        .oneshot(admin_request(Method::GET, "/api/admin/stats", "admin123"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_customers"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = setup_app().await;

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}
