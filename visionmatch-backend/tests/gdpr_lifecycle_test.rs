// tests/gdpr_lifecycle_test.rs
//
// Service-level coverage of the consent and deletion lifecycle.

mod common;

use chrono::{Duration, Utc};
use common::setup_app_state;
use visionmatch_backend::domain::customer_model::{NewCustomer, ProcessingPurpose};
use visionmatch_backend::error::AppError;
use visionmatch_backend::service::customer_service::{PersonalFieldUpdates, RequestMeta};

fn sample_input() -> NewCustomer {
    NewCustomer {
        email: "jane.doe@example.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        zip_code: "10001".to_string(),
        consent_ip: Some("203.0.113.7".to_string()),
        purposes: vec![],
        quiz_answers: Some(serde_json::json!({"frame_style": "round"})),
        ai_insights: None,
    }
}

#[tokio::test]
async fn test_pii_round_trip_through_save_and_find() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    // ciphertext at rest
    assert_ne!(
        model.encrypted_email.as_deref(),
        Some("jane.doe@example.com")
    );
    assert_eq!(model.consent_id.len(), 64);

    let customer = state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .expect("customer should be visible");

    assert_eq!(customer.email.as_deref(), Some("jane.doe@example.com"));
    assert_eq!(customer.first_name.as_deref(), Some("Jane"));
    assert_eq!(customer.zip_code.as_deref(), Some("10001"));
    assert_eq!(customer.purposes, ProcessingPurpose::defaults());
}

#[tokio::test]
async fn test_reads_bump_access_count() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let first = state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.access_count, 0);

    let second = state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.access_count, 1);
    assert!(second.last_accessed.is_some());
}

#[tokio::test]
async fn test_soft_delete_makes_customer_invisible() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let matched = state
        .customer_service
        .request_deletion(&model.consent_id, false, None, RequestMeta::default())
        .await
        .unwrap();
    assert!(matched.is_some());

    assert!(state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .is_none());
    assert!(state
        .customer_service
        .consent_status(&model.consent_id)
        .await
        .unwrap()
        .is_none());

    // admin view still resolves the soft-deleted row, metadata only
    let admin = state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert!(admin.deletion_requested);
    assert!(admin.email.is_none());
}

#[tokio::test]
async fn test_admin_view_keeps_deletion_pending_pii_sealed() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let before = state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before.email.as_deref(), Some("jane.doe@example.com"));

    state
        .customer_service
        .request_deletion(&model.consent_id, false, None, RequestMeta::default())
        .await
        .unwrap();

    let after = state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert!(after.deletion_requested);
    assert!(after.email.is_none());
    assert!(after.first_name.is_none());
    assert!(after.last_name.is_none());
    assert!(after.zip_code.is_none());
    assert_eq!(after.consent_id, model.consent_id);
}

#[tokio::test]
async fn test_deletion_schedule_grace_vs_immediate() {
    let state = setup_app_state().await;
    let graced = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();
    let immediate = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let graced_schedule = state
        .customer_service
        .request_deletion(&graced.consent_id, false, None, RequestMeta::default())
        .await
        .unwrap()
        .unwrap();
    let immediate_schedule = state
        .customer_service
        .request_deletion(&immediate.consent_id, true, None, RequestMeta::default())
        .await
        .unwrap()
        .unwrap();

    let graced_row = state
        .customer_service
        .admin_view(&graced.consent_id)
        .await
        .unwrap()
        .unwrap();
    let immediate_row = state
        .customer_service
        .admin_view(&immediate.consent_id)
        .await
        .unwrap()
        .unwrap();

    let now = Utc::now();
    let graced_at = graced_row.deletion_scheduled_for.unwrap();
    assert!(graced_at > now + Duration::days(29));
    assert!(graced_at < now + Duration::days(31));

    let immediate_at = immediate_row.deletion_scheduled_for.unwrap();
    assert!(immediate_at <= now);

    // the returned schedule is the one that was persisted
    assert_eq!(
        graced_at.timestamp_millis(),
        graced_schedule.timestamp_millis()
    );
    assert_eq!(
        immediate_at.timestamp_millis(),
        immediate_schedule.timestamp_millis()
    );
}

#[tokio::test]
async fn test_request_deletion_unknown_id_returns_none() {
    let state = setup_app_state().await;
    let matched = state
        .customer_service
        .request_deletion(&"f".repeat(64), false, None, RequestMeta::default())
        .await
        .unwrap();
    assert!(matched.is_none());
}

#[tokio::test]
async fn test_cancel_within_grace_restores_visibility() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    state
        .customer_service
        .request_deletion(&model.consent_id, false, None, RequestMeta::default())
        .await
        .unwrap();
    state
        .customer_service
        .cancel_deletion(&model.consent_id, RequestMeta::default())
        .await
        .unwrap();

    let customer = state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .expect("customer should be visible again");
    assert!(!customer.deletion_requested);
    assert!(customer.deletion_scheduled_for.is_none());
}

#[tokio::test]
async fn test_cancel_after_grace_is_rejected() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    // immediate schedule means the grace window is already over
    state
        .customer_service
        .request_deletion(&model.consent_id, true, None, RequestMeta::default())
        .await
        .unwrap();

    let err = state
        .customer_service
        .cancel_deletion(&model.consent_id, RequestMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GracePeriodExpired(_)));

    // row untouched
    let row = state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.deletion_requested);
}

#[tokio::test]
async fn test_cancel_without_pending_request() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let err = state
        .customer_service
        .cancel_deletion(&model.consent_id, RequestMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = state
        .customer_service
        .cancel_deletion(&"0".repeat(64), RequestMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cleanup_deletes_scheduled_rows_and_is_idempotent() {
    let state = setup_app_state().await;
    let doomed = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();
    let survivor = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    state
        .customer_service
        .request_deletion(&doomed.consent_id, true, None, RequestMeta::default())
        .await
        .unwrap();

    let deleted = state
        .customer_service
        .cleanup_expired_data(Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    assert!(state
        .customer_service
        .admin_view(&doomed.consent_id)
        .await
        .unwrap()
        .is_none());
    assert!(state
        .customer_service
        .admin_view(&survivor.consent_id)
        .await
        .unwrap()
        .is_some());

    // second sweep finds nothing
    let deleted = state
        .customer_service
        .cleanup_expired_data(Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_cleanup_purges_past_retention_deadline() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    // nothing expires today
    assert_eq!(
        state
            .customer_service
            .cleanup_expired_data(Utc::now())
            .await
            .unwrap(),
        0
    );

    // four years out, the 36-month retention window has lapsed
    let far_future = Utc::now() + Duration::days(4 * 365);
    assert_eq!(
        state
            .customer_service
            .cleanup_expired_data(far_future)
            .await
            .unwrap(),
        1
    );
    assert!(state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_each_operation_appends_matching_audit_entry() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let actions = |entries: Vec<visionmatch_backend::domain::gdpr_audit_log_model::Model>| {
        entries
            .into_iter()
            .map(|e| e.action_type)
            .collect::<Vec<_>>()
    };

    let entries = state
        .audit_log_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap();
    assert_eq!(actions(entries), vec!["data_saved"]);

    state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap();
    state
        .customer_service
        .export_data(&model.consent_id, RequestMeta::default())
        .await
        .unwrap();
    state
        .customer_service
        .request_deletion(&model.consent_id, false, None, RequestMeta::default())
        .await
        .unwrap();
    state
        .customer_service
        .cancel_deletion(&model.consent_id, RequestMeta::default())
        .await
        .unwrap();

    let entries = state
        .audit_log_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap();
    // newest first
    assert_eq!(
        actions(entries),
        vec![
            "deletion_cancelled",
            "deletion_requested",
            "data_exported",
            "data_accessed",
            "data_saved",
        ]
    );
}

#[tokio::test]
async fn test_export_is_non_tracking() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let exported = state
        .customer_service
        .export_data(&model.consent_id, RequestMeta::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exported.email.as_deref(), Some("jane.doe@example.com"));
    assert_eq!(exported.access_count, 0);

    // access counter untouched by the export
    let row = state
        .customer_service
        .admin_view(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.access_count, 0);
}

#[tokio::test]
async fn test_update_personal_fields() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let updated = state
        .customer_service
        .update_personal_fields(
            &model.consent_id,
            PersonalFieldUpdates {
                email: Some("new.address@example.com".to_string()),
                ..Default::default()
            },
            RequestMeta::default(),
        )
        .await
        .unwrap();
    assert_eq!(updated, vec!["email"]);

    let customer = state
        .customer_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.email.as_deref(), Some("new.address@example.com"));
    assert_eq!(customer.first_name.as_deref(), Some("Jane"));

    let err = state
        .customer_service
        .update_personal_fields(
            &model.consent_id,
            PersonalFieldUpdates::default(),
            RequestMeta::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_update_consent_purposes_replaces_set() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    state
        .customer_service
        .update_consent_purposes(
            &model.consent_id,
            vec![ProcessingPurpose::QuizAnalysis],
            Some("narrowing consent".to_string()),
            RequestMeta::default(),
        )
        .await
        .unwrap();

    let row = state
        .customer_service
        .consent_status(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.purposes(), vec![ProcessingPurpose::QuizAnalysis]);
}

#[tokio::test]
async fn test_unsubscribe_verifies_email() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    let err = state
        .customer_service
        .unsubscribe_email(
            &model.consent_id,
            "wrong@example.com",
            None,
            RequestMeta::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state
        .customer_service
        .unsubscribe_email(
            &model.consent_id,
            "jane.doe@example.com",
            None,
            RequestMeta::default(),
        )
        .await
        .unwrap();

    let row = state
        .customer_service
        .consent_status(&model.consent_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!row
        .purposes()
        .contains(&ProcessingPurpose::EmailCommunication));
}

#[tokio::test]
async fn test_permanent_delete_removes_row_and_audits() {
    let state = setup_app_state().await;
    let model = state
        .customer_service
        .submit_quiz(sample_input())
        .await
        .unwrap();

    assert!(state
        .customer_service
        .permanently_delete(&model.consent_id)
        .await
        .unwrap());
    assert!(!state
        .customer_service
        .permanently_delete(&model.consent_id)
        .await
        .unwrap());

    let entries = state
        .audit_log_service
        .find_by_consent_id(&model.consent_id)
        .await
        .unwrap();
    assert!(entries.iter().any(|e| e.action_type == "data_deleted"));
}
