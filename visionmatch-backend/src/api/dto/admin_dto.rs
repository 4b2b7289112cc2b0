// src/api/dto/admin_dto.rs

use crate::domain::customer_model::{Model as CustomerModel, ProcessingPurpose};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pseudonymized listing row: presence flags only, never decrypted PII.
#[derive(Serialize, Deserialize, Debug)]
pub struct AdminCustomerSummary {
    pub id: Uuid,
    pub consent_id: String,
    pub consent_given: bool,
    pub has_email: bool,
    pub has_name: bool,
    pub has_zip_code: bool,
    pub data_processing_purposes: Vec<ProcessingPurpose>,
    pub deletion_requested: bool,
    pub deletion_scheduled_for: Option<DateTime<Utc>>,
    pub data_retention_until: DateTime<Utc>,
    pub access_count: i32,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CustomerModel> for AdminCustomerSummary {
    fn from(model: CustomerModel) -> Self {
        Self {
            has_email: model.encrypted_email.is_some(),
            has_name: model.encrypted_first_name.is_some() || model.encrypted_last_name.is_some(),
            has_zip_code: model.encrypted_zip_code.is_some(),
            data_processing_purposes: model.purposes(),
            id: model.id,
            consent_id: model.consent_id,
            consent_given: model.consent_given,
            deletion_requested: model.deletion_requested,
            deletion_scheduled_for: model.deletion_scheduled_for,
            data_retention_until: model.data_retention_until,
            access_count: model.access_count,
            last_accessed: model.last_accessed,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AdminStats {
    pub total_customers: u64,
    pub pending_deletions: u64,
    pub total_audit_entries: u64,
    pub total_emails_sent: u64,
    pub total_opticians: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CleanupResponse {
    pub deleted_records: u64,
}
