// src/api/dto/gdpr_dto.rs

use crate::domain::customer_model::{CustomerData, ProcessingPurpose};
use crate::domain::gdpr_audit_log_model::Model as AuditLogModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// --- Request DTOs ---

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct DeletionRequestDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,

    #[serde(default)]
    pub immediate_delete: bool,

    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CancelDeletionDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct UpdateConsentDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,

    pub data_processing_purposes: Vec<String>,

    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

// --- GDPR Article 20 export payload ---

#[derive(Serialize, Deserialize, Debug)]
pub struct DataExport {
    pub personal_data: PersonalDataExport,
    pub consent_data: ConsentDataExport,
    pub quiz_data: QuizDataExport,
    pub data_management: DataManagementExport,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PersonalDataExport {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConsentDataExport {
    pub consent_id: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub data_processing_purposes: Vec<ProcessingPurpose>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuizDataExport {
    pub quiz_answers: Option<serde_json::Value>,
    pub ai_insights: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DataManagementExport {
    pub created_at: DateTime<Utc>,
    pub data_retention_until: DateTime<Utc>,
    pub deletion_requested: bool,
    pub deletion_scheduled_for: Option<DateTime<Utc>>,
}

impl DataExport {
    pub fn from_customer(customer: CustomerData) -> Self {
        Self {
            personal_data: PersonalDataExport {
                email: customer.email,
                first_name: customer.first_name,
                last_name: customer.last_name,
                zip_code: customer.zip_code,
            },
            consent_data: ConsentDataExport {
                consent_id: customer.consent_id,
                consent_given: customer.consent_given,
                consent_timestamp: customer.consent_timestamp,
                data_processing_purposes: customer.purposes,
            },
            quiz_data: QuizDataExport {
                quiz_answers: customer.quiz_answers,
                ai_insights: customer.ai_insights,
            },
            data_management: DataManagementExport {
                created_at: customer.created_at,
                data_retention_until: customer.data_retention_until,
                deletion_requested: customer.deletion_requested,
                deletion_scheduled_for: customer.deletion_scheduled_for,
            },
        }
    }
}

/// Download document: export payload plus provenance metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct ExportDocument {
    pub export_info: ExportInfo,
    pub customer_data: DataExport,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ExportInfo {
    pub consent_id: String,
    pub exported_at: DateTime<Utc>,
    pub format: String,
}

impl ExportDocument {
    pub fn new(consent_id: &str, customer: CustomerData) -> Self {
        Self {
            export_info: ExportInfo {
                consent_id: consent_id.to_string(),
                exported_at: Utc::now(),
                format: "json".to_string(),
            },
            customer_data: DataExport::from_customer(customer),
        }
    }
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct DeletionResponse {
    pub deletion_scheduled_for: DateTime<Utc>,
    pub immediate: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuditLogEntryResponse {
    pub action_type: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub legal_basis: String,
    pub ip_address: Option<String>,
}

impl AuditLogEntryResponse {
    /// IP addresses are redacted from customer-facing output outside
    /// development.
    pub fn from_model(model: AuditLogModel, redact_ip: bool) -> Self {
        Self {
            action_type: model.action_type,
            details: model.details,
            timestamp: model.timestamp,
            legal_basis: model.legal_basis,
            ip_address: if redact_ip {
                model.ip_address.map(|_| "[redacted]".to_string())
            } else {
                model.ip_address
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConsentStatusResponse {
    pub consent_id: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub data_processing_purposes: Vec<ProcessingPurpose>,
    pub deletion_requested: bool,
    pub deletion_scheduled_for: Option<DateTime<Utc>>,
    pub data_retention_until: DateTime<Utc>,
    pub gdpr_rights: RightsSummary,
}

/// Plain-language summary of the data subject's GDPR rights, attached to
/// consent-status and profile responses.
#[derive(Serialize, Deserialize, Debug)]
pub struct RightsSummary {
    pub access: String,
    pub rectification: String,
    pub erasure: String,
    pub portability: String,
    pub withdraw_consent: String,
}

impl Default for RightsSummary {
    fn default() -> Self {
        Self {
            access: "You can request a copy of your data at any time".to_string(),
            rectification: "You can correct your personal data via the update endpoint".to_string(),
            erasure: "You can request deletion of your data (30-day grace period)".to_string(),
            portability: "You can export your data in a machine-readable format".to_string(),
            withdraw_consent: "You can change your consented processing purposes at any time"
                .to_string(),
        }
    }
}
