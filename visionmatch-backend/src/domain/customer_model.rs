// src/domain/customer_model.rs

use crate::utils::crypto::CryptoContext;
use chrono::{DateTime, Months, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default data retention: 3 years from creation.
pub const RETENTION_MONTHS: u32 = 36;

/// Grace period between a deletion request and purge eligibility.
pub const DELETION_GRACE_DAYS: i64 = 30;

/// Purposes a customer can consent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPurpose {
    QuizAnalysis,
    OpticianMatching,
    EmailCommunication,
    Marketing,
}

impl From<ProcessingPurpose> for String {
    fn from(purpose: ProcessingPurpose) -> Self {
        match purpose {
            ProcessingPurpose::QuizAnalysis => "quiz_analysis".to_string(),
            ProcessingPurpose::OpticianMatching => "optician_matching".to_string(),
            ProcessingPurpose::EmailCommunication => "email_communication".to_string(),
            ProcessingPurpose::Marketing => "marketing".to_string(),
        }
    }
}

impl TryFrom<String> for ProcessingPurpose {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "quiz_analysis" => Ok(ProcessingPurpose::QuizAnalysis),
            "optician_matching" => Ok(ProcessingPurpose::OpticianMatching),
            "email_communication" => Ok(ProcessingPurpose::EmailCommunication),
            "marketing" => Ok(ProcessingPurpose::Marketing),
            _ => Err(format!("Invalid processing purpose: {}", value)),
        }
    }
}

impl ProcessingPurpose {
    /// Purposes granted by a plain quiz submission.
    pub fn defaults() -> Vec<Self> {
        vec![
            ProcessingPurpose::QuizAnalysis,
            ProcessingPurpose::OpticianMatching,
            ProcessingPurpose::EmailCommunication,
        ]
    }

    /// Serialize a purpose list into its JSON column representation.
    pub fn encode_list(purposes: &[Self]) -> String {
        let values: Vec<String> = purposes.iter().map(|p| String::from(*p)).collect();
        serde_json::to_string(&values).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse the JSON column representation, skipping unknown tags.
    pub fn decode_list(raw: &str) -> Vec<Self> {
        serde_json::from_str::<Vec<String>>(raw)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| Self::try_from(s).ok())
            .collect()
    }
}

/// Customer record. PII columns hold ciphertext, never plaintext.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique, indexed)]
    pub consent_id: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub consent_ip: Option<String>,
    /// JSON-encoded list of [`ProcessingPurpose`] tags.
    pub data_processing_purposes: String,

    pub encrypted_email: Option<String>,
    pub encrypted_first_name: Option<String>,
    pub encrypted_last_name: Option<String>,
    pub encrypted_zip_code: Option<String>,

    /// Opaque quiz payload; never interpreted by the lifecycle layer.
    pub quiz_answers: Option<Json>,
    /// Opaque AI-insight payload.
    pub ai_insights: Option<Json>,

    pub data_retention_until: DateTime<Utc>,
    pub deletion_requested: bool,
    #[sea_orm(indexed)]
    pub deletion_scheduled_for: Option<DateTime<Utc>>,

    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Purge eligibility: retention elapsed, or a deletion schedule elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.data_retention_until <= now
            || self.deletion_scheduled_for.is_some_and(|at| at <= now)
    }

    pub fn purposes(&self) -> Vec<ProcessingPurpose> {
        ProcessingPurpose::decode_list(&self.data_processing_purposes)
    }
}

/// Default retention deadline for a record created at `created_at`.
pub fn retention_date(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at
        .checked_add_months(Months::new(RETENTION_MONTHS))
        .unwrap_or(created_at)
}

/// Plaintext view of a customer row, produced by decrypting the PII columns.
///
/// Only ever built from rows that passed the soft-delete filter; `None`
/// fields mean "undecryptable", not "empty".
#[derive(Debug, Clone, Serialize)]
pub struct CustomerData {
    pub id: Uuid,
    pub consent_id: String,
    pub consent_given: bool,
    pub consent_timestamp: Option<DateTime<Utc>>,
    pub consent_ip: Option<String>,
    pub purposes: Vec<ProcessingPurpose>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub zip_code: Option<String>,
    pub quiz_answers: Option<Json>,
    pub ai_insights: Option<Json>,
    pub data_retention_until: DateTime<Utc>,
    pub deletion_requested: bool,
    pub deletion_scheduled_for: Option<DateTime<Utc>>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i32,
    pub created_at: DateTime<Utc>,
}

impl CustomerData {
    pub fn from_model(model: Model, crypto: &CryptoContext) -> Self {
        let decrypt = |field: &Option<String>| field.as_deref().and_then(|c| crypto.decrypt(c));
        let email = decrypt(&model.encrypted_email);
        let first_name = decrypt(&model.encrypted_first_name);
        let last_name = decrypt(&model.encrypted_last_name);
        let zip_code = decrypt(&model.encrypted_zip_code);

        let mut data = Self::metadata_only(model);
        data.email = email;
        data.first_name = first_name;
        data.last_name = last_name;
        data.zip_code = zip_code;
        data
    }

    /// Metadata view that leaves the ciphertext sealed. Once deletion has
    /// been requested the PII columns must not be decrypted again.
    pub fn metadata_only(model: Model) -> Self {
        Self {
            email: None,
            first_name: None,
            last_name: None,
            zip_code: None,
            purposes: model.purposes(),
            id: model.id,
            consent_id: model.consent_id,
            consent_given: model.consent_given,
            consent_timestamp: model.consent_timestamp,
            consent_ip: model.consent_ip,
            quiz_answers: model.quiz_answers,
            ai_insights: model.ai_insights,
            data_retention_until: model.data_retention_until,
            deletion_requested: model.deletion_requested,
            deletion_scheduled_for: model.deletion_scheduled_for,
            last_accessed: model.last_accessed,
            access_count: model.access_count,
            created_at: model.created_at,
        }
    }
}

/// Input for creating a customer record from a quiz submission.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub zip_code: String,
    pub consent_ip: Option<String>,
    pub purposes: Vec<ProcessingPurpose>,
    pub quiz_answers: Option<Json>,
    pub ai_insights: Option<Json>,
}
