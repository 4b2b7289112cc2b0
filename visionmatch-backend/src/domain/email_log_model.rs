// src/domain/email_log_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification categories the backend sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    QuizResults,
    AppointmentConfirmation,
}

impl From<EmailType> for String {
    fn from(email_type: EmailType) -> Self {
        match email_type {
            EmailType::QuizResults => "quiz_results".to_string(),
            EmailType::AppointmentConfirmation => "appointment_confirmation".to_string(),
        }
    }
}

impl TryFrom<String> for EmailType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "quiz_results" => Ok(EmailType::QuizResults),
            "appointment_confirmation" => Ok(EmailType::AppointmentConfirmation),
            _ => Err(format!("Invalid email type: {}", value)),
        }
    }
}

/// Append-only delivery log. Stores a one-way hash of the recipient, never
/// the address itself.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub customer_consent_id: String,
    pub email_type: String,
    pub recipient_hash: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: String,
    pub provider_message_id: Option<String>,
    pub subject_line: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_type_conversions() {
        for email_type in [EmailType::QuizResults, EmailType::AppointmentConfirmation] {
            let tag = String::from(email_type);
            assert_eq!(EmailType::try_from(tag).unwrap(), email_type);
        }
        assert!(EmailType::try_from("newsletter".to_string()).is_err());
    }
}
