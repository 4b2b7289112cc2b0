// src/api/dto/customer_dto.rs

use crate::domain::customer_model::{CustomerData, ProcessingPurpose};
use crate::service::customer_service::PersonalFieldUpdates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// --- Request DTOs ---

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct QuizSubmissionDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,

    #[validate(length(min = 5, max = 10, message = "Zip code must be between 5 and 10 characters"))]
    pub zip_code: String,

    pub consent_given: bool,

    /// 省略時はデフォルトの目的セットを適用
    #[serde(default)]
    pub data_processing_purposes: Vec<String>,

    pub quiz_answers: Option<serde_json::Value>,
    pub ai_insights: Option<serde_json::Value>,
}

#[derive(Deserialize, Serialize, Debug, Default, Validate)]
pub struct UpdateCustomerDto {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: Option<String>,

    #[validate(length(min = 5, max = 10, message = "Zip code must be between 5 and 10 characters"))]
    pub zip_code: Option<String>,
}

impl UpdateCustomerDto {
    pub fn into_updates(self) -> PersonalFieldUpdates {
        PersonalFieldUpdates {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            zip_code: self.zip_code,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct BookAppointmentDto {
    pub optician_id: i32,

    #[validate(length(min = 1, message = "Preferred date is required"))]
    pub preferred_date: String,

    #[validate(length(min = 1, message = "Preferred time is required"))]
    pub preferred_time: String,
}

// --- Response DTOs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct QuizSubmissionResponse {
    pub customer_id: Uuid,
    pub consent_id: String,
    pub data_retention_until: DateTime<Utc>,
    pub email_sent: bool,
}

#[derive(Serialize, Debug)]
pub struct CustomerProfileResponse {
    pub customer: CustomerData,
    pub gdpr_rights: super::gdpr_dto::RightsSummary,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateCustomerResponse {
    pub updated_fields: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct BookAppointmentResponse {
    pub optician_name: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub email_sent: bool,
}

/// Parse purpose names from the wire, rejecting unknown ones by name.
pub fn parse_purposes(names: &[String]) -> Result<Vec<ProcessingPurpose>, Vec<String>> {
    let mut purposes = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();
    for name in names {
        match ProcessingPurpose::try_from(name.clone()) {
            Ok(purpose) => purposes.push(purpose),
            Err(_) => invalid.push(name.clone()),
        }
    }
    if invalid.is_empty() {
        Ok(purposes)
    } else {
        Err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_submission_validation() {
        let dto = QuizSubmissionDto {
            email: "not-an-email".to_string(),
            first_name: "".to_string(),
            last_name: "Doe".to_string(),
            zip_code: "123".to_string(),
            consent_given: true,
            data_processing_purposes: vec![],
            quiz_answers: None,
            ai_insights: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("first_name"));
        assert!(errors.field_errors().contains_key("zip_code"));
    }

    #[test]
    fn test_parse_purposes_rejects_unknown_names() {
        let names = vec![
            "quiz_analysis".to_string(),
            "telepathy".to_string(),
            "marketing".to_string(),
        ];
        let invalid = parse_purposes(&names).unwrap_err();
        assert_eq!(invalid, vec!["telepathy".to_string()]);
    }

    #[test]
    fn test_parse_purposes_accepts_known_names() {
        let names = vec!["quiz_analysis".to_string(), "marketing".to_string()];
        let purposes = parse_purposes(&names).unwrap();
        assert_eq!(
            purposes,
            vec![ProcessingPurpose::QuizAnalysis, ProcessingPurpose::Marketing]
        );
    }
}
