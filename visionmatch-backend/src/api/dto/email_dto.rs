// src/api/dto/email_dto.rs

use crate::domain::email_log_model::Model as EmailLogModel;
use crate::service::email_service::AppointmentDetails;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct ResendQuizResultsDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct UnsubscribeDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct AppointmentReminderDto {
    #[validate(length(min = 10, message = "Invalid consent ID"))]
    pub consent_id: String,

    #[validate(nested)]
    pub appointment_details: AppointmentDetailsDto,
}

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct AppointmentDetailsDto {
    #[validate(length(min = 1, message = "Optician name is required"))]
    pub optician_name: String,

    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

impl AppointmentDetailsDto {
    pub fn into_details(self) -> AppointmentDetails {
        AppointmentDetails {
            optician_name: self.optician_name,
            date: self.date,
            address: self.address,
            phone: self.phone,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EmailStatusEntry {
    pub email_type: String,
    pub sent_at: DateTime<Utc>,
    pub delivery_status: String,
    pub subject_line: String,
}

impl From<EmailLogModel> for EmailStatusEntry {
    fn from(model: EmailLogModel) -> Self {
        Self {
            email_type: model.email_type,
            sent_at: model.sent_at,
            delivery_status: model.delivery_status,
            subject_line: model.subject_line,
        }
    }
}
