// src/domain/gdpr_audit_log_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Action categories recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ConsentGiven,
    DataSaved,
    DataAccessed,
    DataUpdated,
    DataExported,
    ConsentUpdated,
    DeletionRequested,
    DeletionCancelled,
    DataDeleted,
    AppointmentBooked,
    EmailUnsubscribed,
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::ConsentGiven => "consent_given".to_string(),
            AuditAction::DataSaved => "data_saved".to_string(),
            AuditAction::DataAccessed => "data_accessed".to_string(),
            AuditAction::DataUpdated => "data_updated".to_string(),
            AuditAction::DataExported => "data_exported".to_string(),
            AuditAction::ConsentUpdated => "consent_updated".to_string(),
            AuditAction::DeletionRequested => "deletion_requested".to_string(),
            AuditAction::DeletionCancelled => "deletion_cancelled".to_string(),
            AuditAction::DataDeleted => "data_deleted".to_string(),
            AuditAction::AppointmentBooked => "appointment_booked".to_string(),
            AuditAction::EmailUnsubscribed => "email_unsubscribed".to_string(),
        }
    }
}

impl TryFrom<String> for AuditAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "consent_given" => Ok(AuditAction::ConsentGiven),
            "data_saved" => Ok(AuditAction::DataSaved),
            "data_accessed" => Ok(AuditAction::DataAccessed),
            "data_updated" => Ok(AuditAction::DataUpdated),
            "data_exported" => Ok(AuditAction::DataExported),
            "consent_updated" => Ok(AuditAction::ConsentUpdated),
            "deletion_requested" => Ok(AuditAction::DeletionRequested),
            "deletion_cancelled" => Ok(AuditAction::DeletionCancelled),
            "data_deleted" => Ok(AuditAction::DataDeleted),
            "appointment_booked" => Ok(AuditAction::AppointmentBooked),
            "email_unsubscribed" => Ok(AuditAction::EmailUnsubscribed),
            _ => Err(format!("Invalid audit action: {}", value)),
        }
    }
}

/// Append-only audit record. Never updated or deleted once written; the
/// consent_id deliberately outlives the customer row it refers to.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gdpr_audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub consent_id: String,
    pub action_type: String,
    pub details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub legal_basis: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn action(&self) -> Result<AuditAction, String> {
        self.action_type.clone().try_into()
    }
}

/// A pending audit entry, built by lifecycle operations before it is
/// durably appended. Keeping it a plain value makes the secondary effect
/// visible and testable.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub consent_id: String,
    pub action: AuditAction,
    pub details: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub legal_basis: String,
}

impl AuditEntry {
    pub fn new(consent_id: impl Into<String>, action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            consent_id: consent_id.into(),
            action,
            details: details.into(),
            ip_address: None,
            user_agent: None,
            legal_basis: "consent".to_string(),
        }
    }

    pub fn with_requester(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_conversions() {
        for action in [
            AuditAction::ConsentGiven,
            AuditAction::DataSaved,
            AuditAction::DataAccessed,
            AuditAction::DataUpdated,
            AuditAction::DataExported,
            AuditAction::ConsentUpdated,
            AuditAction::DeletionRequested,
            AuditAction::DeletionCancelled,
            AuditAction::DataDeleted,
            AuditAction::AppointmentBooked,
            AuditAction::EmailUnsubscribed,
        ] {
            let tag = String::from(action);
            assert_eq!(AuditAction::try_from(tag).unwrap(), action);
        }
        assert!(AuditAction::try_from("data_leaked".to_string()).is_err());
    }

    #[test]
    fn test_entry_defaults_to_consent_basis() {
        let entry = AuditEntry::new("abc", AuditAction::DataSaved, "saved");
        assert_eq!(entry.legal_basis, "consent");
        assert_eq!(entry.ip_address, None);

        let entry = entry.with_requester(Some("10.0.0.1".to_string()), None);
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    }
}
