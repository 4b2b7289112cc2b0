// src/service/audit_log_service.rs

use crate::domain::gdpr_audit_log_model::{AuditEntry, Model as AuditLogModel};
use crate::error::AppResult;
use crate::repository::gdpr_audit_log_repository::AuditLogRepository;
use std::sync::Arc;
use tracing::error;

/// Append-only writer for the GDPR audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    audit_log_repo: Arc<AuditLogRepository>,
}

impl AuditLogService {
    pub fn new(audit_log_repo: Arc<AuditLogRepository>) -> Self {
        Self { audit_log_repo }
    }

    /// Append one entry. A failed append never fails the operation it
    /// accompanies: the error goes to the operational log and is dropped.
    /// Acceptable here only because audit completeness is not
    /// safety-critical for this system.
    pub async fn record(&self, entry: AuditEntry) {
        let consent_id = entry.consent_id.clone();
        let action = entry.action;
        if let Err(err) = self.audit_log_repo.create(entry).await {
            error!(
                consent_id = %consent_id,
                action = ?action,
                %err,
                "Failed to append GDPR audit entry"
            );
        }
    }

    /// Entries for one consent id, newest first.
    pub async fn find_by_consent_id(&self, consent_id: &str) -> AppResult<Vec<AuditLogModel>> {
        Ok(self.audit_log_repo.find_by_consent_id(consent_id).await?)
    }

    pub async fn count_all(&self) -> AppResult<u64> {
        Ok(self.audit_log_repo.count_all().await?)
    }
}
