// src/service/customer_service.rs

use crate::domain::customer_model::{
    self, retention_date, CustomerData, Model, NewCustomer, ProcessingPurpose,
    DELETION_GRACE_DAYS,
};
use crate::domain::gdpr_audit_log_model::{AuditAction, AuditEntry};
use crate::error::{AppError, AppResult};
use crate::repository::customer_repository::CustomerRepository;
use crate::service::audit_log_service::AuditLogService;
use crate::utils::crypto::CryptoContext;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Requester metadata attached to audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Partial update of the personal (encrypted) fields.
#[derive(Debug, Clone, Default)]
pub struct PersonalFieldUpdates {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub zip_code: Option<String>,
}

impl PersonalFieldUpdates {
    pub fn updated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.email.is_some() {
            fields.push("email");
        }
        if self.first_name.is_some() {
            fields.push("first_name");
        }
        if self.last_name.is_some() {
            fields.push("last_name");
        }
        if self.zip_code.is_some() {
            fields.push("zip_code");
        }
        fields
    }
}

/// Customer lifecycle manager: consent capture, encrypted persistence,
/// graced deletion, export, and the expiry sweep.
#[derive(Clone)]
pub struct CustomerService {
    customer_repo: Arc<CustomerRepository>,
    audit: Arc<AuditLogService>,
    crypto: Arc<CryptoContext>,
}

impl CustomerService {
    pub fn new(
        customer_repo: Arc<CustomerRepository>,
        audit: Arc<AuditLogService>,
        crypto: Arc<CryptoContext>,
    ) -> Self {
        Self {
            customer_repo,
            audit,
            crypto,
        }
    }

    /// Create and persist a customer record from a consented quiz
    /// submission. Assigns the identity and consent identifier, computes the
    /// default retention date, encrypts PII and upserts (idempotent under
    /// retry with the same id). Appends one `data_saved` audit entry.
    pub async fn submit_quiz(&self, new: NewCustomer) -> AppResult<Model> {
        let now = Utc::now();
        let purposes = if new.purposes.is_empty() {
            ProcessingPurpose::defaults()
        } else {
            new.purposes
        };

        let model = Model {
            id: Uuid::new_v4(),
            consent_id: self.crypto.generate_token(),
            consent_given: true,
            consent_timestamp: Some(now),
            consent_ip: new.consent_ip,
            data_processing_purposes: ProcessingPurpose::encode_list(&purposes),
            encrypted_email: Some(self.crypto.encrypt(&new.email)),
            encrypted_first_name: Some(self.crypto.encrypt(&new.first_name)),
            encrypted_last_name: Some(self.crypto.encrypt(&new.last_name)),
            encrypted_zip_code: Some(self.crypto.encrypt(&new.zip_code)),
            quiz_answers: new.quiz_answers,
            ai_insights: new.ai_insights,
            data_retention_until: retention_date(now),
            deletion_requested: false,
            deletion_scheduled_for: None,
            last_accessed: None,
            access_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.customer_repo.upsert(model.clone()).await?;
        self.audit
            .record(AuditEntry::new(
                &model.consent_id,
                AuditAction::DataSaved,
                "Customer data saved to database",
            ))
            .await;
        Ok(model)
    }

    /// Lookup by consent identifier. Returns `None` for unknown ids and for
    /// soft-deleted records. A hit decrypts the PII columns, bumps the
    /// access counter and appends a `data_accessed` audit entry - reads
    /// have observable side effects by design.
    pub async fn find_by_consent_id(&self, consent_id: &str) -> AppResult<Option<CustomerData>> {
        let Some(model) = self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?
        else {
            return Ok(None);
        };

        self.customer_repo.update_access_tracking(consent_id).await?;
        self.audit
            .record(AuditEntry::new(
                consent_id,
                AuditAction::DataAccessed,
                "Customer data retrieved from database",
            ))
            .await;

        Ok(Some(CustomerData::from_model(model, &self.crypto)))
    }

    /// Non-tracking fetch used by operations that audit themselves
    /// (export, unsubscribe). Does not touch the access counter.
    async fn find_plain(&self, consent_id: &str) -> AppResult<Option<CustomerData>> {
        Ok(self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?
            .map(|model| CustomerData::from_model(model, &self.crypto)))
    }

    /// Metadata-only lookup for consent status; no decryption, no side
    /// effects.
    pub async fn consent_status(&self, consent_id: &str) -> AppResult<Option<Model>> {
        Ok(self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?)
    }

    pub async fn exists(&self, consent_id: &str) -> AppResult<bool> {
        Ok(self.customer_repo.exists_visible(consent_id).await?)
    }

    /// Re-encrypt and store the provided personal fields. Returns the names
    /// of the fields that were updated.
    pub async fn update_personal_fields(
        &self,
        consent_id: &str,
        updates: PersonalFieldUpdates,
        meta: RequestMeta,
    ) -> AppResult<Vec<&'static str>> {
        let fields = updates.updated_fields();
        if fields.is_empty() {
            return Err(AppError::BadRequest("No valid updates provided".to_string()));
        }

        let Some(mut model) = self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?
        else {
            return Err(AppError::NotFound(
                "Customer not found or consent withdrawn".to_string(),
            ));
        };

        if let Some(email) = &updates.email {
            model.encrypted_email = Some(self.crypto.encrypt(email));
        }
        if let Some(first_name) = &updates.first_name {
            model.encrypted_first_name = Some(self.crypto.encrypt(first_name));
        }
        if let Some(last_name) = &updates.last_name {
            model.encrypted_last_name = Some(self.crypto.encrypt(last_name));
        }
        if let Some(zip_code) = &updates.zip_code {
            model.encrypted_zip_code = Some(self.crypto.encrypt(zip_code));
        }
        model.updated_at = Utc::now();

        self.customer_repo.upsert(model).await?;
        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::DataUpdated,
                    format!("Updated fields: {}", fields.join(", ")),
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(fields)
    }

    /// Replace the consented processing purposes.
    pub async fn update_consent_purposes(
        &self,
        consent_id: &str,
        purposes: Vec<ProcessingPurpose>,
        reason: Option<String>,
        meta: RequestMeta,
    ) -> AppResult<()> {
        let Some(mut model) = self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?
        else {
            return Err(AppError::NotFound("Customer not found".to_string()));
        };

        let tags: Vec<String> = purposes.iter().map(|p| String::from(*p)).collect();
        model.data_processing_purposes = ProcessingPurpose::encode_list(&purposes);
        model.updated_at = Utc::now();
        self.customer_repo.upsert(model).await?;

        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::ConsentUpdated,
                    format!(
                        "Updated consent purposes: {}. Reason: {}",
                        tags.join(", "),
                        reason.as_deref().unwrap_or("Not specified")
                    ),
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(())
    }

    /// Remove the email-communication purpose after verifying the supplied
    /// address against the stored (decrypted) one.
    pub async fn unsubscribe_email(
        &self,
        consent_id: &str,
        email: &str,
        reason: Option<String>,
        meta: RequestMeta,
    ) -> AppResult<()> {
        let Some(customer) = self.find_plain(consent_id).await? else {
            return Err(AppError::NotFound("Customer not found".to_string()));
        };

        if customer.email.as_deref() != Some(email) {
            return Err(AppError::Forbidden("Email verification failed".to_string()));
        }

        let purposes: Vec<ProcessingPurpose> = customer
            .purposes
            .into_iter()
            .filter(|p| *p != ProcessingPurpose::EmailCommunication)
            .collect();

        let Some(mut model) = self
            .customer_repo
            .find_visible_by_consent_id(consent_id)
            .await?
        else {
            return Err(AppError::NotFound("Customer not found".to_string()));
        };
        model.data_processing_purposes = ProcessingPurpose::encode_list(&purposes);
        model.updated_at = Utc::now();
        self.customer_repo.upsert(model).await?;

        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::EmailUnsubscribed,
                    format!(
                        "Unsubscribed from emails. Reason: {}",
                        reason.as_deref().unwrap_or("Not specified")
                    ),
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(())
    }

    /// Soft-delete: mark the record for deletion, immediately or after the
    /// 30-day grace period. Idempotent - a repeated request overwrites the
    /// schedule. Returns the schedule that was persisted, or `None` when no
    /// matching row existed.
    pub async fn request_deletion(
        &self,
        consent_id: &str,
        immediate: bool,
        reason: Option<String>,
        meta: RequestMeta,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let scheduled_for = if immediate {
            now
        } else {
            now + Duration::days(DELETION_GRACE_DAYS)
        };

        let matched = self
            .customer_repo
            .mark_deletion_requested(consent_id, scheduled_for)
            .await?;
        if matched == 0 {
            return Ok(None);
        }

        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::DeletionRequested,
                    format!(
                        "Data deletion {}. Reason: {}",
                        if immediate {
                            "immediate".to_string()
                        } else {
                            format!("scheduled for {}", scheduled_for.to_rfc3339())
                        },
                        reason.as_deref().unwrap_or("Not specified")
                    ),
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(Some(scheduled_for))
    }

    /// Cancel a pending deletion request. Only permitted while the grace
    /// period is still running; afterwards the row is left untouched and a
    /// grace-period-expired error is returned.
    pub async fn cancel_deletion(&self, consent_id: &str, meta: RequestMeta) -> AppResult<()> {
        let Some(model) = self.customer_repo.find_any_by_consent_id(consent_id).await? else {
            return Err(AppError::NotFound(
                "Customer not found or already deleted".to_string(),
            ));
        };

        if !model.deletion_requested {
            return Err(AppError::BadRequest(
                "No deletion request found for this account".to_string(),
            ));
        }

        let scheduled_for = model.deletion_scheduled_for.ok_or_else(|| {
            AppError::InternalServerError(
                "Deletion requested without a schedule".to_string(),
            )
        })?;

        if Utc::now() >= scheduled_for {
            return Err(AppError::GracePeriodExpired(
                "Deletion request cannot be cancelled - grace period has expired".to_string(),
            ));
        }

        self.customer_repo.clear_deletion_request(consent_id).await?;
        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::DeletionCancelled,
                    "User cancelled their data deletion request",
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(())
    }

    /// Irreversible physical removal. The `data_deleted` audit entry is
    /// keyed to the consent id that no longer resolves to a row.
    pub async fn permanently_delete(&self, consent_id: &str) -> AppResult<bool> {
        let removed = self.customer_repo.delete_by_consent_id(consent_id).await?;
        if removed == 0 {
            return Ok(false);
        }
        self.audit
            .record(AuditEntry::new(
                consent_id,
                AuditAction::DataDeleted,
                "Customer data permanently deleted",
            ))
            .await;
        Ok(true)
    }

    /// GDPR Article 20 export. A pure read transform over a non-tracking
    /// fetch; appends exactly one `data_exported` entry.
    pub async fn export_data(
        &self,
        consent_id: &str,
        meta: RequestMeta,
    ) -> AppResult<Option<CustomerData>> {
        let Some(customer) = self.find_plain(consent_id).await? else {
            return Ok(None);
        };

        self.audit
            .record(
                AuditEntry::new(
                    consent_id,
                    AuditAction::DataExported,
                    "Customer requested data export",
                )
                .with_requester(meta.ip, meta.user_agent),
            )
            .await;
        Ok(Some(customer))
    }

    /// Purge every record whose deletion schedule or retention deadline has
    /// passed. Rows are processed independently: one failing row is logged
    /// and skipped, never aborting the sweep. Returns the count actually
    /// deleted.
    pub async fn cleanup_expired_data(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let expired = self.customer_repo.find_expired(now).await?;
        let mut deleted = 0u64;

        for row in expired {
            match self.customer_repo.delete_by_consent_id(&row.consent_id).await {
                // 並行スイープが先に消した場合は no-op
                Ok(0) => {}
                Ok(_) => {
                    self.audit
                        .record(AuditEntry::new(
                            &row.consent_id,
                            AuditAction::DataDeleted,
                            "Customer data permanently deleted",
                        ))
                        .await;
                    deleted += 1;
                }
                Err(err) => {
                    warn!(consent_id = %row.consent_id, %err, "Cleanup failed for row, skipping");
                }
            }
        }

        info!(deleted, "GDPR cleanup: deleted expired customer records");
        Ok(deleted)
    }

    /// Admin detail view, including soft-deleted rows, without touching
    /// access tracking. Deletion-pending records come back metadata-only;
    /// their ciphertext stays sealed.
    pub async fn admin_view(&self, consent_id: &str) -> AppResult<Option<CustomerData>> {
        Ok(self
            .customer_repo
            .find_any_by_consent_id(consent_id)
            .await?
            .map(|model| {
                if model.deletion_requested {
                    CustomerData::metadata_only(model)
                } else {
                    CustomerData::from_model(model, &self.crypto)
                }
            }))
    }

    /// Pseudonymized listing for the admin panel - presence flags only,
    /// no decryption.
    pub async fn list_all(&self) -> AppResult<Vec<customer_model::Model>> {
        Ok(self.customer_repo.find_all().await?)
    }

    pub async fn stats(&self) -> AppResult<(u64, u64)> {
        let total = self.customer_repo.count_all().await?;
        let pending = self.customer_repo.count_pending_deletions().await?;
        Ok((total, pending))
    }
}
