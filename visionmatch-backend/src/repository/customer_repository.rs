// src/repository/customer_repository.rs

use crate::domain::customer_model::{self, Column, Entity as CustomerEntity, Model};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DbConn,
}

impl CustomerRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Insert-or-update keyed by the internal id. Idempotent under retry;
    /// consent_id and created_at are never overwritten.
    pub async fn upsert(&self, model: Model) -> Result<(), DbErr> {
        let active = customer_model::ActiveModel {
            id: Set(model.id),
            consent_id: Set(model.consent_id),
            consent_given: Set(model.consent_given),
            consent_timestamp: Set(model.consent_timestamp),
            consent_ip: Set(model.consent_ip),
            data_processing_purposes: Set(model.data_processing_purposes),
            encrypted_email: Set(model.encrypted_email),
            encrypted_first_name: Set(model.encrypted_first_name),
            encrypted_last_name: Set(model.encrypted_last_name),
            encrypted_zip_code: Set(model.encrypted_zip_code),
            quiz_answers: Set(model.quiz_answers),
            ai_insights: Set(model.ai_insights),
            data_retention_until: Set(model.data_retention_until),
            deletion_requested: Set(model.deletion_requested),
            deletion_scheduled_for: Set(model.deletion_scheduled_for),
            last_accessed: Set(model.last_accessed),
            access_count: Set(model.access_count),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        };

        CustomerEntity::insert(active)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_columns([
                        Column::ConsentGiven,
                        Column::ConsentTimestamp,
                        Column::ConsentIp,
                        Column::DataProcessingPurposes,
                        Column::EncryptedEmail,
                        Column::EncryptedFirstName,
                        Column::EncryptedLastName,
                        Column::EncryptedZipCode,
                        Column::QuizAnswers,
                        Column::AiInsights,
                        Column::DataRetentionUntil,
                        Column::DeletionRequested,
                        Column::DeletionScheduledFor,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Lookup excluding soft-deleted rows. This is the only lookup normal
    /// request traffic may use.
    pub async fn find_visible_by_consent_id(
        &self,
        consent_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        CustomerEntity::find()
            .filter(Column::ConsentId.eq(consent_id))
            .filter(Column::DeletionRequested.eq(false))
            .one(&self.db)
            .await
    }

    /// Lookup including soft-deleted rows (deletion cancellation only).
    pub async fn find_any_by_consent_id(&self, consent_id: &str) -> Result<Option<Model>, DbErr> {
        CustomerEntity::find()
            .filter(Column::ConsentId.eq(consent_id))
            .one(&self.db)
            .await
    }

    pub async fn exists_visible(&self, consent_id: &str) -> Result<bool, DbErr> {
        let count = CustomerEntity::find()
            .filter(Column::ConsentId.eq(consent_id))
            .filter(Column::DeletionRequested.eq(false))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    // アクセス追跡（読み取りの副作用）
    pub async fn update_access_tracking(&self, consent_id: &str) -> Result<(), DbErr> {
        CustomerEntity::update_many()
            .col_expr(Column::LastAccessed, Expr::value(Utc::now()))
            .col_expr(Column::AccessCount, Expr::col(Column::AccessCount).add(1))
            .filter(Column::ConsentId.eq(consent_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Soft delete: returns the number of rows that matched. Repeated calls
    /// simply overwrite the schedule.
    pub async fn mark_deletion_requested(
        &self,
        consent_id: &str,
        scheduled_for: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = CustomerEntity::update_many()
            .col_expr(Column::DeletionRequested, Expr::value(true))
            .col_expr(Column::DeletionScheduledFor, Expr::value(scheduled_for))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::ConsentId.eq(consent_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn clear_deletion_request(&self, consent_id: &str) -> Result<u64, DbErr> {
        let result = CustomerEntity::update_many()
            .col_expr(Column::DeletionRequested, Expr::value(false))
            .col_expr(
                Column::DeletionScheduledFor,
                Expr::value(None::<DateTime<Utc>>),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::ConsentId.eq(consent_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Physical removal. Irreversible.
    pub async fn delete_by_consent_id(&self, consent_id: &str) -> Result<u64, DbErr> {
        let result = CustomerEntity::delete_many()
            .filter(Column::ConsentId.eq(consent_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Rows eligible for permanent removal at `now`.
    pub async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Model>, DbErr> {
        CustomerEntity::find()
            .filter(
                Condition::any()
                    .add(Column::DeletionScheduledFor.lte(now))
                    .add(Column::DataRetentionUntil.lte(now)),
            )
            .all(&self.db)
            .await
    }

    // --- 管理者向け ---

    pub async fn find_all(&self) -> Result<Vec<Model>, DbErr> {
        CustomerEntity::find()
            .order_by(Column::CreatedAt, Order::Desc)
            .all(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        CustomerEntity::find().count(&self.db).await
    }

    pub async fn count_pending_deletions(&self) -> Result<u64, DbErr> {
        CustomerEntity::find()
            .filter(Column::DeletionRequested.eq(true))
            .count(&self.db)
            .await
    }
}
