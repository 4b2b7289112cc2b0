// src/repository/email_log_repository.rs

use crate::domain::email_log_model::{
    ActiveModel as EmailLogActiveModel, Column, EmailType, Entity as EmailLogEntity,
    Model as EmailLogModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Input for one delivery log row.
#[derive(Debug, Clone)]
pub struct NewEmailLog {
    pub consent_id: String,
    pub email_type: EmailType,
    pub recipient_hash: String,
    pub delivery_status: String,
    pub provider_message_id: Option<String>,
    pub subject_line: String,
}

#[derive(Debug, Clone)]
pub struct EmailLogRepository {
    db: DbConn,
}

impl EmailLogRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn create(&self, log: NewEmailLog) -> Result<EmailLogModel, DbErr> {
        let active = EmailLogActiveModel {
            id: NotSet,
            customer_consent_id: Set(log.consent_id),
            email_type: Set(log.email_type.into()),
            recipient_hash: Set(log.recipient_hash),
            sent_at: Set(Utc::now()),
            delivery_status: Set(log.delivery_status),
            provider_message_id: Set(log.provider_message_id),
            subject_line: Set(log.subject_line),
        };
        active.insert(&self.db).await
    }

    pub async fn find_by_consent_id(&self, consent_id: &str) -> Result<Vec<EmailLogModel>, DbErr> {
        EmailLogEntity::find()
            .filter(Column::CustomerConsentId.eq(consent_id))
            .order_by_desc(Column::SentAt)
            .all(&self.db)
            .await
    }

    pub async fn find_recent(&self, limit: u64) -> Result<Vec<EmailLogModel>, DbErr> {
        EmailLogEntity::find()
            .order_by_desc(Column::SentAt)
            .limit(limit)
            .all(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        EmailLogEntity::find().count(&self.db).await
    }
}
