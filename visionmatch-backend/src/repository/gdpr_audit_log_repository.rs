// src/repository/gdpr_audit_log_repository.rs

use crate::domain::gdpr_audit_log_model::{
    ActiveModel as AuditLogActiveModel, AuditEntry, Column, Entity as AuditLogEntity,
    Model as AuditLogModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DbConn,
}

impl AuditLogRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    // 監査ログの追記（追記のみ、更新・削除なし）
    pub async fn create(&self, entry: AuditEntry) -> Result<AuditLogModel, DbErr> {
        let active = AuditLogActiveModel {
            id: NotSet,
            consent_id: Set(entry.consent_id),
            action_type: Set(entry.action.into()),
            details: Set(entry.details),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            timestamp: Set(Utc::now()),
            legal_basis: Set(entry.legal_basis),
        };
        active.insert(&self.db).await
    }

    /// Entries for one consent id, newest first.
    pub async fn find_by_consent_id(&self, consent_id: &str) -> Result<Vec<AuditLogModel>, DbErr> {
        AuditLogEntity::find()
            .filter(Column::ConsentId.eq(consent_id))
            .order_by_desc(Column::Timestamp)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        AuditLogEntity::find().count(&self.db).await
    }
}
