// src/db.rs
use crate::config::Config;
use crate::domain::{customer_model, email_log_model, gdpr_audit_log_model, optician_model};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::path::Path;
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_db_pool(config: &Config) -> Result<DbPool, DbErr> {
    ensure_sqlite_dir(&config.database_url);

    let mut opt = ConnectOptions::new(config.database_url.clone());

    // 接続オプションを設定
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8 * 60))
        .sqlx_logging(false);

    Database::connect(opt).await
}

// SQLiteのファイルパスの親ディレクトリを事前に作成するヘルパー関数
fn ensure_sqlite_dir(database_url: &str) {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return;
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.starts_with(':') {
        // sqlite::memory: などの特殊URL
        return;
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!(?parent, %err, "Failed to create database directory");
            }
        }
    }
}

/// Create the schema idempotently at startup. There is no migration system;
/// tables and indexes are derived from the entities with IF NOT EXISTS.
pub async fn init_schema(conn: &DbPool) -> Result<(), DbErr> {
    create_table(conn, customer_model::Entity).await?;
    create_table(conn, optician_model::Entity).await?;
    create_table(conn, email_log_model::Entity).await?;
    create_table(conn, gdpr_audit_log_model::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(conn: &DbPool, entity: E) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    conn.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }
    Ok(())
}
