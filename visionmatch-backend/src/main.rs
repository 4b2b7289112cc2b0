// src/main.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use visionmatch_backend::api::{create_app, AppState};
use visionmatch_backend::config::Config;
use visionmatch_backend::db::{create_db_pool, init_schema};
use visionmatch_backend::repository::optician_repository::OpticianRepository;
use visionmatch_backend::service::email_service::EmailConfig;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visionmatch_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting VisionMatch backend server...");

    // 設定を読み込む
    let config = Arc::new(Config::from_env());
    tracing::info!(
        environment = %config.environment,
        server_addr = %config.server_addr,
        "Configuration loaded"
    );

    // データベース接続とスキーマ初期化
    let db_pool = create_db_pool(&config).await?;
    init_schema(&db_pool).await?;
    tracing::info!("Database ready");

    let seeded = OpticianRepository::new(db_pool.clone())
        .seed_if_empty()
        .await?;
    if seeded > 0 {
        tracing::info!(seeded, "Seeded optician directory");
    }

    let email_config = EmailConfig::from_env()?;
    let app_state = AppState::new(db_pool, config.clone(), email_config)?;

    // 24時間ごとの保持期限スイープ
    let cleanup_service = app_state.customer_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match cleanup_service.cleanup_expired_data(chrono::Utc::now()).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "Scheduled GDPR cleanup removed expired records");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(%err, "Scheduled GDPR cleanup failed");
                }
            }
        }
    });

    let app_router = create_app(app_state);

    tracing::info!("Server listening on {}", config.server_addr);
    let listener = TcpListener::bind(&config.server_addr).await?;
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
