// src/config.rs
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    /// Secret the PII encryption key is derived from. When absent the
    /// process runs with a throwaway random key (logged at startup).
    pub encryption_key: Option<String>,
    pub admin_password: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // .env ファイルを読み込む (存在しなくてもエラーにしない)

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/visionmatch.db?mode=rwc".to_string());
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let encryption_key = env::var("ENCRYPTION_KEY").ok();
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:8080".to_string(),
                    "http://localhost:3000".to_string(),
                ]
            });
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Config {
            database_url,
            server_addr,
            encryption_key,
            admin_password,
            allowed_origins,
            environment,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment != "production"
    }
}
