// src/domain/optician_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Optician directory entry. Reference data only - no PII, no lifecycle
/// concerns beyond plain CRUD.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "opticians")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    #[sea_orm(indexed)]
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    /// JSON list of offered services.
    pub services: Json,
    /// JSON list of clinical specialties.
    pub specialties: Json,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: f64,
    pub review_count: i32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Zip prefix used for the coarse proximity search (first 3 digits).
    pub fn zip_prefix(zip_code: &str) -> String {
        zip_code.chars().take(3).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_prefix() {
        assert_eq!(Model::zip_prefix("10001"), "100");
        assert_eq!(Model::zip_prefix("90"), "90");
        assert_eq!(Model::zip_prefix(""), "");
    }
}
