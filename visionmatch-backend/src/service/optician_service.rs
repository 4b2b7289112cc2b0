// src/service/optician_service.rs

use crate::domain::optician_model::Model as OpticianModel;
use crate::error::{AppError, AppResult};
use crate::repository::optician_repository::OpticianRepository;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Distinct, sorted services and specialties across the directory.
#[derive(Serialize, Debug)]
pub struct ServiceCatalog {
    pub services: Vec<String>,
    pub specialties: Vec<String>,
    pub total_opticians: usize,
}

#[derive(Clone)]
pub struct OpticianService {
    optician_repo: Arc<OpticianRepository>,
}

impl OpticianService {
    pub fn new(optician_repo: Arc<OpticianRepository>) -> Self {
        Self { optician_repo }
    }

    /// Nearby search: prefix match on the first three zip digits, best
    /// rated first, capped at ten results.
    pub async fn find_by_zip_code(&self, zip_code: &str) -> AppResult<Vec<OpticianModel>> {
        if zip_code.len() < 3 {
            return Err(AppError::ValidationError(
                "Zip code must be at least 3 characters".to_string(),
            ));
        }
        Ok(self.optician_repo.find_by_zip_code(zip_code).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<OpticianModel> {
        self.optician_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Optician not found".to_string()))
    }

    pub async fn list_all(&self) -> AppResult<Vec<OpticianModel>> {
        Ok(self.optician_repo.find_all().await?)
    }

    pub async fn count_all(&self) -> AppResult<u64> {
        Ok(self.optician_repo.count_all().await?)
    }

    /// Aggregate the offered services and specialties over all opticians,
    /// deduplicated and sorted.
    pub async fn service_catalog(&self) -> AppResult<ServiceCatalog> {
        let opticians = self.optician_repo.find_all().await?;

        let mut services = BTreeSet::new();
        let mut specialties = BTreeSet::new();
        for optician in &opticians {
            collect_strings(&optician.services, &mut services);
            collect_strings(&optician.specialties, &mut specialties);
        }

        Ok(ServiceCatalog {
            services: services.into_iter().collect(),
            specialties: specialties.into_iter().collect(),
            total_opticians: opticians.len(),
        })
    }
}

fn collect_strings(value: &serde_json::Value, out: &mut BTreeSet<String>) {
    if let Some(items) = value.as_array() {
        out.extend(items.iter().filter_map(|v| v.as_str().map(String::from)));
    }
}
