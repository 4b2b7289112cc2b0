// src/api/handlers/optician_handler.rs

use crate::api::dto::optician_dto::{OpticianSearchQuery, OpticianSearchResponse};
use crate::api::AppState;
use crate::domain::optician_model::Model as OpticianModel;
use crate::error::AppResult;
use crate::service::optician_service::ServiceCatalog;
use crate::types::ApiResponse;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use validator::Validate;

pub async fn list_opticians_handler(
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OpticianModel>>> {
    let opticians = app_state.optician_service.list_all().await?;
    Ok(ApiResponse::success(opticians))
}

/// Nearby search by zip prefix, best rated first.
pub async fn search_opticians_handler(
    State(app_state): State<AppState>,
    Query(query): Query<OpticianSearchQuery>,
) -> AppResult<ApiResponse<OpticianSearchResponse>> {
    query.validate()?;

    let opticians = app_state
        .optician_service
        .find_by_zip_code(&query.zip_code)
        .await?;

    Ok(ApiResponse::success(OpticianSearchResponse {
        count: opticians.len(),
        opticians,
        search_zip: query.zip_code,
    }))
}

/// Distinct services and specialties offered across the directory.
pub async fn service_catalog_handler(
    State(app_state): State<AppState>,
) -> AppResult<ApiResponse<ServiceCatalog>> {
    let catalog = app_state.optician_service.service_catalog().await?;
    Ok(ApiResponse::success(catalog))
}

pub async fn get_optician_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<OpticianModel>> {
    let optician = app_state.optician_service.find_by_id(id).await?;
    Ok(ApiResponse::success(optician))
}

// --- Router ---

pub fn optician_router(app_state: AppState) -> Router {
    Router::new()
        .route("/opticians", get(list_opticians_handler))
        .route("/opticians/search", get(search_opticians_handler))
        .route("/opticians/meta/services", get(service_catalog_handler))
        .route("/opticians/{id}", get(get_optician_handler))
        .with_state(app_state)
}
