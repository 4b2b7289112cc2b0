// src/api/dto/optician_dto.rs

use crate::domain::optician_model::Model as OpticianModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct OpticianSearchQuery {
    #[validate(length(min = 3, message = "Zip code must be at least 3 characters"))]
    pub zip_code: String,

    /// Accepted for forward compatibility; matching is zip-prefix only.
    pub radius: Option<u32>,
}

#[derive(Serialize, Debug)]
pub struct OpticianSearchResponse {
    pub opticians: Vec<OpticianModel>,
    pub search_zip: String,
    pub count: usize,
}
