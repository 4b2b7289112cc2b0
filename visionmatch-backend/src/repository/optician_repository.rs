// src/repository/optician_repository.rs

use crate::domain::optician_model::{
    self, ActiveModel as OpticianActiveModel, Column, Entity as OpticianEntity,
    Model as OpticianModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ColumnTrait, Condition, DbConn, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct OpticianRepository {
    db: DbConn,
}

impl OpticianRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<OpticianModel>, DbErr> {
        OpticianEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn find_all(&self) -> Result<Vec<OpticianModel>, DbErr> {
        OpticianEntity::find()
            .order_by(Column::Name, Order::Asc)
            .all(&self.db)
            .await
    }

    /// Coarse proximity search: same 3-digit zip prefix or exact match,
    /// best-rated first.
    pub async fn find_by_zip_code(&self, zip_code: &str) -> Result<Vec<OpticianModel>, DbErr> {
        let prefix = optician_model::Model::zip_prefix(zip_code);
        OpticianEntity::find()
            .filter(
                Condition::any()
                    .add(Column::ZipCode.starts_with(&prefix))
                    .add(Column::ZipCode.eq(zip_code)),
            )
            .order_by(Column::Rating, Order::Desc)
            .order_by(Column::ReviewCount, Order::Desc)
            .limit(10)
            .all(&self.db)
            .await
    }

    pub async fn count_all(&self) -> Result<u64, DbErr> {
        OpticianEntity::find().count(&self.db).await
    }

    /// Seed demo directory entries when the table is empty.
    pub async fn seed_if_empty(&self) -> Result<u64, DbErr> {
        if self.count_all().await? > 0 {
            return Ok(0);
        }

        let seeds = seed_opticians();
        let count = seeds.len() as u64;
        for seed in seeds {
            seed.insert(&self.db).await?;
        }
        tracing::info!(count, "Seeded optician directory");
        Ok(count)
    }
}

fn seed_opticians() -> Vec<OpticianActiveModel> {
    let now = Utc::now();
    let entry = |name: &str,
                 address: &str,
                 city: &str,
                 state: &str,
                 zip: &str,
                 phone: &str,
                 email: &str,
                 website: &str,
                 hours: &str,
                 services: serde_json::Value,
                 specialties: serde_json::Value,
                 lat: f64,
                 lon: f64,
                 rating: f64,
                 reviews: i32| OpticianActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        address: Set(address.to_string()),
        city: Set(city.to_string()),
        state: Set(Some(state.to_string())),
        zip_code: Set(zip.to_string()),
        phone: Set(Some(phone.to_string())),
        email: Set(Some(email.to_string())),
        website: Set(Some(website.to_string())),
        hours: Set(Some(hours.to_string())),
        services: Set(services),
        specialties: Set(specialties),
        latitude: Set(Some(lat)),
        longitude: Set(Some(lon)),
        rating: Set(rating),
        review_count: Set(reviews),
        verified: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    vec![
        entry(
            "VisionCare Optometry",
            "123 Main Street",
            "New York",
            "NY",
            "10001",
            "(212) 555-0101",
            "info@visioncare-ny.com",
            "https://visioncare-ny.com",
            "Mon-Fri 9AM-6PM, Sat 9AM-4PM",
            json!(["Eye Exams", "Contact Lens Fitting", "Glasses Repair", "Emergency Care"]),
            json!(["Pediatric Optometry", "Dry Eye Treatment", "Sports Vision"]),
            40.7128,
            -74.0060,
            4.8,
            156,
        ),
        entry(
            "EyeHealth Partners",
            "456 Oak Avenue",
            "Los Angeles",
            "CA",
            "90210",
            "(323) 555-0202",
            "contact@eyehealth-la.com",
            "https://eyehealth-partners.com",
            "Mon-Sat 8AM-7PM",
            json!(["Comprehensive Eye Exams", "Designer Frames", "Progressive Lenses", "Sunglasses"]),
            json!(["Myopia Management", "Digital Eye Strain", "Fashion Eyewear"]),
            34.0522,
            -118.2437,
            4.6,
            203,
        ),
        entry(
            "ClearSight Vision Center",
            "789 Pine Road",
            "Chicago",
            "IL",
            "60601",
            "(312) 555-0303",
            "appointments@clearsight-chicago.com",
            "https://clearsight-vision.com",
            "Tue-Fri 10AM-8PM, Sat 9AM-5PM",
            json!(["Eye Exams", "Contact Lenses", "LASIK Consultation", "Frame Styling"]),
            json!(["Glaucoma Screening", "Diabetic Eye Care", "Age-Related Macular Degeneration"]),
            41.8781,
            -87.6298,
            4.7,
            89,
        ),
    ]
}
