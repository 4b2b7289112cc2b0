// src/api/dto/mod.rs
pub mod admin_dto;
pub mod customer_dto;
pub mod email_dto;
pub mod gdpr_dto;
pub mod optician_dto;
