// src/api/handlers/mod.rs
pub mod admin_handler;
pub mod customer_handler;
pub mod email_handler;
pub mod gdpr_handler;
pub mod optician_handler;
