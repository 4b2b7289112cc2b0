// src/domain/mod.rs
pub mod customer_model;
pub mod email_log_model;
pub mod gdpr_audit_log_model;
pub mod optician_model;
