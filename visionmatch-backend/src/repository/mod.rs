// src/repository/mod.rs
pub mod customer_repository;
pub mod email_log_repository;
pub mod gdpr_audit_log_repository;
pub mod optician_repository;
