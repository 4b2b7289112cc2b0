// src/service/mod.rs
pub mod audit_log_service;
pub mod customer_service;
pub mod email_service;
pub mod optician_service;
