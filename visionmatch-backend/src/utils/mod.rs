// src/utils/mod.rs
pub mod crypto;
