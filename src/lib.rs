//! # Clinicdesk
//!
//! Backend for a small clinic: patient/staff accounts, departments, doctors,
//! appointments, and pharmacy inventory, plus the FAQ chat widget and its
//! lead capture.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (User, Doctor, Medicine, ...) and credentials
//! - `ports`: Trait definitions for persistence
//! - `adapters`: Concrete implementations (SQLite, axum, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven runtime settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{
    Appointment, AppointmentStatus, Department, Doctor, Lead, Medicine, PurchaseHistory, Role,
    User,
};

/// Result type for clinic operations
pub type Result<T> = std::result::Result<T, ClinicError>;

/// Main error type for the clinic backend
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Storage operation failed: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Credential operation failed: {0}")]
    Credential(#[from] domain::CredentialError),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
