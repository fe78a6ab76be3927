//! Domain layer: Core business types and logic.
//!
//! Entities of the clinic data model plus the two pieces of pure logic the
//! rest of the crate builds on: password credentials and the FAQ table.

mod clinic;
pub mod credentials;
pub mod faq;
mod inventory;
mod lead;
mod user;

pub use clinic::{Appointment, AppointmentStatus, Department, Doctor};
pub use credentials::{CredentialError, PasswordHash};
pub use inventory::{Medicine, PurchaseHistory};
pub use lead::{Ack, Lead};
pub use user::{Role, User};

/// A stored enum value that matches no known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
