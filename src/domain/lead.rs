//! Prospective-customer contacts captured from the chat surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A captured lead. Every field is optional and unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Lead {
    /// Create a lead stamped with the current time.
    #[must_use]
    pub fn new(name: Option<String>, email: Option<String>, message: Option<String>) -> Self {
        Self {
            name,
            email,
            message,
            received_at: Utc::now(),
        }
    }
}

/// Acknowledgment returned for every lead submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack;

impl Ack {
    pub const MESSAGE: &'static str = "Lead saved successfully!";

    #[must_use]
    pub fn message(&self) -> &'static str {
        Self::MESSAGE
    }
}
