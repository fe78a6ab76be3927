//! Pharmacy inventory: medicines and their purchase history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stocked medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    /// Units currently on hand (never negative)
    pub quantity: i64,
    /// Stock at or below this level counts as low
    pub low_stock_threshold: i64,
}

impl Medicine {
    /// Whether current stock has fallen to or below the threshold.
    ///
    /// Derived from `quantity` on every call; there is no stored flag.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

impl fmt::Display for Medicine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Medicine {} - Quantity: {}>", self.name, self.quantity)
    }
}

/// One recorded purchase of a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseHistory {
    pub id: i64,
    pub medicine_id: i64,
    pub quantity_purchased: i64,
    pub date: DateTime<Utc>,
}

impl fmt::Display for PurchaseHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PurchaseHistory {} - Medicine ID: {}>", self.id, self.medicine_id)
    }
}
