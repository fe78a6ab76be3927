//! Inventory service: pharmacy stock views and restocking.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::domain::{Medicine, PurchaseHistory};
use crate::ports::EntityStore;
use crate::ClinicError;

/// Service for the pharmacy's stock.
pub struct InventoryService<S>
where
    S: EntityStore,
{
    store: Arc<S>,
}

impl<S> InventoryService<S>
where
    S: EntityStore,
    S::Error: Into<StoreError>,
{
    /// Create a new inventory service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Medicines at or below their low-stock threshold right now.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn low_stock(&self) -> Result<Vec<Medicine>, ClinicError> {
        let low = self
            .store
            .low_stock_medicines()
            .map_err(|e| ClinicError::Store(e.into()))?;

        tracing::debug!("{} medicine(s) at or below threshold", low.len());
        Ok(low)
    }

    /// Record a purchase and add it to stock.
    ///
    /// # Errors
    /// Returns error if the medicine does not exist or storage fails.
    pub fn restock(
        &self,
        medicine_id: i64,
        quantity: i64,
    ) -> Result<(Medicine, PurchaseHistory), ClinicError> {
        if quantity <= 0 {
            return Err(ClinicError::Store(StoreError::InvalidInput(format!(
                "restock quantity must be positive (got {quantity})"
            ))));
        }

        let (medicine, purchase) = self
            .store
            .restock(medicine_id, quantity)
            .map_err(|e| ClinicError::Store(e.into()))?;

        if medicine.is_low_stock() {
            tracing::warn!(
                medicine_id,
                quantity = medicine.quantity,
                threshold = medicine.low_stock_threshold,
                "Medicine still low on stock after restock"
            );
        }

        Ok((medicine, purchase))
    }
}
