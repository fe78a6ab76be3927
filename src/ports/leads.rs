//! Lead sink port: where captured leads go for later follow-up.

use crate::domain::Lead;

/// Destination for captured leads.
pub trait LeadSink: Send + Sync {
    /// Error type for sink operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Durably record a lead.
    ///
    /// # Errors
    /// Returns error if the lead could not be written.
    fn record_lead(&self, lead: &Lead) -> Result<(), Self::Error>;

    /// All recorded leads, oldest first.
    ///
    /// # Errors
    /// Returns error if the sink cannot be read.
    fn leads(&self) -> Result<Vec<Lead>, Self::Error>;
}
