//! Chat service: FAQ answers and lead capture.
//!
//! Neither operation fails from the caller's point of view. FAQ lookup is a
//! pure table match; lead capture always acknowledges, logging a sink failure
//! instead of returning it.

use std::sync::Arc;

use crate::domain::{faq, Ack, Lead};
use crate::ports::LeadSink;

/// Service behind the public chat widget.
pub struct ChatService<L>
where
    L: LeadSink,
{
    leads: Arc<L>,
}

impl<L> ChatService<L>
where
    L: LeadSink,
{
    /// Create a new chat service writing leads to `leads`.
    pub fn new(leads: Arc<L>) -> Self {
        Self { leads }
    }

    /// Answer a chat message from the FAQ table.
    #[must_use]
    pub fn answer_faq(&self, message: &str) -> String {
        let answer = faq::answer_faq(message);
        tracing::debug!(matched = answer != faq::FALLBACK_ANSWER, "Answered FAQ query");
        answer.to_string()
    }

    /// Record a lead for follow-up.
    ///
    /// Fields are taken as given; missing ones stay missing.
    pub fn capture_lead(
        &self,
        name: Option<String>,
        email: Option<String>,
        message: Option<String>,
    ) -> Ack {
        let lead = Lead::new(name, email, message);

        match self.leads.record_lead(&lead) {
            Ok(()) => tracing::info!(
                "Captured lead from {} <{}>",
                lead.name.as_deref().unwrap_or("anonymous"),
                lead.email.as_deref().unwrap_or("no email")
            ),
            Err(e) => tracing::warn!("Failed to persist lead: {e}"),
        }

        Ack
    }
}
