//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the persistence backend.

mod leads;
mod store;

pub use leads::LeadSink;
pub use store::EntityStore;
