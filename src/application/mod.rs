//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the chat surface and pharmacy stock handling.

mod chat;
mod inventory;

pub use chat::ChatService;
pub use inventory::InventoryService;
