//! # Pickup ledger stores
//!
//! The ledger is stored as one JSON array under a single key, the format
//! earlier stations wrote:
//!
//! ```json
//! [{"id":"42","name":"Jane Doe","email":"","pickedUpAt":"2024-06-01T10:00:00Z"}]
//! ```
//!
//! The raw stored string doubles as the version token for conditional writes.

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryPickupStore;
#[cfg(feature = "redis")]
pub use redis::RedisPickupStore;

use domains::{DomainError, PickupRecord, Result};

pub const DEFAULT_LEDGER_KEY: &str = "badge:pickups";

/// Absent or blank values are an empty ledger.
pub(crate) fn decode(raw: Option<&str>) -> Result<Vec<PickupRecord>> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
            .map_err(|e| DomainError::Storage(format!("corrupt ledger payload: {e}"))),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn encode(records: &[PickupRecord]) -> Result<String> {
    serde_json::to_string(records)
        .map_err(|e| DomainError::Storage(format!("ledger serialization failed: {e}")))
}
