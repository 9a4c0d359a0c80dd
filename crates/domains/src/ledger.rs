//! # Ledger values
//!
//! The pickup ledger is one shared list. Stores expose it as a snapshot plus
//! an opaque version token; writes are conditional on that token.

use crate::models::PickupRecord;

/// Result of asking the ledger to record a pickup. Both arms are successes.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// This call recorded the pickup.
    Appended(PickupRecord),
    /// Somebody already had; the stored record is returned unchanged.
    AlreadyPresent(PickupRecord),
}

impl AppendOutcome {
    pub fn record(&self) -> &PickupRecord {
        match self {
            AppendOutcome::Appended(record) | AppendOutcome::AlreadyPresent(record) => record,
        }
    }

    pub fn into_record(self) -> PickupRecord {
        match self {
            AppendOutcome::Appended(record) | AppendOutcome::AlreadyPresent(record) => record,
        }
    }

    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended(_))
    }
}

/// Opaque token identifying the stored ledger state a snapshot was read from.
///
/// Backends use the raw stored value; `None` means nothing has been written
/// yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerVersion(pub Option<String>);

impl LedgerVersion {
    pub fn empty() -> Self {
        Self(None)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerSnapshot {
    pub records: Vec<PickupRecord>,
    pub version: LedgerVersion,
}

impl LedgerSnapshot {
    pub fn find(&self, id: &str) -> Option<&PickupRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The stored value still matched the expected version and was replaced.
    Swapped,
    /// Another writer got there first; nothing was written.
    Conflict,
}
