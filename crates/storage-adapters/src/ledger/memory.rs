//! In-process ledger store. Shared between stations only when they share a
//! process; used for single-station setups and tests.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{LedgerSnapshot, LedgerVersion, PickupRecord, PickupStore, Result, SwapOutcome};

use super::{decode, encode, DEFAULT_LEDGER_KEY};

pub struct MemoryPickupStore {
    key: String,
    /// Ledger key → raw JSON array.
    entries: DashMap<String, String>,
}

impl MemoryPickupStore {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_LEDGER_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: DashMap::new(),
        }
    }

    /// Overwrites the stored value unconditionally, as a legacy station would.
    pub fn put_raw(&self, raw: impl Into<String>) {
        self.entries.insert(self.key.clone(), raw.into());
    }

    pub fn raw(&self) -> Option<String> {
        self.entries.get(&self.key).map(|v| v.value().clone())
    }
}

impl Default for MemoryPickupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PickupStore for MemoryPickupStore {
    async fn load(&self) -> Result<LedgerSnapshot> {
        let raw = self.raw();
        Ok(LedgerSnapshot {
            records: decode(raw.as_deref())?,
            version: LedgerVersion(raw),
        })
    }

    async fn compare_and_swap(
        &self,
        expected: &LedgerVersion,
        records: &[PickupRecord],
    ) -> Result<SwapOutcome> {
        let encoded = encode(records)?;

        // The entry guard holds the shard lock for the whole compare + write.
        let outcome = match self.entries.entry(self.key.clone()) {
            Entry::Occupied(mut current) => {
                if expected.0.as_deref() == Some(current.get().as_str()) {
                    current.insert(encoded);
                    SwapOutcome::Swapped
                } else {
                    SwapOutcome::Conflict
                }
            }
            Entry::Vacant(slot) => {
                if expected.0.is_none() {
                    slot.insert(encoded);
                    SwapOutcome::Swapped
                } else {
                    SwapOutcome::Conflict
                }
            }
        };
        Ok(outcome)
    }
}
