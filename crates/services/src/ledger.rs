//! # Pickup Ledger
//!
//! Records which badges have been collected, shared by every station.
//!
//! A ticket id moves from unregistered to picked up exactly once. The check
//! runs in two phases and both always run:
//!
//! 1. read the ledger and look for the id (fast, possibly stale);
//! 2. write the extended list conditionally on the version read in step 1.
//!    The store rejects the write if another station wrote in between, in
//!    which case we start again from step 1.
//!
//! Two stations racing on the same id therefore see one `Appended` and one
//! `AlreadyPresent`, never two `Appended`.

use std::sync::Arc;

use chrono::Utc;
use domains::{AppendOutcome, DomainError, NewPickup, PickupRecord, PickupStore, Result, SwapOutcome};
use tracing::{debug, info, warn};

pub struct PickupLedger {
    store: Arc<dyn PickupStore>,
    max_attempts: u32,
}

impl PickupLedger {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(store: Arc<dyn PickupStore>) -> Self {
        Self::with_max_attempts(store, Self::DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: Arc<dyn PickupStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Every pickup, in the order they were recorded.
    pub async fn list(&self) -> Result<Vec<PickupRecord>> {
        Ok(self.store.load().await?.records)
    }

    /// The stored pickup for `id`, from a fresh read.
    pub async fn find(&self, id: &str) -> Result<Option<PickupRecord>> {
        Ok(self.store.load().await?.find(id).cloned())
    }

    pub async fn is_picked_up(&self, id: &str) -> Result<bool> {
        Ok(self.find(id).await?.is_some())
    }

    /// Records a pickup unless one already exists for the id.
    pub async fn try_append(&self, pickup: NewPickup) -> Result<AppendOutcome> {
        if pickup.id.trim().is_empty() {
            return Err(DomainError::Validation("ID is required".to_string()));
        }

        for attempt in 1..=self.max_attempts {
            // Phase 1: optimistic membership check on a fresh read.
            let snapshot = self.store.load().await?;
            if let Some(existing) = snapshot.find(&pickup.id) {
                info!(id = %pickup.id, picked_up_at = %existing.picked_up_at, "badge already picked up");
                return Ok(AppendOutcome::AlreadyPresent(existing.clone()));
            }

            let record = pickup.clone().into_record(Utc::now());
            let mut next = snapshot.records.clone();
            next.push(record.clone());

            // Phase 2: the store decides.
            match self.store.compare_and_swap(&snapshot.version, &next).await? {
                SwapOutcome::Swapped => {
                    info!(id = %record.id, attempt, "badge marked as picked up");
                    return Ok(AppendOutcome::Appended(record));
                }
                SwapOutcome::Conflict => {
                    debug!(id = %pickup.id, attempt, "ledger changed underneath, re-reading");
                }
            }
        }

        warn!(id = %pickup.id, attempts = self.max_attempts, "giving up on contended ledger write");
        Err(DomainError::LedgerContention {
            id: pickup.id,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{LedgerSnapshot, LedgerVersion, MockPickupStore};
    use mockall::Sequence;

    fn stored(id: &str) -> PickupRecord {
        NewPickup::new(id).with_name("Someone").into_record(Utc::now())
    }

    #[tokio::test]
    async fn appends_when_absent() {
        let mut store = MockPickupStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Ok(LedgerSnapshot::default()));
        store
            .expect_compare_and_swap()
            .withf(|expected, records| expected == &LedgerVersion::empty() && records.len() == 1)
            .times(1)
            .returning(|_, _| Ok(SwapOutcome::Swapped));

        let ledger = PickupLedger::new(Arc::new(store));
        let outcome = ledger
            .try_append(NewPickup::new("X").with_name("Ada"))
            .await
            .unwrap();

        assert!(outcome.is_appended());
        assert_eq!(outcome.record().holder_name, "Ada");
        assert_eq!(outcome.record().holder_email, "");
    }

    #[tokio::test]
    async fn existing_entry_short_circuits_without_writing() {
        let mut store = MockPickupStore::new();
        store.expect_load().returning(|| {
            Ok(LedgerSnapshot {
                records: vec![stored("X")],
                version: LedgerVersion(Some("[...]".to_string())),
            })
        });
        store.expect_compare_and_swap().never();

        let ledger = PickupLedger::new(Arc::new(store));
        let outcome = ledger.try_append(NewPickup::new("X")).await.unwrap();

        assert!(matches!(outcome, AppendOutcome::AlreadyPresent(ref r) if r.holder_name == "Someone"));
    }

    #[tokio::test]
    async fn lost_race_rereads_and_reports_already_present() {
        let mut seq = Sequence::new();
        let mut store = MockPickupStore::new();
        store
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(LedgerSnapshot::default()));
        store
            .expect_compare_and_swap()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SwapOutcome::Conflict));
        store
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Ok(LedgerSnapshot {
                    records: vec![stored("99")],
                    version: LedgerVersion(Some("v2".to_string())),
                })
            });

        let ledger = PickupLedger::new(Arc::new(store));
        let outcome = ledger.try_append(NewPickup::new("99")).await.unwrap();
        assert!(!outcome.is_appended());
        assert_eq!(outcome.record().id, "99");
    }

    #[tokio::test]
    async fn persistent_conflicts_surface_as_contention() {
        let mut store = MockPickupStore::new();
        store
            .expect_load()
            .times(3)
            .returning(|| Ok(LedgerSnapshot::default()));
        store
            .expect_compare_and_swap()
            .times(3)
            .returning(|_, _| Ok(SwapOutcome::Conflict));

        let ledger = PickupLedger::with_max_attempts(Arc::new(store), 3);
        let err = ledger.try_append(NewPickup::new("7")).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::LedgerContention {
                id: "7".to_string(),
                attempts: 3
            }
        );
    }

    #[tokio::test]
    async fn blank_id_is_rejected() {
        let ledger = PickupLedger::new(Arc::new(MockPickupStore::new()));
        assert!(matches!(
            ledger.try_append(NewPickup::new(" ")).await,
            Err(DomainError::Validation(_))
        ));
    }
}
