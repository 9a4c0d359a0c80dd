//! # Pass Directory Cache
//!
//! Holds the last full snapshot fetched from the upstream directory.
//! A refresh replaces the snapshot wholesale; lookups never hit the network.

use std::sync::Arc;

use chrono::Utc;
use domains::{DirectorySnapshot, PassDirectory, Result, TicketRecord};
use tokio::sync::RwLock;
use tracing::{error, info};

pub struct PassDirectoryCache {
    source: Arc<dyn PassDirectory>,
    snapshot: RwLock<Arc<DirectorySnapshot>>,
}

impl PassDirectoryCache {
    /// Starts empty; nothing is fetched until the first `refresh`.
    pub fn new(source: Arc<dyn PassDirectory>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(DirectorySnapshot::default())),
        }
    }

    /// Fetches the full directory and swaps it in.
    ///
    /// On failure the previous snapshot is kept and the error is returned.
    /// There is no retry; the operator refreshes again.
    pub async fn refresh(&self) -> Result<Arc<DirectorySnapshot>> {
        let records = self.source.fetch_all().await.map_err(|e| {
            error!(error = %e, "directory refresh failed");
            e
        })?;

        let fresh = Arc::new(DirectorySnapshot::new(records, Utc::now()));
        *self.snapshot.write().await = Arc::clone(&fresh);

        info!(records = fresh.len(), "directory snapshot refreshed");
        Ok(fresh)
    }

    /// The current snapshot, possibly empty if never refreshed.
    pub async fn snapshot(&self) -> Arc<DirectorySnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    pub async fn find_by_id(&self, code: &str) -> Option<TicketRecord> {
        self.snapshot().await.find_by_id(code).cloned()
    }

    pub async fn find_by_use_id(&self, code: &str) -> Option<TicketRecord> {
        self.snapshot().await.find_by_use_id(code).cloned()
    }

    pub async fn search(&self, query: &str) -> Vec<TicketRecord> {
        self.snapshot()
            .await
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{DomainError, MockPassDirectory};
    use tokio_test::{assert_err, assert_ok};

    fn record(id: &str, name: &str, uses: &[&str]) -> TicketRecord {
        TicketRecord {
            id: id.to_string(),
            holder_name: Some(name.to_string()),
            holder_email: None,
            badge_category: None,
            uses: uses.iter().map(|u| u.to_string()).collect(),
            active: true,
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_and_serves_lookups() {
        let mut source = MockPassDirectory::new();
        source
            .expect_fetch_all()
            .times(1)
            .returning(|| Ok(vec![record("42", "Jane Doe", &["42-u1"])]));

        let cache = PassDirectoryCache::new(Arc::new(source));
        assert!(cache.snapshot().await.is_empty());

        let snapshot = cache.refresh().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.fetched_at.is_some());

        assert_eq!(cache.find_by_id("42").await.map(|r| r.id), Some("42".to_string()));
        assert_eq!(cache.find_by_use_id("42-u1").await.map(|r| r.id), Some("42".to_string()));
        assert_eq!(cache.search("jane").await.len(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let mut source = MockPassDirectory::new();
        let mut calls = 0;
        source.expect_fetch_all().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(vec![record("1", "First", &[])])
            } else {
                Err(DomainError::DirectoryUnavailable {
                    reason: "upstream returned 503".to_string(),
                    status: Some(503),
                })
            }
        });

        let cache = PassDirectoryCache::new(Arc::new(source));
        assert_ok!(cache.refresh().await);

        let err = assert_err!(cache.refresh().await);
        assert!(matches!(err, DomainError::DirectoryUnavailable { status: Some(503), .. }));
        assert!(cache.find_by_id("1").await.is_some());
    }
}
