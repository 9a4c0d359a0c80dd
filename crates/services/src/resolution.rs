//! # Resolution Service
//!
//! Turns a scanned or typed code into a [`Resolution`] against the pass
//! directory.

use std::sync::Arc;

use domains::{DomainError, Resolution, Result};
use tracing::info;

use crate::directory::PassDirectoryCache;

pub struct ResolutionService {
    directory: Arc<PassDirectoryCache>,
    /// Re-fetch the directory before each lookup instead of trusting the cache.
    refresh_on_resolve: bool,
}

impl ResolutionService {
    pub fn new(directory: Arc<PassDirectoryCache>, refresh_on_resolve: bool) -> Self {
        Self {
            directory,
            refresh_on_resolve,
        }
    }

    /// Resolves `scanned_code`; main ids take priority over use ids.
    ///
    /// `Ok(Resolution::NotFound)` means the directory answered and has no
    /// such code. A directory that cannot be reached is an `Err`.
    pub async fn resolve(&self, scanned_code: &str) -> Result<Resolution> {
        // Scanners commonly append a line terminator.
        let code = scanned_code.trim();
        if code.is_empty() {
            return Err(DomainError::Validation("QR code is required".to_string()));
        }

        let snapshot = if self.refresh_on_resolve {
            self.directory.refresh().await?
        } else {
            self.directory.snapshot().await
        };

        let resolution = Resolution::lookup(&snapshot, code);
        info!(
            code,
            outcome = resolution.outcome(),
            main_id = resolution.record().map(|r| r.id.as_str()),
            "code resolved"
        );
        Ok(resolution)
    }
}
