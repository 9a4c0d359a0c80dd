//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the services.

use async_trait::async_trait;
use bytes::Bytes;

use crate::badge::{Raster, RenderPlan, RenderedDocument};
use crate::errors::Result;
use crate::ledger::{LedgerSnapshot, LedgerVersion, SwapOutcome};
use crate::models::{PickupRecord, TicketRecord};
use crate::templates::TemplateCode;

/// Read-only upstream list of ticket records.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PassDirectory: Send + Sync {
    /// One full fetch. Fails with `DirectoryUnavailable`.
    async fn fetch_all(&self) -> Result<Vec<TicketRecord>>;
}

/// Shared storage for the pickup ledger.
///
/// # Developer Note
/// The store is the source of truth for "already picked up". A plain
/// get/set pair cannot provide that across stations, so writes go through
/// `compare_and_swap`, which the backend must perform atomically.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PickupStore: Send + Sync {
    /// Reads the whole ledger and the version it was read at.
    async fn load(&self) -> Result<LedgerSnapshot>;

    /// Replaces the ledger with `records` only if it is still at `expected`.
    async fn compare_and_swap(
        &self,
        expected: &LedgerVersion,
        records: &[PickupRecord],
    ) -> Result<SwapOutcome>;
}

/// Fixed-path badge assets: template documents, previews and the display font.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Base document of a template. Fails with `TemplateLoad`.
    async fn template_document(&self, code: TemplateCode) -> Result<Bytes>;
    /// Preview raster of a template. Fails with `TemplateLoad`.
    async fn template_preview(&self, code: TemplateCode) -> Result<Bytes>;
    /// The display font program. Fails with `FontLoad`.
    async fn display_font(&self) -> Result<Bytes>;
}

/// Turns an identifier into a square matrix-barcode raster.
///
/// Implementations must be deterministic: the same payload and settings
/// always produce the same pixels.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait CodeEncoder: Send + Sync {
    /// `target_px` is the raster side; `quiet_zone` is in modules.
    fn encode(&self, payload: &str, target_px: u32, quiet_zone: u32) -> Result<Raster>;
}

/// Assembles and serializes the badge document.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, plan: &RenderPlan) -> Result<RenderedDocument>;
}
