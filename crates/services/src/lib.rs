//! # services
//!
//! Business logic of the badge desk, written only against the ports in
//! `domains`. Adapters are injected as `Arc<dyn Port>`.

pub mod badge;
pub mod directory;
pub mod ledger;
pub mod resolution;

pub use badge::{BadgeService, BadgeSettings};
pub use directory::PassDirectoryCache;
pub use ledger::PickupLedger;
pub use resolution::ResolutionService;
