//! # storage-adapters
//!
//! Implementations of the `domains` ports:
//!
//! - [`directory::HttpPassDirectory`]: upstream ticket directory over HTTP
//! - [`ledger::MemoryPickupStore`] / `ledger::RedisPickupStore` (feature `redis`)
//! - [`assets::LocalAssetStore`]: template documents, previews and font on disk
//! - [`media::QrCodeEncoder`] and [`media::PdfRenderer`]: badge composition

pub mod assets;
pub mod directory;
pub mod ledger;
pub mod media;

pub use assets::LocalAssetStore;
pub use directory::HttpPassDirectory;
pub use ledger::MemoryPickupStore;
#[cfg(feature = "redis")]
pub use ledger::RedisPickupStore;
pub use media::{PdfRenderer, QrCodeEncoder};
