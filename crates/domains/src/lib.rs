//! # domains
//!
//! The central domain model and port definitions for the badge desk.
//!
//! Nothing in this crate performs I/O. Adapters implement the traits in
//! [`ports`]; services drive them.

pub mod badge;
pub mod errors;
pub mod layout;
pub mod ledger;
pub mod models;
pub mod ports;
pub mod resolution;
pub mod templates;

// Re-exporting for easier access in other crates
pub use badge::*;
pub use errors::*;
pub use ledger::*;
pub use models::*;
pub use ports::*;
pub use resolution::*;
pub use templates::*;
