//! # DomainError
//!
//! Centralized error taxonomy for the badge desk.
//! Maps every failure the core can produce to one actionable variant.
//!
//! Two outcomes are deliberately absent: an unresolved scan is
//! [`Resolution::NotFound`](crate::Resolution::NotFound) and a repeated pickup is
//! [`AppendOutcome::AlreadyPresent`](crate::AppendOutcome::AlreadyPresent).
//! Both are values the caller is expected to handle, not failures.

use thiserror::Error;

use crate::templates::TemplateCode;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// The upstream ticketing directory could not be read
    /// (transport failure, non-2xx status, or an unparseable body).
    #[error("directory unavailable: {reason}")]
    DirectoryUnavailable {
        reason: String,
        status: Option<u16>,
    },

    /// The base document of a template could not be fetched or parsed.
    #[error("template {code} could not be loaded: {reason}")]
    TemplateLoad { code: TemplateCode, reason: String },

    /// A template code outside the closed set.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// The display font could not be loaded. Recovered by the badge
    /// service through the built-in fallback; never reaches a caller.
    #[error("font could not be loaded: {0}")]
    FontLoad(String),

    /// The identifier could not be encoded as a matrix barcode.
    #[error("identifier could not be encoded: {0}")]
    Encoding(String),

    /// The document could not be assembled or serialized.
    #[error("document rendering failed: {0}")]
    Render(String),

    /// The pickup ledger backend failed (connection, corrupt payload).
    #[error("ledger storage error: {0}")]
    Storage(String),

    /// Every conditional-write attempt lost against a concurrent writer.
    #[error("ledger write for {id} kept conflicting after {attempts} attempts")]
    LedgerContention { id: String, attempts: u32 },

    /// Caller input rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn directory(reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            reason: reason.into(),
            status: None,
        }
    }

    pub fn template(code: TemplateCode, reason: impl Into<String>) -> Self {
        Self::TemplateLoad {
            code,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for badge desk logic.
pub type Result<T> = std::result::Result<T, DomainError>;
