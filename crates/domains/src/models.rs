//! # Domain Models
//!
//! These structs represent the core entities of the badge desk: the ticket
//! records mirrored from the upstream directory and the pickup records kept
//! in the shared ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::templates::TemplateCode;

/// One attendee's pass, as published by the upstream directory.
///
/// Records are replaced wholesale on every directory fetch and never
/// mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    /// Primary identifier, unique within a snapshot. Also the badge payload.
    pub id: String,
    pub holder_name: Option<String>,
    pub holder_email: Option<String>,
    /// Entitlement tier (the directory's pass bucket name).
    pub badge_category: Option<String>,
    /// Secondary "use ticket" identifiers that resolve to this record.
    pub uses: Vec<String>,
    /// Lifecycle flag, surfaced to the caller but not enforced here.
    pub active: bool,
    /// Directory fields not otherwise interpreted, passed through verbatim.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TicketRecord {
    /// Name to print: holder name, else holder email, else empty.
    pub fn display_name(&self) -> &str {
        self.holder_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.holder_email.as_deref())
            .unwrap_or_default()
    }

    /// The badge template this record should be printed on.
    pub fn template_code(&self) -> TemplateCode {
        TemplateCode::from_badge_category(self.badge_category.as_deref())
    }

    pub fn has_use(&self, code: &str) -> bool {
        self.uses.iter().any(|u| u == code)
    }
}

/// Evidence that a badge was physically handed out.
///
/// The serialized field names match the ledger format written by earlier
/// stations, so existing ledgers keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRecord {
    /// Ticket id. Not checked against the current directory snapshot.
    pub id: String,
    #[serde(rename = "name", default)]
    pub holder_name: String,
    #[serde(rename = "email", default)]
    pub holder_email: String,
    #[serde(rename = "pickedUpAt")]
    pub picked_up_at: DateTime<Utc>,
}

/// Input of a pickup append. Blank name/email are stored as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPickup {
    pub id: String,
    pub holder_name: Option<String>,
    pub holder_email: Option<String>,
}

impl NewPickup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.holder_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.holder_email = Some(email.into());
        self
    }

    /// Stamps the pickup time and produces the record to store.
    pub fn into_record(self, picked_up_at: DateTime<Utc>) -> PickupRecord {
        PickupRecord {
            id: self.id,
            holder_name: self.holder_name.unwrap_or_default(),
            holder_email: self.holder_email.unwrap_or_default(),
            picked_up_at,
        }
    }
}

/// A complete, immutable copy of the directory taken at one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySnapshot {
    pub records: Vec<TicketRecord>,
    /// `None` until the first successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl DirectorySnapshot {
    pub fn new(records: Vec<TicketRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact match against the primary id.
    pub fn find_by_id(&self, code: &str) -> Option<&TicketRecord> {
        self.records.iter().find(|r| r.id == code)
    }

    /// First record, in snapshot order, whose `uses` contains `code`.
    ///
    /// A use id listed under several records resolves to the first one.
    /// This mirrors the directory as published and is not corrected here.
    pub fn find_by_use_id(&self, code: &str) -> Option<&TicketRecord> {
        self.records.iter().find(|r| r.has_use(code))
    }

    /// Case-insensitive substring search over holder name and email.
    pub fn search(&self, query: &str) -> Vec<&TicketRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|r| {
                let matches = |field: &Option<String>| {
                    field
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                };
                matches(&r.holder_name) || matches(&r.holder_email)
            })
            .collect()
    }
}
