//! # Resolution
//!
//! Classifies a scanned or typed code against a directory snapshot.

use crate::models::{DirectorySnapshot, TicketRecord};

/// Outcome of looking a code up. `NotFound` is an expected answer, distinct
/// from the directory being unreachable.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The code is a record's primary id.
    MainRecordMatch(TicketRecord),
    /// The code is one of a record's use ids.
    UseRecordMatch {
        record: TicketRecord,
        scanned_code: String,
    },
    NotFound,
}

impl Resolution {
    /// Primary-id match first, then the use-id scan.
    ///
    /// Primary ids win: a use id that collides with another record's main id
    /// resolves to that main record.
    pub fn lookup(snapshot: &DirectorySnapshot, code: &str) -> Resolution {
        if let Some(record) = snapshot.find_by_id(code) {
            return Resolution::MainRecordMatch(record.clone());
        }

        match snapshot.find_by_use_id(code) {
            Some(record) => Resolution::UseRecordMatch {
                record: record.clone(),
                scanned_code: code.to_string(),
            },
            None => Resolution::NotFound,
        }
    }

    pub fn record(&self) -> Option<&TicketRecord> {
        match self {
            Resolution::MainRecordMatch(record) => Some(record),
            Resolution::UseRecordMatch { record, .. } => Some(record),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Resolution::NotFound)
    }

    /// Stable label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::MainRecordMatch(_) => "main_record",
            Resolution::UseRecordMatch { .. } => "use_record",
            Resolution::NotFound => "not_found",
        }
    }

    /// Operator-facing summary of the match.
    pub fn message(&self) -> String {
        match self {
            Resolution::MainRecordMatch(record) => {
                format!("Main record found for {}.", record.display_name())
            }
            Resolution::UseRecordMatch { record, .. } => format!(
                "This is a use ticket. Redirected to main record for {}.",
                record.display_name()
            ),
            Resolution::NotFound => {
                "QR code not found in the system. This badge is not registered in the directory."
                    .to_string()
            }
        }
    }
}
