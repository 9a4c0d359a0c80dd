//! # Wire types
//!
//! Request and response bodies of the HTTP API. Field names are camelCase
//! except for pickup records, which keep the ledger's own format.

use chrono::{DateTime, Utc};
use domains::{
    AppendOutcome, PickupRecord, Resolution, TemplateCode, TemplateVariant, TicketRecord,
};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public view of a directory record; pass-through metadata is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassView {
    pub id: String,
    pub holder_name: Option<String>,
    pub holder_email: Option<String>,
    pub badge_category: Option<String>,
    pub uses: Vec<String>,
    pub active: bool,
    pub display_name: String,
    pub template_code: TemplateCode,
}

impl From<&TicketRecord> for PassView {
    fn from(record: &TicketRecord) -> Self {
        Self {
            id: record.id.clone(),
            holder_name: record.holder_name.clone(),
            holder_email: record.holder_email.clone(),
            badge_category: record.badge_category.clone(),
            uses: record.uses.clone(),
            active: record.active,
            display_name: record.display_name().to_string(),
            template_code: record.template_code(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PassQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassesResponse {
    pub passes: Vec<PassView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub qr_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub found: bool,
    pub is_main_record: bool,
    pub is_use_record: bool,
    pub scanned_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<PassView>,
    pub message: String,
}

impl VerifyResponse {
    pub fn new(scanned_id: impl Into<String>, resolution: &Resolution) -> Self {
        let record = resolution.record();
        Self {
            found: resolution.is_found(),
            is_main_record: matches!(resolution, Resolution::MainRecordMatch(_)),
            is_use_record: matches!(resolution, Resolution::UseRecordMatch { .. }),
            scanned_id: scanned_id.into(),
            main_record_id: record.map(|r| r.id.clone()),
            pass: record.map(PassView::from),
            message: resolution.message(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PickupsResponse {
    pub pickups: Vec<PickupRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStatusResponse {
    pub id: String,
    pub picked_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<PickupRecord>,
}

/// Accepts the ledger's `name`/`email` keys as well as `holderName`/`holderEmail`.
#[derive(Debug, Deserialize)]
pub struct CreatePickupRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "holderName")]
    pub name: Option<String>,
    #[serde(default, alias = "holderEmail")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePickupResponse {
    pub message: String,
    pub already_picked_up: bool,
    pub pickup: PickupRecord,
}

impl From<AppendOutcome> for CreatePickupResponse {
    fn from(outcome: AppendOutcome) -> Self {
        let already_picked_up = !outcome.is_appended();
        let message = if already_picked_up {
            "Badge already picked up"
        } else {
            "Badge marked as picked up"
        };
        Self {
            message: message.to_string(),
            already_picked_up,
            pickup: outcome.into_record(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: &'static [TemplateVariant],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Ids are strings, but scanners and older clients sometimes send numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a string, found {other}"))),
    }
}
