//! # HTTP pass directory
//!
//! One-shot read of the upstream ticketing directory. The endpoint returns
//! `{"passes": [...]}`; each pass is mapped onto a [`TicketRecord`], keeping
//! the fields we do not interpret as pass-through metadata.

use std::time::Duration;

use async_trait::async_trait;
use domains::{DomainError, PassDirectory, Result, TicketRecord};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub struct HttpPassDirectory {
    client: reqwest::Client,
    /// May embed an API key; never logged.
    url: String,
}

impl HttpPassDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::directory(format!("client setup failed: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PassDirectory for HttpPassDirectory {
    async fn fetch_all(&self) -> Result<Vec<TicketRecord>> {
        let response = self
            .client
            .get(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DomainError::directory(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::DirectoryUnavailable {
                reason: format!("upstream returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let document: DirectoryDocument = response
            .json()
            .await
            .map_err(|e| DomainError::directory(format!("unreadable directory body: {}", e.without_url())))?;

        let listed = document.passes.len();
        let records: Vec<TicketRecord> = document
            .passes
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<PassDto>(raw) {
                Ok(pass) => Some(TicketRecord::from(pass)),
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed pass");
                    None
                }
            })
            .collect();

        debug!(passes = records.len(), skipped = listed - records.len(), "directory fetched");
        Ok(records)
    }
}

/// Passes are decoded one by one so a single bad entry is skipped, not fatal.
#[derive(Debug, Deserialize)]
struct DirectoryDocument {
    #[serde(default)]
    passes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PassDto {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    person: Option<PersonDto>,
    #[serde(default)]
    pass_bucket: Option<Value>,
    #[serde(default, deserialize_with = "use_ids")]
    uses: Vec<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonDto {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<PassDto> for TicketRecord {
    fn from(dto: PassDto) -> Self {
        let person = dto.person.unwrap_or_default();
        let badge_category = dto
            .pass_bucket
            .as_ref()
            .and_then(|bucket| bucket.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut metadata = dto.extra;
        if let Some(bucket) = dto.pass_bucket {
            metadata.insert("pass_bucket".to_string(), bucket);
        }

        TicketRecord {
            id: dto.id,
            holder_name: person.name,
            holder_email: person.email,
            badge_category,
            uses: dto.uses,
            // Passes without the flag are treated as live.
            active: dto.is_active.unwrap_or(true),
            metadata,
        }
    }
}

/// Ids are strings upstream, but numeric ids are accepted and stringified.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number id, found {other}"
        ))),
    }
}

fn use_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    static DIRECTORY_JSON: &str = r#"
    {
        "passes": [
            {
                "id": "42",
                "name": "Jane Doe",
                "person": { "name": "Jane Doe", "email": "jane@example.org" },
                "pass_bucket": { "id": "b1", "name": "TFM Badge" },
                "uses": ["42-u1", "42-u2"],
                "is_active": true,
                "order": { "id": "o-1" }
            },
            {
                "id": 7,
                "person": null,
                "uses": null
            }
        ]
    }"#;

    async fn directory_for(server: &MockServer) -> HttpPassDirectory {
        HttpPassDirectory::new(format!("{}/passes", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn maps_passes_onto_ticket_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/passes"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(DIRECTORY_JSON, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let records = directory_for(&server).await.fetch_all().await.unwrap();
        assert_eq!(records.len(), 2);

        let jane = &records[0];
        assert_eq!(jane.id, "42");
        assert_eq!(jane.holder_name.as_deref(), Some("Jane Doe"));
        assert_eq!(jane.holder_email.as_deref(), Some("jane@example.org"));
        assert_eq!(jane.badge_category.as_deref(), Some("TFM Badge"));
        assert_eq!(jane.uses, vec!["42-u1", "42-u2"]);
        assert!(jane.metadata.contains_key("order"));
        assert!(jane.metadata.contains_key("pass_bucket"));

        let anonymous = &records[1];
        assert_eq!(anonymous.id, "7");
        assert!(anonymous.holder_name.is_none());
        assert!(anonymous.uses.is_empty());
        assert!(anonymous.active);
    }

    #[tokio::test]
    async fn malformed_passes_are_skipped_not_fatal() {
        let server = MockServer::start().await;
        let body = r#"
        {
            "passes": [
                { "person": { "name": "No Id" } },
                { "id": null },
                { "id": "9", "is_active": "yes" },
                "not-a-pass",
                { "id": "42", "person": { "name": "Jane Doe" }, "uses": ["42-u1"] },
                { "id": true }
            ]
        }"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let records = directory_for(&server).await.fetch_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "42");
        assert_eq!(records[0].holder_name.as_deref(), Some("Jane Doe"));
        assert_eq!(records[0].uses, vec!["42-u1"]);
    }

    #[tokio::test]
    async fn non_success_status_is_directory_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = directory_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::DirectoryUnavailable { status: Some(503), .. }
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_directory_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = directory_for(&server).await.fetch_all().await.unwrap_err();
        assert!(matches!(err, DomainError::DirectoryUnavailable { status: None, .. }));
    }

    #[tokio::test]
    async fn missing_passes_key_is_an_empty_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        assert!(directory_for(&server).await.fetch_all().await.unwrap().is_empty());
    }
}
