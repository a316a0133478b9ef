//! Notion database client.
//!
//! Records live as pages in a single database with the properties
//! `opinion` (title), `spiceLevel` (select), `status` (status) and
//! `submitter` (rich text).

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header;
use secrecy::{ExposeSecret, SecretString};
use serde_derive::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};

use crate::error::ApiError;
use crate::record::{Record, SpiceLevel, Status};

pub const NOTION_VERSION: &str = "2022-06-28";

/// Upper bound on records fetched per query. There is no pagination: anything
/// past the cap waits for a later query.
pub const PAGE_SIZE: usize = 100;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose status is `new`, at most [`PAGE_SIZE`] of them.
    async fn query_new(&self) -> Result<Vec<Record>, ApiError>;

    async fn create(&self, record: &Record) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base: String,
    database_id: String,
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("base", &self.base)
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(
        api_key: &SecretString,
        database_id: impl Into<String>,
        base: impl Into<String>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth_value =
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            "notion-version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(NotionClient {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            database_id: database_id.into(),
        })
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    async fn call(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base, endpoint))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    #[instrument(skip(self), fields(database_id = %self.database_id))]
    async fn query_new(&self) -> Result<Vec<Record>, ApiError> {
        let body = json!({
            "filter": {
                "property": "status",
                "status": { "equals": Status::NEW },
            },
            "page_size": PAGE_SIZE,
        });
        let endpoint = format!("databases/{}/query", self.database_id);

        let reply = match self.call(&endpoint, &body).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "database query failed");
                return Err(e);
            }
        };
        let response: QueryResponse = serde_json::from_value(reply).map_err(|e| {
            error!(error = %e, "database query returned an unexpected shape");
            ApiError::Decode(e.to_string())
        })?;

        let records = decode_pages(response.results);
        let unexpected = records.iter().filter(|r| r.status != Status::New).count();
        if unexpected > 0 {
            warn!(unexpected, "status filter let through records that are not new");
        }
        debug!(count = records.len(), "queried new records");
        Ok(records)
    }

    #[instrument(skip(self, record), fields(database_id = %self.database_id))]
    async fn create(&self, record: &Record) -> Result<(), ApiError> {
        let submitter = record.attribution().unwrap_or_default();
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                "opinion": {
                    "title": [{ "text": { "content": record.opinion } }],
                },
                "spiceLevel": {
                    "select": { "name": record.spice_level.as_str() },
                },
                "submitter": {
                    "rich_text": [{ "text": { "content": submitter } }],
                },
            },
        });

        match self.call("pages", &body).await {
            Ok(_) => {
                debug!("record created");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "record creation failed");
                Err(e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    id: String,
    properties: PageProperties,
}

#[derive(Debug, Deserialize)]
struct PageProperties {
    opinion: TitleProperty,
    #[serde(rename = "spiceLevel")]
    spice_level: SelectProperty,
    #[serde(default)]
    status: Option<StatusProperty>,
    #[serde(default)]
    submitter: Option<RichTextProperty>,
}

#[derive(Debug, Deserialize)]
struct TitleProperty {
    #[serde(default)]
    title: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct RichTextProperty {
    #[serde(default)]
    rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct SelectProperty {
    select: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct StatusProperty {
    status: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    content: String,
}

fn join_text(segments: &[RichText]) -> String {
    segments
        .iter()
        .filter_map(|segment| {
            segment
                .text
                .as_ref()
                .map(|t| t.content.as_str())
                .or(segment.plain_text.as_deref())
        })
        .collect()
}

fn record_from_page(page: Page) -> Result<Record, String> {
    let props = page.properties;

    let opinion = join_text(&props.opinion.title);
    if opinion.is_empty() {
        return Err("empty opinion".into());
    }
    let spice_level = props
        .spice_level
        .select
        .ok_or("no spice level")?
        .name
        .parse::<SpiceLevel>()
        .map_err(|e| e.to_string())?;
    let status = props
        .status
        .and_then(|s| s.status)
        .map(|s| Status::from(s.name))
        .unwrap_or(Status::New);
    let submitter = props
        .submitter
        .map(|s| join_text(&s.rich_text))
        .filter(|s| !s.is_empty());

    Ok(Record {
        opinion,
        spice_level,
        status,
        submitter,
    })
}

/// Pages that don't decode into a record are logged and skipped.
fn decode_pages(results: Vec<Value>) -> Vec<Record> {
    results
        .into_iter()
        .filter_map(|value| {
            let page: Page = match serde_json::from_value(value) {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "skipping malformed page");
                    return None;
                }
            };
            let id = page.id.clone();
            match record_from_page(page) {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!(page_id = %id, %reason, "skipping undecodable record");
                    None
                }
            }
        })
        .collect()
}
