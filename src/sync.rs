//! Status Syncer
//!
//! Pulls remote status records changed since the newest one already stored
//! and merges them into the catalog store by product number.

use crate::error::SyncError;
use crate::store::{CatalogStore, RemoteStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cursor sent when no status has ever been stored.
pub const EPOCH_CURSOR: &str = "20010101";

const CURSOR_FORMAT: &str = "%Y/%m/%dT%H:%M:%S";
const UPDATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default remote API base.
pub const DEFAULT_BASE_URL: &str = "https://www.uoyabause.org/api/games";

/// What to do with a malformed element in a status payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Reject the whole batch before anything is written
    #[default]
    Abort,
    /// Log and count the element, apply the rest
    Skip,
}

/// Source of raw status payloads
pub trait StatusSource: Send + Sync {
    /// Fetch the JSON payload of records updated since `cursor`.
    fn fetch_since(&self, cursor: &str) -> Result<String, SyncError>;
}

/// Credentials and endpoint for the remote status service
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

/// `StatusSource` over HTTP. Redirects are never followed.
pub struct HttpStatusSource {
    client: reqwest::blocking::Client,
    endpoint: RemoteEndpoint,
}

impl HttpStatusSource {
    pub fn new(endpoint: RemoteEndpoint) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn url_for(&self, cursor: &str) -> String {
        format!(
            "{}/get_status_from/?date={}",
            self.endpoint.base_url.trim_end_matches('/'),
            cursor
        )
    }
}

impl StatusSource for HttpStatusSource {
    fn fetch_since(&self, cursor: &str) -> Result<String, SyncError> {
        let url = self.url_for(cursor);
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.endpoint.user, Some(&self.endpoint.password))
            .send()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SyncError::RemoteRejected(status.as_u16()));
        }
        response
            .text()
            .map_err(|e| SyncError::Network(e.to_string()))
    }
}

/// Outcome of one sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Cursor the request was made with
    pub cursor: String,
    pub received: usize,
    pub applied: usize,
    /// Malformed elements dropped under `MalformedPolicy::Skip`
    pub skipped: usize,
    /// Catalog entries whose status fields were refreshed
    pub entries_refreshed: usize,
}

/// Render the sync cursor for a request.
pub fn format_cursor(last_update: Option<NaiveDateTime>) -> String {
    match last_update {
        Some(at) => at.format(CURSOR_FORMAT).to_string(),
        None => EPOCH_CURSOR.to_string(),
    }
}

/// Parse an `updated_at` value. Text after the seconds field (fractions,
/// zone suffixes) is ignored.
pub fn parse_updated_at(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_and_remainder(value, UPDATED_AT_FORMAT)
        .ok()
        .map(|(at, _)| at)
}

fn string_field<'v>(record: &'v Value, name: &str) -> Result<&'v str, String> {
    record
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string `{}`", name))
}

fn rating_field(record: &Value) -> Result<i64, String> {
    match record.get("rating") {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| format!("non-integer rating {}", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("non-integer rating {:?}", s)),
        _ => Err("missing `rating`".to_string()),
    }
}

/// Decode one payload element.
pub fn parse_record(record: &Value) -> Result<RemoteStatus, String> {
    let product_number = string_field(record, "product_number")?;
    let image_url = string_field(record, "image_url")?;
    let updated_at = string_field(record, "updated_at")?;
    let update_at =
        parse_updated_at(updated_at).ok_or_else(|| format!("bad updated_at {:?}", updated_at))?;
    let rating = rating_field(record)?;

    Ok(RemoteStatus {
        product_number: product_number.to_string(),
        image_url: image_url.to_string(),
        rating,
        update_at,
    })
}

/// Incremental remote status sync
pub struct StatusSyncer<'a> {
    store: &'a dyn CatalogStore,
    source: &'a dyn StatusSource,
    policy: MalformedPolicy,
}

impl<'a> StatusSyncer<'a> {
    pub fn new(store: &'a dyn CatalogStore, source: &'a dyn StatusSource) -> Self {
        Self {
            store,
            source,
            policy: MalformedPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sync(&self) -> Result<SyncReport, SyncError> {
        let cursor = format_cursor(self.store.last_status_update()?);
        let payload = self.source.fetch_since(&cursor)?;

        let value: Value = serde_json::from_str(&payload)
            .map_err(|e| SyncError::MalformedPayload(e.to_string()))?;
        let Value::Array(elements) = value else {
            return Err(SyncError::MalformedPayload(
                "expected a JSON array".to_string(),
            ));
        };

        let mut report = SyncReport {
            cursor,
            received: elements.len(),
            ..SyncReport::default()
        };

        // Validate the whole batch before the first write
        let mut records = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match parse_record(element) {
                Ok(record) => records.push(record),
                Err(reason) => match self.policy {
                    MalformedPolicy::Abort => {
                        return Err(SyncError::MalformedPayload(format!(
                            "element {}: {}",
                            index, reason
                        )));
                    }
                    MalformedPolicy::Skip => {
                        warn!("Skipping status element {}: {}", index, reason);
                        report.skipped += 1;
                    }
                },
            }
        }

        let mut by_product = if records.is_empty() {
            HashMap::new()
        } else {
            self.store.entries_by_product()?
        };
        for record in &records {
            self.store.put_status(record)?;
            if let Some(entries) = by_product.get_mut(&record.product_number) {
                for entry in entries.iter_mut() {
                    entry.apply_status(record);
                    self.store.put_entry(entry)?;
                    report.entries_refreshed += 1;
                }
            }
            report.applied += 1;
        }
        self.store.flush()?;

        info!(
            cursor = %report.cursor,
            applied = report.applied,
            skipped = report.skipped,
            "Status sync complete"
        );
        Ok(report)
    }
}
