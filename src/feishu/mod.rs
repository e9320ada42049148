//! Feishu open platform client.
//!
//! Covers the two calls the catalog needs: issuing a tenant access token and
//! listing Bitable table records. Every response carries an application
//! `code`; anything other than zero is a failure even when the HTTP status
//! is 200.

mod records;
mod token;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

pub use records::BitableClient;
pub use token::{TenantTokenProvider, TokenProvider};

use crate::constants::USER_AGENT;

/// A table row as returned by the records endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub record_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    tenant_access_token: Option<String>,
    /// Remaining lifetime in seconds.
    expire: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    code: i64,
    data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    /// `null` when the table is empty.
    items: Option<Vec<Option<ListItem>>>,
    #[serde(default)]
    has_more: bool,
    page_token: Option<String>,
}

/// A row as it arrives on the wire. Either key may be missing or `null`.
#[derive(Debug, Deserialize)]
struct ListItem {
    record_id: Option<String>,
    fields: Option<Map<String, Value>>,
}

impl ListItem {
    /// Rows without an id cannot be addressed and are dropped.
    fn into_raw(self) -> Option<RawRecord> {
        let record_id = self.record_id.filter(|id| !id.is_empty())?;
        Some(RawRecord {
            record_id,
            fields: self.fields.unwrap_or_default(),
        })
    }
}

/// Build the HTTP client used for token and record calls.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_api_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
