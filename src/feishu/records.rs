use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ListItem, ListResponse, RawRecord, TokenProvider};
use crate::catalog::RecordSource;
use crate::config::Config;
use crate::error::FetchError;

/// Largest page the records endpoint accepts.
const PAGE_SIZE: u32 = 500;

/// Stop following `page_token` after this many pages.
const MAX_PAGES: usize = 50;

/// Lists the rows of one Bitable table.
pub struct BitableClient {
    http: Client,
    records_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl BitableClient {
    #[must_use]
    pub fn new(http: Client, config: &Config, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            records_url: config.records_url(),
            tokens,
        }
    }

    async fn fetch_page(
        &self,
        token: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<RawRecord>, Option<String>), FetchError> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![("page_size", page_size.as_str())];
        if let Some(page_token) = page_token {
            query.push(("page_token", page_token));
        }

        let response = self
            .http
            .get(&self.records_url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let payload = response.text().await.map_err(FetchError::Transport)?;
        let Ok(parsed) = serde_json::from_str::<ListResponse>(&payload) else {
            return Err(FetchError::Malformed { payload });
        };

        if parsed.code != 0 {
            return Err(FetchError::Rejected {
                code: parsed.code,
                payload,
            });
        }

        let Some(data) = parsed.data else {
            return Err(FetchError::Malformed { payload });
        };

        let next = if data.has_more {
            data.page_token.filter(|t| !t.is_empty())
        } else {
            None
        };

        let items = data.items.unwrap_or_default();
        let received = items.len();
        let rows: Vec<RawRecord> = items
            .into_iter()
            .flatten()
            .filter_map(ListItem::into_raw)
            .collect();
        if rows.len() < received {
            warn!(skipped = received - rows.len(), "Skipping rows without a record_id");
        }

        Ok((rows, next))
    }
}

#[async_trait]
impl RecordSource for BitableClient {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>, FetchError> {
        let token = self.tokens.get_token().await?;

        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let (items, next) = self.fetch_page(&token, page_token.as_deref()).await?;
            debug!(page, items = items.len(), "Fetched records page");
            records.extend(items);

            match next {
                Some(next) => page_token = Some(next),
                None => return Ok(records),
            }
        }

        warn!(
            pages = MAX_PAGES,
            records = records.len(),
            "Record listing still has more pages; truncating"
        );
        Ok(records)
    }
}
