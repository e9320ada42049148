use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::TokenResponse;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::AuthError;

/// Lifetime assumed when the token response omits `expire`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7200);

/// Tokens are refreshed this long before Feishu says they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Source of bearer credentials for upstream calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Issues tenant access tokens for an internal Feishu app.
///
/// With caching enabled a token is reused until shortly before its declared
/// expiry; the mutex is held across the refresh so concurrent callers wait
/// for one request instead of each issuing their own.
pub struct TenantTokenProvider {
    http: Client,
    token_url: String,
    app_id: String,
    app_secret: String,
    cache: Option<Mutex<Option<CachedToken>>>,
    clock: Arc<dyn Clock>,
}

impl TenantTokenProvider {
    #[must_use]
    pub fn new(http: Client, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            token_url: config.token_url(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            cache: config.token_cache_enabled.then(|| Mutex::new(None)),
            clock,
        }
    }

    async fn fetch_token(&self) -> Result<(String, Duration), AuthError> {
        debug!(url = %self.token_url, "Requesting tenant access token");

        let response = self
            .http
            .post(&self.token_url)
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let payload = response.text().await.map_err(AuthError::Transport)?;
        let Ok(parsed) = serde_json::from_str::<TokenResponse>(&payload) else {
            return Err(AuthError::Malformed { payload });
        };

        if parsed.code != 0 {
            return Err(AuthError::Rejected {
                code: parsed.code,
                payload,
            });
        }

        let lifetime = parsed
            .expire
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);

        match parsed.tenant_access_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok((token, lifetime)),
            None => Err(AuthError::Malformed { payload }),
        }
    }
}

#[async_trait]
impl TokenProvider for TenantTokenProvider {
    async fn get_token(&self) -> Result<String, AuthError> {
        let Some(cache) = &self.cache else {
            return self.fetch_token().await.map(|(token, _)| token);
        };

        let mut slot = cache.lock().await;
        if let Some(cached) = slot.as_ref() {
            if self.clock.now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let (token, lifetime) = self.fetch_token().await?;
        let refresh_at = self.clock.now() + lifetime.saturating_sub(REFRESH_MARGIN);
        info!(lifetime_secs = lifetime.as_secs(), "Obtained tenant access token");
        *slot = Some(CachedToken {
            value: token.clone(),
            refresh_at,
        });
        Ok(token)
    }
}
