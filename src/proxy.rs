//! Authenticated file proxy.
//!
//! Attachment URLs handed out by Bitable only work with a tenant access
//! token. Pages link to `/proxy/file?url=...` instead; this module fetches
//! the original URL with the server's token and streams it back.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::TryStreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_FILE_CONTENT_TYPE, FILE_CACHE_CONTROL};
use crate::error::ProxyError;
use crate::feishu::TokenProvider;

/// Streams upstream files to clients, signing each request with a fresh
/// tenant token.
pub struct FileProxy {
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    timeout: Duration,
    allowed_hosts: Vec<String>,
}

impl FileProxy {
    /// Create a proxy whose outbound requests must connect and return headers
    /// within `timeout`. A non-empty `allowed_hosts` limits where the token is
    /// sent; an empty one lets through any http(s) host.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
        allowed_hosts: Vec<String>,
    ) -> reqwest::Result<Self> {
        // Bodies are relayed byte for byte, so no transparent decompression.
        let http = Client::builder()
            .connect_timeout(timeout)
            .no_gzip()
            .build()?;
        Ok(Self {
            http,
            tokens,
            timeout,
            allowed_hosts,
        })
    }

    fn check_target(&self, url: &str) -> Result<(), ProxyError> {
        let parsed = url::Url::parse(url)
            .map_err(|_| ProxyError::BadRequest("Invalid url parameter".to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProxyError::BadRequest(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        if self.allowed_hosts.is_empty() {
            return Ok(());
        }
        let host = parsed.host_str().unwrap_or_default();
        if !self
            .allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
        {
            return Err(ProxyError::BadRequest(format!("Host not allowed: {host}")));
        }
        Ok(())
    }

    /// Serve the file behind `url`.
    ///
    /// `if_none_match` is the client's `If-None-Match` header; when it already
    /// holds this URL's ETag the response is a 304 and upstream is not
    /// contacted.
    ///
    /// # Errors
    ///
    /// [`ProxyError::BadRequest`] when `url` is missing, empty, unparsable,
    /// not http(s), or outside a configured allow-list.
    /// [`ProxyError::Upstream`] when the token or the file cannot be fetched.
    pub async fn serve(
        &self,
        url: Option<&str>,
        if_none_match: Option<&HeaderValue>,
    ) -> Result<Response, ProxyError> {
        let url = url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProxyError::BadRequest("Missing url parameter".to_string()))?;
        self.check_target(url)?;

        let etag = etag_for(url);
        if if_none_match.is_some_and(|value| etag_matches(value, &etag)) {
            debug!(url = %url, "Client copy still valid");
            return file_response(StatusCode::NOT_MODIFIED, &etag, None, None, Body::empty());
        }

        let token = self
            .tokens
            .get_token()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let request = self.http.get(url).bearer_auth(&token).send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                ProxyError::Upstream(format!(
                    "no response from upstream within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream(format!("upstream returned {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_FILE_CONTENT_TYPE));
        let content_length = response.headers().get(CONTENT_LENGTH).cloned();

        debug!(url = %url, content_type = ?content_type, "Streaming upstream file");

        let source = url.to_string();
        let stream = response.bytes_stream().inspect_err(move |e| {
            warn!(url = %source, error = %e, "Upstream file stream failed");
        });

        file_response(
            StatusCode::OK,
            &etag,
            Some(content_type),
            content_length,
            Body::from_stream(stream),
        )
    }
}

fn file_response(
    status: StatusCode,
    etag: &str,
    content_type: Option<HeaderValue>,
    content_length: Option<HeaderValue>,
    body: Body,
) -> Result<Response, ProxyError> {
    let mut builder = Response::builder()
        .status(status)
        .header(CACHE_CONTROL, FILE_CACHE_CONTROL)
        .header(ETAG, etag)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    if let Some(content_length) = content_length {
        builder = builder.header(CONTENT_LENGTH, content_length);
    }
    builder
        .body(body)
        .map_err(|e| ProxyError::Upstream(e.to_string()))
}

/// Quoted ETag for an original URL. Depends on nothing but the URL.
#[must_use]
pub fn etag_for(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("\"{}\"", hex::encode(&digest[..16]))
}

fn etag_matches(if_none_match: &HeaderValue, etag: &str) -> bool {
    let Ok(value) = if_none_match.to_str() else {
        return false;
    };
    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}
