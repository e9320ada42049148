//! Error types for the Feishu client and the file proxy.
//!
//! Record errors never reach HTTP callers; the repository logs them and
//! answers with an empty list. Proxy errors map straight to a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure to obtain a tenant access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("token request rejected with code {code}: {payload}")]
    Rejected { code: i64, payload: String },
    #[error("malformed token response: {payload}")]
    Malformed { payload: String },
}

/// Failure to list table records after (or while) authenticating.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("record listing failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("record listing rejected with code {code}: {payload}")]
    Rejected { code: i64, payload: String },
    #[error("malformed record listing response: {payload}")]
    Malformed { payload: String },
}

/// Failure serving a proxied file.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),
    #[error("File download failed: {0}")]
    Upstream(String),
}

impl ProxyError {
    /// HTTP status the error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_status() {
        assert_eq!(
            ProxyError::BadRequest("Missing url parameter".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::Upstream("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_error_text() {
        let err = ProxyError::Upstream("upstream returned 404 Not Found".to_string());
        assert_eq!(
            err.to_string(),
            "File download failed: upstream returned 404 Not Found"
        );
    }

    #[test]
    fn test_fetch_error_wraps_auth() {
        let err: FetchError = AuthError::Rejected {
            code: 10003,
            payload: r#"{"code":10003}"#.to_string(),
        }
        .into();
        assert!(err.to_string().contains("10003"));
    }
}
