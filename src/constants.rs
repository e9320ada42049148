//! Shared constants used across the application.

/// Local path served by the file proxy.
pub const PROXY_FILE_PATH: &str = "/proxy/file";

/// Content type used when the upstream file response does not declare one.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Cache-Control value attached to proxied files.
///
/// Upstream attachment URLs are content-addressed, so the bytes behind a
/// proxy URL never change.
pub const FILE_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

/// Cache-Control value for the catalog listing page.
pub const INDEX_CACHE_CONTROL: &str = "public, max-age=60";

/// Cache-Control value for record detail pages.
pub const DETAIL_CACHE_CONTROL: &str = "public, max-age=300";

/// User agent sent on upstream API calls.
pub const USER_AGENT: &str = concat!("bitable-catalog/", env!("CARGO_PKG_VERSION"));
