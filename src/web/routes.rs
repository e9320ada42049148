use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, IF_NONE_MATCH};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;

use super::templates;
use super::AppState;
use crate::catalog::{filter_by_product_type, product_types};
use crate::constants::{DETAIL_CACHE_CONTROL, INDEX_CACHE_CONTROL, PROXY_FILE_PATH};

/// Create the router with all routes.
///
/// Pages and JSON are compressed; proxied files are relayed untouched.
pub fn router() -> Router<AppState> {
    let pages = Router::new()
        .route("/", get(index))
        .route("/detail/:record_id", get(detail))
        .route("/api/records", get(api_records))
        .route("/api/records/:record_id", get(api_record))
        .layer(CompressionLayer::new());

    Router::new()
        .merge(pages)
        .route(PROXY_FILE_PATH, get(proxy_file))
        .route("/favicon.ico", get(favicon))
        .route("/favicon.png", get(favicon))
        .route("/healthz", get(health))
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    product_type: String,
}

// ========== HTML Routes ==========

async fn index(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let records = state.repository.get_records().await;
    let visible = filter_by_product_type(&records, &params.product_type);
    let all_types = product_types(&records);

    let page = templates::render_index(&visible, &all_types, &params.product_type);
    ([(CACHE_CONTROL, INDEX_CACHE_CONTROL)], page).into_response()
}

async fn detail(State(state): State<AppState>, Path(record_id): Path<String>) -> Response {
    let Some(record) = state.repository.get_record(&record_id).await else {
        return (StatusCode::NOT_FOUND, "Record not found").into_response();
    };

    let page = templates::render_detail(&record);
    ([(CACHE_CONTROL, DETAIL_CACHE_CONTROL)], page).into_response()
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> &'static str {
    "ok"
}

// ========== JSON API ==========

async fn api_records(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Response {
    let records = state.repository.get_records().await;
    Json(filter_by_product_type(&records, &params.product_type)).into_response()
}

async fn api_record(State(state): State<AppState>, Path(record_id): Path<String>) -> Response {
    match state.repository.get_record(&record_id).await {
        Some(record) => Json(record).into_response(),
        None => (StatusCode::NOT_FOUND, "Record not found").into_response(),
    }
}

// ========== File Proxy ==========

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
}

async fn proxy_file(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Response {
    match state
        .proxy
        .serve(params.url.as_deref(), headers.get(IF_NONE_MATCH))
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = ?params.url, error = %e, "File proxy request failed");
            e.into_response()
        }
    }
}
