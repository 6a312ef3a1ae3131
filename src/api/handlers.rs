use axum::{
    extract::{Path, RawQuery, State},
    http::Uri,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::RequestId,
    models::{CatalogEntry, Manifest, StreamLink},
    services::CatalogQuery,
};

use super::extra::{merge, parse_extra, strip_json_suffix};
use super::AppState;

// Response types

/// Movie metadata as addon clients expect it
#[derive(Debug, Serialize)]
pub struct MetaPreview {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}

impl MetaPreview {
    fn from_entry(entry: CatalogEntry, with_aliases: bool) -> Self {
        let aliases = with_aliases.then(|| vec![entry.title.clone()]);
        Self {
            id: entry.external_id,
            content_type: "movie",
            name: entry.title,
            description: entry.overview,
            aliases,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<MetaPreview>,
}

/// Serializes to `{}` when the movie is unknown
#[derive(Debug, Serialize)]
pub struct MetaResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaPreview>,
}

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamLink>,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "records": state.catalog.len(),
    }))
}

/// Addon manifest
pub async fn manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(state.manifest.as_ref().clone())
}

/// Catalog listing without path extras: `/catalog/:type/:id.json`
pub async fn catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((content_type, catalog_file)): Path<(String, String)>,
    RawQuery(raw_query): RawQuery,
) -> Json<CatalogResponse> {
    let query = parse_extra(raw_query.as_deref().unwrap_or_default());
    list_catalog(&state, &request_id, &content_type, strip_json_suffix(&catalog_file), query)
}

/// Catalog listing with path extras: `/catalog/:type/:id/:extra.json`
pub async fn catalog_with_extra(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((content_type, catalog_id, _extra)): Path<(String, String, String)>,
    RawQuery(raw_query): RawQuery,
    uri: Uri,
) -> Json<CatalogResponse> {
    // Re-read the still-encoded segment so an escaped '&' stays inside its value
    let raw_extra = uri.path().rsplit('/').next().unwrap_or_default();
    let query = merge(
        parse_extra(strip_json_suffix(raw_extra)),
        parse_extra(raw_query.as_deref().unwrap_or_default()),
    );
    list_catalog(&state, &request_id, &content_type, &catalog_id, query)
}

fn list_catalog(
    state: &AppState,
    request_id: &RequestId,
    content_type: &str,
    catalog_id: &str,
    query: CatalogQuery,
) -> Json<CatalogResponse> {
    if !state.manifest.serves_catalog(content_type, catalog_id) {
        tracing::debug!(
            request_id = %request_id,
            content_type = %content_type,
            catalog_id = %catalog_id,
            "Catalog request for unknown catalog"
        );
        return Json(CatalogResponse { metas: Vec::new() });
    }

    let metas: Vec<MetaPreview> = state
        .query_engine
        .search(&query)
        .into_iter()
        .map(|entry| MetaPreview::from_entry(entry, true))
        .collect();

    tracing::info!(
        request_id = %request_id,
        search = ?query.search,
        page = ?query.page,
        returned = metas.len(),
        "Catalog listed"
    );

    Json(CatalogResponse { metas })
}

/// Movie metadata: `/meta/:type/:id.json`
pub async fn meta(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((_content_type, meta_file)): Path<(String, String)>,
) -> Json<MetaResponse> {
    let external_id = strip_json_suffix(&meta_file);
    let meta = state
        .query_engine
        .get_metadata(external_id)
        .map(|entry| MetaPreview::from_entry(entry, false));

    if meta.is_none() {
        tracing::info!(request_id = %request_id, external_id = %external_id, "Meta not found");
    }

    Json(MetaResponse { meta })
}

/// Live stream sources: `/stream/:type/:id.json`
pub async fn streams(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((_content_type, stream_file)): Path<(String, String)>,
) -> Json<StreamsResponse> {
    let external_id = strip_json_suffix(&stream_file);

    tracing::info!(
        request_id = %request_id,
        external_id = %external_id,
        "Processing stream request"
    );

    let streams = state.verifier.get_live_streams(external_id).await;

    tracing::info!(
        request_id = %request_id,
        external_id = %external_id,
        live = streams.len(),
        "Stream request completed"
    );

    Json(StreamsResponse { streams })
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
