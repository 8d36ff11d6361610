use super::state::AppState;
use crate::core::export::{self, ExportFormat};
use crate::core::map;
use crate::core::table::{self, TableRow};
use crate::core::{ConversionResult, CrsIdentifier, CrsRegistry, Marker};
use crate::utils::error::Result;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: usize = 50;
const MAX_SEARCH_LIMIT: usize = 200;

pub async fn handle_index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

pub async fn handle_health() -> impl IntoResponse {
    tracing::trace!("health check: ok");
    Json(serde_json::json!({
        "status": "healthy",
    }))
}

#[derive(Debug, Deserialize)]
pub struct CrsQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CrsOption {
    pub code: u32,
    pub name: String,
    pub label: String,
    pub geographic: bool,
}

pub async fn handle_crs_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CrsQuery>,
) -> Json<Vec<CrsOption>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let options = state
        .converter
        .registry()
        .search(&query.q, limit)
        .into_iter()
        .map(|entry| CrsOption {
            label: entry.label(),
            code: entry.code,
            name: entry.name,
            geographic: entry.geographic,
        })
        .collect();

    Json(options)
}

pub async fn handle_map_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (layers, warnings) = state.config.tile_layers();
    Json(serde_json::json!({
        "layers": layers,
        "warnings": warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        "center": [53.0, -8.0],
        "zoom": 2,
    }))
}

#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub rows: Vec<TableRow>,
}

/// 將貼上的試算表文字轉成表格列
pub async fn handle_parse_table(body: String) -> Result<Json<TableResponse>> {
    let rows = table::parse_delimited(&body)?;
    Ok(Json(TableResponse { rows }))
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub source_crs: CrsIdentifier,
    pub target_crs: CrsIdentifier,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub results: Vec<ConversionResult>,
    pub markers: Vec<Marker>,
    pub converted: usize,
    pub failed: usize,
}

fn run_conversion(state: &AppState, request: &ConvertRequest) -> Result<Vec<ConversionResult>> {
    let rows = table::parse_rows(&request.rows, &request.source_crs)?;
    state
        .converter
        .convert(&rows, &request.source_crs, &request.target_crs)
}

pub async fn handle_convert(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>> {
    let results = run_conversion(&state, &request)?;
    let markers = map::markers(
        state.converter.registry(),
        &results,
        &request.source_crs,
        &request.target_crs,
    )?;

    let converted = results.iter().filter(|r| r.is_converted()).count();
    Ok(Json(ConvertResponse {
        failed: results.len() - converted,
        converted,
        results,
        markers,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

pub async fn handle_export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<ConvertRequest>,
) -> Result<Response> {
    let results = run_conversion(&state, &request)?;
    let data = export::export(&results, query.format)?;
    let file_name = export::file_name(
        &request.source_crs,
        &request.target_crs,
        query.format,
        chrono::Utc::now(),
    );

    let mut response = data.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(query.format.content_type()),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
