use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use quotebridge_core::{
    Candle, FileSource, Mover, Symbol, SymbolMatch, Timespan, Window, DEFAULT_SEARCH_LIMIT,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
const DEFAULT_TIMESPAN: &str = "day";
const DEFAULT_WINDOW: &str = "5d";
const DEFAULT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub struct ReadGithubFileRequest {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadGithubFileResponse {
    pub file_name: String,
    pub size_bytes: usize,
    pub source: FileSource,
    pub content: String,
}

pub async fn read_github_file(
    State(state): State<AppState>,
    payload: Result<Json<ReadGithubFileRequest>, JsonRejection>,
) -> Result<Json<ReadGithubFileResponse>, ApiError> {
    let Json(request) = payload?;
    let file = state
        .github
        .resolve(&request.url, request.token.as_deref())
        .await?;
    Ok(Json(ReadGithubFileResponse {
        file_name: file.file_name,
        size_bytes: file.size_bytes,
        source: file.source,
        content: file.content_text,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SymbolMatch>,
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let items = state
        .gateway
        .search_symbols(
            &params.q,
            header_api_key(&headers),
            params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        )
        .await?;
    Ok(Json(SearchResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct CandlesParams {
    pub symbol: String,
    pub timespan: Option<String>,
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandlesResponse {
    pub symbol: Symbol,
    pub timespan: Timespan,
    pub window: String,
    pub candles: Vec<Candle>,
}

pub async fn candles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CandlesParams>,
) -> Result<Json<CandlesResponse>, ApiError> {
    let symbol = Symbol::parse(&params.symbol)?;
    let timespan: Timespan = params
        .timespan
        .as_deref()
        .unwrap_or(DEFAULT_TIMESPAN)
        .parse()?;
    let window: Window = params.window.as_deref().unwrap_or(DEFAULT_WINDOW).parse()?;

    let candles = state
        .gateway
        .fetch_candles(&symbol, timespan, window, header_api_key(&headers))
        .await?;
    Ok(Json(CandlesResponse {
        symbol,
        timespan,
        window: window.to_string(),
        candles,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BigMoversRequest {
    pub symbols: Vec<String>,
    pub window: Option<String>,
    pub timespan: Option<String>,
    pub threshold: Option<f64>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BigMoversResponse {
    pub movers: Vec<Mover>,
}

pub async fn big_movers(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BigMoversRequest>, JsonRejection>,
) -> Result<Json<BigMoversResponse>, ApiError> {
    let Json(request) = payload?;
    let timespan: Timespan = request
        .timespan
        .as_deref()
        .unwrap_or(DEFAULT_TIMESPAN)
        .parse()?;
    let window: Window = request.window.as_deref().unwrap_or(DEFAULT_WINDOW).parse()?;
    let credential = request
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| header_api_key(&headers));

    let movers = state
        .gateway
        .big_movers(
            &request.symbols,
            timespan,
            window,
            request.threshold.unwrap_or(DEFAULT_THRESHOLD),
            credential,
        )
        .await;
    Ok(Json(BigMoversResponse { movers }))
}

fn header_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
