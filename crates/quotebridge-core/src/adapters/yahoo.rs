use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, BROWSER_USER_AGENT};
use crate::{Candle, SourceError, Symbol, SymbolMatch, Timespan, Window};

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUGGEST_URL: &str = "https://autoc.finance.yahoo.com/autoc";
const CHART_TIMEOUT_MS: u64 = 30_000;
const SUGGEST_TIMEOUT_MS: u64 = 15_000;

/// Yahoo Finance client. Unauthenticated; no retry loop.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    pub async fn candles(
        &self,
        symbol: &Symbol,
        timespan: Timespan,
        window: Window,
    ) -> Result<Vec<Candle>, SourceError> {
        let url = chart_url(symbol, timespan, window);
        let response = self.get(&url, CHART_TIMEOUT_MS).await?;
        if !response.is_success() {
            return Err(SourceError::from_status("yahoo", response.status));
        }

        let payload: ChartResponse = response
            .json()
            .map_err(|e| SourceError::unsupported_shape(format!("failed to parse yahoo chart: {e}")))?;
        let candles = normalize_chart(payload)?;
        debug!(symbol = %symbol, timespan = %timespan, count = candles.len(), "yahoo chart complete");
        Ok(candles)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, SourceError> {
        let url = format!(
            "{SUGGEST_URL}?query={}&region=1&lang=en",
            urlencoding::encode(query)
        );
        let response = self.get(&url, SUGGEST_TIMEOUT_MS).await?;
        if !response.is_success() {
            return Err(SourceError::from_status("yahoo", response.status));
        }

        let payload: SuggestResponse = response
            .json()
            .map_err(|e| SourceError::unsupported_shape(format!("failed to parse yahoo suggest: {e}")))?;

        Ok(payload
            .result_set
            .and_then(|set| set.result)
            .unwrap_or_default()
            .into_iter()
            .map(|item| SymbolMatch::new(item.symbol.unwrap_or_default(), item.name.unwrap_or_default()))
            .collect())
    }

    async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse, SourceError> {
        debug!(url, "yahoo request");
        // Yahoo blocks requests that do not look like they come from a browser.
        let request = HttpRequest::get(url)
            .with_header("user-agent", BROWSER_USER_AGENT)
            .with_timeout_ms(timeout_ms);
        self.http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::upstream(format!("yahoo transport error: {}", error.message())))
    }
}

pub fn chart_url(symbol: &Symbol, timespan: Timespan, window: Window) -> String {
    format!(
        "{CHART_BASE_URL}/{}?interval={}&range={}",
        urlencoding::encode(symbol.as_str()),
        timespan.yahoo_interval(),
        window.yahoo_range()
    )
}

/// Zip the parallel chart arrays into candles, dropping rows with any
/// missing price. Yahoo timestamps are seconds.
fn normalize_chart(payload: ChartResponse) -> Result<Vec<Candle>, SourceError> {
    let chart = payload.chart.unwrap_or_default();
    let Some(result) = chart.result.and_then(|results| results.into_iter().next()) else {
        let detail = chart
            .error
            .and_then(|error| error.description)
            .map(|description| format!(": {description}"))
            .unwrap_or_default();
        return Err(SourceError::unsupported_shape(format!(
            "no chart data from yahoo{detail}"
        )));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .and_then(|indicators| indicators.quote)
        .and_then(|quotes| quotes.into_iter().next())
        .unwrap_or_default();

    let rows = timestamps
        .len()
        .min(quote.open.len())
        .min(quote.high.len())
        .min(quote.low.len())
        .min(quote.close.len());

    let candles = (0..rows)
        .filter_map(|i| {
            let open = quote.open[i]?;
            let high = quote.high[i]?;
            let low = quote.low[i]?;
            let close = quote.close[i]?;
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
            Some(Candle::new(timestamps[i] * 1000, open, high, low, close, volume))
        })
        .collect();

    Ok(candles)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Option<Chart>,
}

#[derive(Debug, Default, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Option<Vec<QuoteSeries>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(rename = "ResultSet")]
    result_set: Option<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(rename = "Result")]
    result: Option<Vec<SuggestItem>>,
}

#[derive(Debug, Deserialize)]
struct SuggestItem {
    symbol: Option<String>,
    name: Option<String>,
}
