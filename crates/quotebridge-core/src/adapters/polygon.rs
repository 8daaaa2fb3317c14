use std::sync::Arc;

use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::backoff::BackoffPolicy;
use crate::http_client::{redact_url, HttpClient, HttpRequest, HttpResponse};
use crate::{Candle, SourceError, Symbol, SymbolMatch, Timespan, Window};

const POLYGON_BASE_URL: &str = "https://api.polygon.io";
const AGGREGATES_PAGE_LIMIT: u32 = 50_000;
const CANDLES_TIMEOUT_MS: u64 = 30_000;
const SEARCH_TIMEOUT_MS: u64 = 15_000;

/// Polygon client: ranged aggregates with shrink-and-retry, and ticker search.
#[derive(Clone)]
pub struct PolygonAdapter {
    http_client: Arc<dyn HttpClient>,
    policy: BackoffPolicy,
}

/// Result of walking every page of one attempt.
enum PageRun {
    Complete(Vec<Candle>),
    /// A page answered 429; everything gathered in this attempt is dropped.
    RateLimited { pages_fetched: usize },
}

impl PolygonAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, policy: BackoffPolicy) -> Self {
        Self {
            http_client,
            policy,
        }
    }

    /// Fetch ascending candles for `symbol`, shrinking the lookback while
    /// Polygon keeps rate limiting.
    pub async fn candles(
        &self,
        symbol: &Symbol,
        timespan: Timespan,
        window: Window,
        api_key: &str,
    ) -> Result<Vec<Candle>, SourceError> {
        let mut state = self.policy.start(window.polygon_days(timespan));

        loop {
            let end = OffsetDateTime::now_utc();
            let Some(start) = end.checked_sub(Duration::days(state.current_days())) else {
                return Err(SourceError::invalid_input(format!(
                    "window of {} days reaches before the earliest representable date",
                    state.current_days()
                )));
            };
            let url = aggregates_url(symbol, timespan, start.date(), end.date(), api_key);

            match self.fetch_all_pages(url, api_key).await? {
                PageRun::Complete(candles) => {
                    debug!(
                        symbol = %symbol,
                        timespan = %timespan,
                        days = state.current_days(),
                        attempts = state.attempts(),
                        count = candles.len(),
                        "polygon aggregates complete"
                    );
                    return Ok(candles);
                }
                PageRun::RateLimited { pages_fetched } => {
                    let rejected_days = state.current_days();
                    let Some(next_days) = state.on_rate_limited() else {
                        return Err(SourceError::rate_limited(format!(
                            "polygon rate limit persisted after {} attempts (last window {} days)",
                            state.attempts(),
                            rejected_days
                        )));
                    };
                    warn!(
                        symbol = %symbol,
                        rejected_days,
                        next_days,
                        discarded_pages = pages_fetched,
                        "polygon rate limited; shrinking window"
                    );
                    tokio::time::sleep(self.policy.cooldown).await;
                }
            }
        }
    }

    async fn fetch_all_pages(&self, first_url: String, api_key: &str) -> Result<PageRun, SourceError> {
        let mut candles = Vec::new();
        let mut next = Some(first_url);
        let mut pages_fetched = 0_usize;

        while let Some(url) = next.take() {
            if pages_fetched > 0 {
                tokio::time::sleep(self.policy.page_delay).await;
            }

            let response = self.get(&url, CANDLES_TIMEOUT_MS).await?;
            if response.is_rate_limited() {
                return Ok(PageRun::RateLimited { pages_fetched });
            }
            if !response.is_success() {
                return Err(SourceError::from_status("polygon", response.status));
            }

            let payload: AggregatesResponse = response.json().map_err(|e| {
                SourceError::unsupported_shape(format!("failed to parse polygon aggregates: {e}"))
            })?;
            candles.extend(payload.results.unwrap_or_default().into_iter().map(Candle::from));
            pages_fetched += 1;

            next = payload
                .next_url
                .filter(|url| !url.trim().is_empty())
                .map(|url| with_api_key(&url, api_key));
        }

        Ok(PageRun::Complete(candles))
    }

    /// Reference-ticker search. Errors are returned as-is; the caller decides
    /// whether to fall through.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        api_key: &str,
    ) -> Result<Vec<SymbolMatch>, SourceError> {
        let url = format!(
            "{POLYGON_BASE_URL}/v3/reference/tickers?search={}&active=true&limit={limit}&apiKey={}",
            urlencoding::encode(query),
            urlencoding::encode(api_key)
        );

        let response = self.get(&url, SEARCH_TIMEOUT_MS).await?;
        if !response.is_success() {
            return Err(SourceError::from_status("polygon", response.status));
        }

        let payload: TickersResponse = response.json().map_err(|e| {
            SourceError::unsupported_shape(format!("failed to parse polygon tickers: {e}"))
        })?;

        Ok(payload
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|ticker| {
                SymbolMatch::new(
                    ticker.ticker.unwrap_or_default(),
                    ticker.name.unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse, SourceError> {
        debug!(url = %redact_url(url), "polygon request");
        let request = HttpRequest::get(url).with_timeout_ms(timeout_ms);
        self.http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::upstream(format!("polygon transport error: {}", error.message())))
    }
}

/// First-page aggregates URL for the `[start, end]` date range.
pub fn aggregates_url(
    symbol: &Symbol,
    timespan: Timespan,
    start: Date,
    end: Date,
    api_key: &str,
) -> String {
    let (multiplier, unit) = timespan.polygon_range();
    format!(
        "{POLYGON_BASE_URL}/v2/aggs/ticker/{}/range/{multiplier}/{unit}/{start}/{end}\
         ?adjusted=true&sort=asc&limit={AGGREGATES_PAGE_LIMIT}&apiKey={}",
        urlencoding::encode(symbol.as_str()),
        urlencoding::encode(api_key)
    )
}

/// Continuation URLs from `next_url` carry the cursor but not the key.
pub fn with_api_key(url: &str, api_key: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}apiKey={}", urlencoding::encode(api_key))
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    results: Option<Vec<AggregateBar>>,
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: Option<f64>,
}

impl From<AggregateBar> for Candle {
    fn from(bar: AggregateBar) -> Self {
        Candle::new(bar.t, bar.o, bar.h, bar.l, bar.c, bar.v.unwrap_or(0.0))
    }
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    results: Option<Vec<TickerResult>>,
}

#[derive(Debug, Deserialize)]
struct TickerResult {
    ticker: Option<String>,
    name: Option<String>,
}
