//! Market-data gateway: provider selection for candles and search.
//!
//! Candles and search use two different selection policies:
//!
//! | Operation | Credential resolves | No credential |
//! |-----------|--------------------|---------------|
//! | candles | Polygon only; errors propagate | Yahoo |
//! | search | Polygon, any error falls through to Yahoo | Yahoo |
//!
//! With a credential, a failed candle request is never answered from Yahoo.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{PolygonAdapter, YahooAdapter};
use crate::backoff::BackoffPolicy;
use crate::credentials::CredentialSource;
use crate::http_client::HttpClient;
use crate::{Candle, ProviderId, SourceError, Symbol, SymbolMatch, Timespan, ValidationError, Window};

/// Default environment variable holding the Polygon key.
pub const POLYGON_API_KEY_ENV: &str = "POLYGON_API_KEY";
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Gateway configuration, injected once at start-up.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: CredentialSource,
    pub backoff: BackoffPolicy,
    /// Symbols fetched concurrently by the big-movers scan.
    pub movers_concurrency: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            credentials: CredentialSource::env(POLYGON_API_KEY_ENV),
            backoff: BackoffPolicy::default(),
            movers_concurrency: 4,
        }
    }
}

/// Where a candle request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandleRoute {
    Polygon { api_key: String },
    Yahoo,
}

/// Candle policy: a resolved key pins the request to Polygon.
pub fn candle_route(api_key: Option<String>) -> CandleRoute {
    match api_key {
        Some(api_key) => CandleRoute::Polygon { api_key },
        None => CandleRoute::Yahoo,
    }
}

/// Where a search request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRoute {
    PolygonThenYahoo { api_key: String },
    Yahoo,
}

/// Search policy: Polygon first when a key resolves, Yahoo always last.
pub fn search_route(api_key: Option<String>) -> SearchRoute {
    match api_key {
        Some(api_key) => SearchRoute::PolygonThenYahoo { api_key },
        None => SearchRoute::Yahoo,
    }
}

/// Read-through gateway over Polygon and Yahoo.
#[derive(Clone)]
pub struct MarketDataGateway {
    polygon: PolygonAdapter,
    yahoo: YahooAdapter,
    credentials: CredentialSource,
    pub(crate) movers_concurrency: usize,
}

impl MarketDataGateway {
    pub fn new(http_client: Arc<dyn HttpClient>, config: GatewayConfig) -> Self {
        Self {
            polygon: PolygonAdapter::new(Arc::clone(&http_client), config.backoff),
            yahoo: YahooAdapter::new(http_client),
            credentials: config.credentials,
            movers_concurrency: config.movers_concurrency.max(1),
        }
    }

    pub(crate) fn resolve_key(&self, credential: Option<&str>) -> Option<String> {
        self.credentials.resolve(credential)
    }

    /// Ascending candles for `symbol` over `window`.
    pub async fn fetch_candles(
        &self,
        symbol: &Symbol,
        timespan: Timespan,
        window: Window,
        credential: Option<&str>,
    ) -> Result<Vec<Candle>, SourceError> {
        match candle_route(self.resolve_key(credential)) {
            CandleRoute::Polygon { api_key } => {
                debug!(symbol = %symbol, provider = %ProviderId::Polygon, "fetching candles");
                self.polygon.candles(symbol, timespan, window, &api_key).await
            }
            CandleRoute::Yahoo => {
                debug!(symbol = %symbol, provider = %ProviderId::Yahoo, "fetching candles");
                self.yahoo.candles(symbol, timespan, window).await
            }
        }
    }

    /// Symbol search, at most `limit` non-empty matches; `limit` is capped at
    /// [`MAX_SEARCH_LIMIT`].
    pub async fn search_symbols(
        &self,
        query: &str,
        credential: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SymbolMatch>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        if limit == 0 {
            return Err(ValidationError::InvalidLimit.into());
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);

        let matches = match search_route(self.resolve_key(credential)) {
            SearchRoute::PolygonThenYahoo { api_key } => {
                match self.polygon.search(query, limit, &api_key).await {
                    Ok(matches) => matches,
                    Err(error) => {
                        warn!(query, error = %error, "polygon search failed; falling back to yahoo");
                        self.yahoo.search(query).await?
                    }
                }
            }
            SearchRoute::Yahoo => self.yahoo.search(query).await?,
        };

        Ok(matches
            .into_iter()
            .filter(|item| !item.symbol.trim().is_empty())
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_route_never_downgrades_with_key() {
        assert_eq!(
            candle_route(Some(String::from("k"))),
            CandleRoute::Polygon {
                api_key: String::from("k")
            }
        );
        assert_eq!(candle_route(None), CandleRoute::Yahoo);
    }

    #[test]
    fn search_route_keeps_yahoo_as_last_resort() {
        assert_eq!(
            search_route(Some(String::from("k"))),
            SearchRoute::PolygonThenYahoo {
                api_key: String::from("k")
            }
        );
        assert_eq!(search_route(None), SearchRoute::Yahoo);
    }

    #[test]
    fn default_config_reads_polygon_env_var() {
        let config = GatewayConfig::default();
        assert_eq!(config.credentials, CredentialSource::env(POLYGON_API_KEY_ENV));
        assert_eq!(config.movers_concurrency, 4);
    }
}
