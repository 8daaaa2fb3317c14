//! # Quotebridge Core
//!
//! Read-through adapters behind the quotebridge HTTP API.
//!
//! ## Overview
//!
//! - **Market data**: OHLCV candles and symbol search from Polygon when a key
//!   is available, Yahoo Finance otherwise, with a shrink-and-retry loop for
//!   Polygon rate limits
//! - **Big movers**: batch percent-change scan that tolerates per-symbol failures
//! - **GitHub files**: raw or contents-API fetch with text decoding
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Polygon and Yahoo clients |
//! | [`backoff`] | Shrink-and-retry policy |
//! | [`credentials`] | Per-request / environment credential resolution |
//! | [`domain`] | Candle, Timespan, Window, Symbol |
//! | [`error`] | Error types |
//! | [`gateway`] | Provider selection for candles and search |
//! | [`github`] | GitHub file resolver |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`movers`] | Percent change and big-movers scan |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌────────────────────┐
//! │ MarketDataGateway│        │ GithubFileResolver │
//! └───┬──────────┬───┘        └─────────┬──────────┘
//!     │          │                      │
//!     ▼          ▼                      │
//! ┌────────┐ ┌───────┐                  │
//! │Polygon │ │ Yahoo │                  │
//! └───┬────┘ └───┬───┘                  │
//!     └──────────┴──────────┬───────────┘
//!                           ▼
//!                 ┌──────────────────┐
//!                 │ HttpClient       │
//!                 │ (reqwest/tests)  │
//!                 └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - Credentials are passed through, never stored; Polygon keys are redacted
//!   from logged URLs

pub mod adapters;
pub mod backoff;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod github;
pub mod http_client;
pub mod movers;

pub use adapters::{PolygonAdapter, ProviderId, YahooAdapter};
pub use backoff::{BackoffPolicy, ShrinkState};
pub use credentials::CredentialSource;
pub use domain::{Candle, Symbol, SymbolMatch, Timespan, Window, WindowUnit, MAX_WINDOW_DAYS};
pub use error::{SourceError, SourceErrorKind, ValidationError};
pub use gateway::{
    candle_route, search_route, CandleRoute, GatewayConfig, MarketDataGateway, SearchRoute,
    DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, POLYGON_API_KEY_ENV,
};
pub use github::{FileSource, GithubFile, GithubFileResolver, GITHUB_TOKEN_ENV};
pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use movers::{compute_change_percent, Mover};
