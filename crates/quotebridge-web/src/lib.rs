//! HTTP surface for quotebridge.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/health` | [`handlers::health`] |
//! | `POST /api/read-github-file` | [`handlers::read_github_file`] |
//! | `GET /api/search` | [`handlers::search`] |
//! | `GET /api/candles` | [`handlers::candles`] |
//! | `POST /api/bigmovers` | [`handlers::big_movers`] |
//!
//! A static frontend directory is served at `/` when it exists.

pub mod config;
pub mod error;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use quotebridge_core::{GithubFileResolver, HttpClient, MarketDataGateway, ReqwestHttpClient};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Cli;

pub use error::{ApiError, ServerError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<MarketDataGateway>,
    pub github: Arc<GithubFileResolver>,
}

impl AppState {
    pub fn new(gateway: MarketDataGateway, github: GithubFileResolver) -> Self {
        Self {
            gateway: Arc::new(gateway),
            github: Arc::new(github),
        }
    }

    /// State backed by one pooled reqwest transport.
    pub fn from_cli(cli: &Cli) -> Self {
        let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
        Self::new(
            MarketDataGateway::new(Arc::clone(&http_client), cli.gateway_config()),
            GithubFileResolver::new(http_client, cli.github_credentials()),
        )
    }
}

pub fn router(state: AppState, frontend_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/read-github-file", post(handlers::read_github_file))
        .route("/api/search", get(handlers::search))
        .route("/api/candles", get(handlers::candles))
        .route("/api/bigmovers", post(handlers::big_movers))
        .with_state(state);

    let app = match frontend_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            info!(dir = %dir.display(), "serving static frontend");
            api.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => api,
    };

    app.layer(cors)
}

/// Bind `cli.bind` and serve until the process is stopped.
pub async fn serve(cli: Cli) -> Result<(), ServerError> {
    let state = AppState::from_cli(&cli);
    let app = router(state, Some(&cli.frontend_dir));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: cli.bind,
            source,
        })?;
    info!(addr = %cli.bind, "quotebridge listening");
    axum::serve(listener, app).await?;
    Ok(())
}
