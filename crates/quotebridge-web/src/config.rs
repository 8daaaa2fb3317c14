//! Server configuration from command-line flags and environment variables.
//!
//! | Flag | Env | Default |
//! |------|-----|---------|
//! | `--bind` | `QUOTEBRIDGE_BIND` | `0.0.0.0:8000` |
//! | `--frontend-dir` | `QUOTEBRIDGE_FRONTEND_DIR` | `frontend` |
//! | `--polygon-key-env` | - | `POLYGON_API_KEY` |
//! | `--github-token-env` | - | `GITHUB_TOKEN` |
//! | `--cooldown-ms` | `QUOTEBRIDGE_COOLDOWN_MS` | `12000` |
//! | `--page-delay-ms` | `QUOTEBRIDGE_PAGE_DELAY_MS` | `250` |
//! | `--max-shrinks` | `QUOTEBRIDGE_MAX_SHRINKS` | `3` |
//! | `--movers-concurrency` | `QUOTEBRIDGE_MOVERS_CONCURRENCY` | `4` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quotebridge_core::{
    BackoffPolicy, CredentialSource, GatewayConfig, GITHUB_TOKEN_ENV, POLYGON_API_KEY_ENV,
};

/// Market-data and GitHub file reader HTTP API.
#[derive(Debug, Clone, Parser)]
#[command(name = "quotebridge", author, version, about)]
pub struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "QUOTEBRIDGE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory served at `/` when it exists.
    #[arg(long, env = "QUOTEBRIDGE_FRONTEND_DIR", default_value = "frontend")]
    pub frontend_dir: PathBuf,

    /// Environment variable holding the default Polygon key.
    #[arg(long, default_value = POLYGON_API_KEY_ENV)]
    pub polygon_key_env: String,

    /// Environment variable holding the default GitHub token.
    #[arg(long, default_value = GITHUB_TOKEN_ENV)]
    pub github_token_env: String,

    /// Wait before retrying a rate-limited Polygon request with a smaller window.
    #[arg(long, env = "QUOTEBRIDGE_COOLDOWN_MS", default_value_t = 12_000)]
    pub cooldown_ms: u64,

    /// Wait between Polygon continuation pages.
    #[arg(long, env = "QUOTEBRIDGE_PAGE_DELAY_MS", default_value_t = 250)]
    pub page_delay_ms: u64,

    /// Window shrinks allowed after the first rate-limited attempt.
    #[arg(long, env = "QUOTEBRIDGE_MAX_SHRINKS", default_value_t = 3)]
    pub max_shrinks: u32,

    /// Symbols fetched concurrently by the big-movers scan.
    #[arg(long, env = "QUOTEBRIDGE_MOVERS_CONCURRENCY", default_value_t = 4)]
    pub movers_concurrency: usize,
}

impl Cli {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            credentials: CredentialSource::env(&self.polygon_key_env),
            backoff: BackoffPolicy {
                max_shrinks: self.max_shrinks,
                cooldown: Duration::from_millis(self.cooldown_ms),
                page_delay: Duration::from_millis(self.page_delay_ms),
            },
            movers_concurrency: self.movers_concurrency,
        }
    }

    pub fn github_credentials(&self) -> CredentialSource {
        CredentialSource::env(&self.github_token_env)
    }
}
