//! Percent change and the "big movers" batch scan.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::MarketDataGateway;
use crate::{Candle, Symbol, Timespan, Window};

/// One symbol whose move met the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub change_pct: f64,
}

/// `(last close - first open) / first open * 100`, in input order.
///
/// `None` for an empty series or a zero first open. The window does not
/// change the computation; the series already covers it.
pub fn compute_change_percent(candles: &[Candle], _window: Window) -> Option<f64> {
    let first = candles.first()?;
    let last = candles.last()?;
    if first.open == 0.0 {
        return None;
    }
    Some((last.close - first.open) / first.open * 100.0)
}

/// Keep movers with `|change| >= threshold`, largest magnitude first.
///
/// The sort is stable, so equal magnitudes keep input order.
pub fn rank_movers(changes: Vec<(Symbol, Option<f64>)>, threshold: f64) -> Vec<Mover> {
    let mut movers = changes
        .into_iter()
        .filter_map(|(symbol, change)| {
            let change_pct = change?;
            (change_pct.abs() >= threshold).then(|| Mover {
                symbol: symbol.to_string(),
                change_pct,
            })
        })
        .collect::<Vec<_>>();
    movers.sort_by(|a, b| b.change_pct.abs().total_cmp(&a.change_pct.abs()));
    movers
}

impl MarketDataGateway {
    /// Scan `symbols` and return those that moved at least `threshold`
    /// percent over `window`.
    ///
    /// Each symbol is fetched independently; a failure drops that symbol
    /// only. Blank, invalid and duplicate symbols are skipped.
    pub async fn big_movers(
        &self,
        symbols: &[String],
        timespan: Timespan,
        window: Window,
        threshold: f64,
        credential: Option<&str>,
    ) -> Vec<Mover> {
        let mut seen = HashSet::new();
        let unique = symbols
            .iter()
            .filter_map(|raw| match Symbol::parse(raw) {
                Ok(symbol) => Some(symbol),
                Err(error) => {
                    if !raw.trim().is_empty() {
                        warn!(symbol = %raw, error = %error, "skipping invalid mover symbol");
                    }
                    None
                }
            })
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect::<Vec<_>>();

        // `buffered` yields in input order regardless of completion order.
        let changes = stream::iter(unique)
            .map(|symbol| async move {
                match self.fetch_candles(&symbol, timespan, window, credential).await {
                    Ok(candles) => {
                        let change = compute_change_percent(&candles, window);
                        Some((symbol, change))
                    }
                    Err(error) => {
                        warn!(symbol = %symbol, error = %error, "dropping symbol from movers scan");
                        None
                    }
                }
            })
            .buffered(self.movers_concurrency)
            .filter_map(|outcome| async move { outcome })
            .collect::<Vec<_>>()
            .await;

        rank_movers(changes, threshold)
    }
}
