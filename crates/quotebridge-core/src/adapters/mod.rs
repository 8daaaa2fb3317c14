//! Upstream market-data clients.

use std::fmt;

pub mod polygon;
pub mod yahoo;

pub use polygon::PolygonAdapter;
pub use yahoo::YahooAdapter;

/// Upstream a market-data request was served by; used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    Polygon,
    Yahoo,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Polygon => "polygon",
            Self::Yahoo => "yahoo",
        })
    }
}
