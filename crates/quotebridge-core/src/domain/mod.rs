//! # Domain Models
//!
//! Request-scoped value types shared by the market-data gateway.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Candle`] | OHLCV bar with a millisecond timestamp |
//! | [`Timespan`] | Bucket width (1m, 5m, 15m, 1h, day, month) |
//! | [`Window`] | Relative lookback (`5d`, `2w`, `3m`, `1y`, `max`) |
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`SymbolMatch`] | Search hit |
//!
//! Nothing here outlives a single request.

mod candle;
mod symbol;
mod timespan;
mod window;

pub use candle::Candle;
pub use symbol::{Symbol, SymbolMatch};
pub use timespan::Timespan;
pub use window::{Window, WindowUnit, MAX_WINDOW_DAYS};
