//! # Domain Models
//!
//! Canonical domain types for idxcast.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bar`] | OHLCV bar with timestamp |
//! | [`BarSeries`] | Collection of bars for a symbol/interval |
//! | [`Observation`] | One daily close (date, close, optional volume) |
//! | [`HistoricalSeries`] | Ascending daily closes for one symbol |
//! | [`Symbol`] | Validated exchange-qualified ticker |
//! | [`Interval`] | Bar interval (5m, 30m, 1d) |
//! | [`Lookback`] | History range (1d .. 1y) |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! ## Validation
//!
//! Prices and volumes must be finite and non-negative:
//!
//! ```rust,ignore
//! use idxcast_core::{Observation, ValidationError};
//! use time::macros::date;
//!
//! let ok = Observation::new(date!(2024 - 01 - 02), 4_850.0, Some(1.2e8))?;
//! let bad = Observation::new(date!(2024 - 01 - 02), f64::NAN, None);
//! assert!(matches!(bad, Err(ValidationError::NonFiniteValue { .. })));
//! ```

mod interval;
mod models;
mod symbol;
mod timestamp;

pub use interval::{Interval, Lookback};
pub use models::{
    calendar_date, format_calendar_date, parse_calendar_date, Bar, BarSeries, HistoricalSeries, Observation,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
