//! Data source trait and request/response types.
//!
//! A [`DataSource`] hands back OHLCV bars for a symbol over a lookback
//! window. The forecast loader asks for daily bars; the market snapshot asks
//! for intraday ones.
//!
//! # Example
//!
//! ```rust,ignore
//! use idxcast_core::{BarsRequest, DataSource, Interval, Lookback, Symbol, YahooAdapter};
//!
//! async fn last_close(adapter: &YahooAdapter) -> Option<f64> {
//!     let symbol = Symbol::parse("BBRI.JK").ok()?;
//!     let request = BarsRequest::daily(symbol, Lookback::SixMonths);
//!     let series = adapter.bars(request).await.ok()?;
//!     series.bars.last().map(|bar| bar.close)
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{BarSeries, Interval, Lookback, ProviderId, Symbol};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for bar endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: Symbol,
    pub lookback: Lookback,
    pub interval: Interval,
}

impl BarsRequest {
    pub fn new(symbol: Symbol, lookback: Lookback, interval: Interval) -> Self {
        Self {
            symbol,
            lookback,
            interval,
        }
    }

    /// Daily bars over `lookback`, the shape the forecast loader needs.
    pub fn daily(symbol: Symbol, lookback: Lookback) -> Self {
        Self::new(symbol, lookback, Interval::OneDay)
    }
}

/// Source adapter contract.
pub trait DataSource: Send + Sync {
    /// Returns the provider identifier recorded in result metadata.
    fn id(&self) -> ProviderId;

    /// Fetches OHLCV bars, ascending by timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the provider is unreachable, rate limits
    /// the call, or answers with a payload that cannot be normalized.
    fn bars<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>>;
}
