//! Market overview snapshot for a supported IDX ticker.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data_source::{BarsRequest, DataSource, SourceError};
use crate::evaluation::round2;
use crate::forecast::format_thousands;
use crate::{BarSeries, Interval, Lookback, Symbol, UtcDateTime, ValidationError};

/// Tickers offered by the market overview.
pub const SUPPORTED_TICKERS: [&str; 10] = [
    "BBRI.JK", "BBNI.JK", "BBCA.JK", "BMRI.JK", "ASII.JK", "TLKM.JK", "UNVR.JK", "ANTM.JK",
    "PGAS.JK", "MEDC.JK",
];

/// Bars one week back when measuring the weekly change.
const WEEK_BARS: usize = 5;

/// Display range of the market overview, each mapped to a fetch window and
/// bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarketRange {
    #[default]
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "1Y")]
    OneYear,
}

impl MarketRange {
    pub const ALL: [Self; 4] = [Self::OneDay, Self::OneWeek, Self::OneMonth, Self::OneYear];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::OneYear => "1Y",
        }
    }

    pub const fn lookback(self) -> Lookback {
        match self {
            Self::OneDay => Lookback::OneDay,
            Self::OneWeek => Lookback::FiveDays,
            Self::OneMonth => Lookback::OneMonth,
            Self::OneYear => Lookback::OneYear,
        }
    }

    pub const fn interval(self) -> Interval {
        match self {
            Self::OneDay => Interval::FiveMinutes,
            Self::OneWeek => Interval::ThirtyMinutes,
            Self::OneMonth | Self::OneYear => Interval::OneDay,
        }
    }

    pub fn request(self, symbol: Symbol) -> BarsRequest {
        BarsRequest::new(symbol, self.lookback(), self.interval())
    }
}

impl Display for MarketRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(Self::OneDay),
            "1W" => Ok(Self::OneWeek),
            "1M" => Ok(Self::OneMonth),
            "1Y" => Ok(Self::OneYear),
            _ => Err(ValidationError::InvalidMarketRange {
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    pub range: MarketRange,
    pub as_of: UtcDateTime,
    pub current_price: f64,
    pub open: f64,
    pub low: f64,
    pub high: f64,
    pub volume: Option<u64>,
    pub change_pct: f64,
}

impl MarketSnapshot {
    /// Summarize a bar series. `None` when it has no bars.
    ///
    /// Change is measured against the previous bar's close, or against the
    /// close five bars back for the weekly range when that many exist.
    pub fn from_bars(series: &BarSeries, range: MarketRange) -> Option<Self> {
        let bars = &series.bars;
        let last = bars.last()?;

        let low = bars.iter().map(|bar| bar.low).fold(f64::INFINITY, f64::min);
        let high = bars.iter().map(|bar| bar.high).fold(f64::NEG_INFINITY, f64::max);

        let reference = if range == MarketRange::OneWeek && bars.len() > WEEK_BARS {
            Some(bars[bars.len() - 1 - WEEK_BARS].close)
        } else {
            bars.len()
                .checked_sub(2)
                .map(|index| bars[index].close)
        };
        let change_pct = match reference {
            Some(previous) if previous != 0.0 => (last.close - previous) / previous * 100.0,
            _ => 0.0,
        };

        Some(Self {
            symbol: series.symbol.clone(),
            range,
            as_of: last.ts,
            current_price: last.close,
            open: last.open,
            low,
            high,
            volume: last.volume,
            change_pct: round2(change_pct),
        })
    }

    pub fn formatted_volume(&self) -> String {
        self.volume
            .map_or_else(|| String::from("-"), |volume| format_volume(volume as f64))
    }
}

/// Fetch bars for `range` and summarize them.
pub async fn fetch_snapshot(
    source: &dyn DataSource,
    symbol: &Symbol,
    range: MarketRange,
) -> Result<MarketSnapshot, SourceError> {
    let series = source.bars(range.request(symbol.clone())).await?;
    debug!(%symbol, %range, bars = series.bars.len(), "market bars fetched");

    MarketSnapshot::from_bars(&series, range).ok_or_else(|| {
        SourceError::unavailable(format!("{} returned no bars for {symbol} ({range})", source.id()))
    })
}

/// Compact volume: `1.23 B`, `4.50 M`, `12.00 K`, or a plain grouped integer.
pub fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000_000.0 {
        format!("{:.2} B", volume / 1_000_000_000.0)
    } else if volume >= 1_000_000.0 {
        format!("{:.2} M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("{:.2} K", volume / 1_000.0)
    } else {
        format_thousands(volume)
    }
}

/// [`SUPPORTED_TICKERS`] as validated symbols.
pub fn supported_symbols() -> Vec<Symbol> {
    SUPPORTED_TICKERS
        .iter()
        .filter_map(|ticker| Symbol::parse(ticker).ok())
        .collect()
}
