use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, UtcOffset};

use crate::{Interval, Symbol, UtcDateTime, ValidationError};

/// OHLCV bar record for a given interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Bar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Series wrapper returned by the bars endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: Symbol, interval: Interval, bars: Vec<Bar>) -> Self {
        Self {
            symbol,
            interval,
            bars,
        }
    }
}

/// One daily closing observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Observation {
    pub fn new(date: Date, close: f64, volume: Option<f64>) -> Result<Self, ValidationError> {
        validate_non_negative("close", close)?;
        validate_optional_non_negative("volume", volume)?;

        Ok(Self {
            date,
            close,
            volume,
        })
    }
}

/// Daily closes for one symbol, ascending by date.
///
/// Duplicate dates are kept; sources are assumed clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub symbol: Symbol,
    observations: Vec<Observation>,
}

impl HistoricalSeries {
    pub fn new(symbol: Symbol, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|observation| observation.date);
        Self {
            symbol,
            observations,
        }
    }

    /// Daily bars collapsed to closes, dated on the exchange's calendar.
    pub fn from_bars(series: &BarSeries, offset: UtcOffset) -> Self {
        let observations = series
            .bars
            .iter()
            .map(|bar| Observation {
                date: bar.ts.exchange_date(offset),
                close: bar.close,
                volume: bar.volume.map(|volume| volume as f64),
            })
            .collect();
        Self::new(series.symbol.clone(), observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// The observation before the last one, if any.
    pub fn previous(&self) -> Option<&Observation> {
        self.observations
            .len()
            .checked_sub(2)
            .and_then(|index| self.observations.get(index))
    }

    /// Up to `count` most recent observations.
    pub fn tail(&self, count: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(count);
        &self.observations[start..]
    }
}

/// Parse the leading `YYYY-MM-DD` of a cell, ignoring any time component
/// (`2024-01-02`, `2024-01-02 00:00:00+07:00`, `2024-01-02T00:00:00Z`).
pub fn parse_calendar_date(input: &str) -> Result<Date, ValidationError> {
    let trimmed = input.trim().trim_matches('"');
    let invalid = || ValidationError::InvalidDate {
        value: input.to_owned(),
    };

    let (head, rest) = match (trimmed.get(..10), trimmed.get(10..)) {
        (Some(head), Some(rest)) => (head, rest),
        _ => return Err(invalid()),
    };
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return Err(invalid());
    }

    Date::parse(head, format_description!("[year]-[month]-[day]")).map_err(|_| invalid())
}

/// Render a date as `YYYY-MM-DD`.
pub fn format_calendar_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Serde adapter storing a [`Date`] as `YYYY-MM-DD`.
pub mod calendar_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_calendar_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_calendar_date(&value).map_err(D::Error::custom)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}
