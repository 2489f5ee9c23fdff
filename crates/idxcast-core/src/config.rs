//! Runtime configuration for a forecast run.
//!
//! Defaults match the layout the dashboard shipped with: a `data/`
//! directory holding `data_saham_bbri_jk*.csv` and an optional
//! `model_evaluation_result.csv`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use time::{Date, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::{Lookback, Symbol, ValidationError};

pub const ENV_DATA_DIR: &str = "IDXCAST_DATA_DIR";
pub const ENV_MODEL_NAME: &str = "IDXCAST_MODEL_NAME";
pub const ENV_LOOKBACK: &str = "IDXCAST_LOOKBACK";

/// Western Indonesia Time, the IDX trading timezone.
const WIB_OFFSET_HOURS: i8 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub data_dir: PathBuf,
    /// Lowercase file-name prefix identifying the local history cache.
    pub cache_prefix: String,
    pub metrics_file: String,
    pub lookback: Lookback,
    /// Returns required before drift/volatility are estimated at all.
    pub min_returns: usize,
    /// Trailing window of returns used for drift and volatility.
    pub return_window: usize,
    /// Band half-width as a fraction of price when volatility is zero.
    pub fallback_band: f64,
    /// Historical observations drawn on the chart.
    pub chart_window: usize,
    pub model_name: String,
    utc_offset: UtcOffset,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_prefix: String::from("data_saham_bbri_jk"),
            metrics_file: String::from("model_evaluation_result.csv"),
            lookback: Lookback::SixMonths,
            min_returns: 5,
            return_window: 20,
            fallback_band: 0.02,
            chart_window: 60,
            model_name: String::from("LightGBM"),
            utc_offset: UtcOffset::from_hms(WIB_OFFSET_HOURS, 0, 0).unwrap_or(UtcOffset::UTC),
        }
    }
}

impl ForecastConfig {
    /// Defaults overlaid with `IDXCAST_*` environment variables.
    ///
    /// An unparseable `IDXCAST_LOOKBACK` is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(name) = std::env::var(ENV_MODEL_NAME) {
            if !name.trim().is_empty() {
                config.model_name = name;
            }
        }
        if let Ok(value) = std::env::var(ENV_LOOKBACK) {
            match Lookback::from_str(&value) {
                Ok(lookback) => config.lookback = lookback,
                Err(error) => warn!(%error, "ignoring {ENV_LOOKBACK}"),
            }
        }

        config
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into().to_ascii_lowercase();
        self
    }

    /// Point the history cache at `data_saham_<ticker>` for `symbol`,
    /// e.g. `data_saham_bbca_jk` for `BBCA.JK`.
    pub fn with_symbol_cache(self, symbol: &Symbol) -> Self {
        let ticker = symbol.as_str().replace(['.', '-'], "_");
        self.with_cache_prefix(format!("data_saham_{ticker}"))
    }

    pub fn with_lookback(mut self, lookback: Lookback) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_utc_offset_hours(mut self, hours: i8) -> Result<Self, ValidationError> {
        self.utc_offset = UtcOffset::from_hms(hours, 0, 0)
            .map_err(|_| ValidationError::InvalidUtcOffset { hours })?;
        Ok(self)
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    /// Today's date on the exchange calendar.
    pub fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.utc_offset).date()
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(&self.metrics_file)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_layout() {
        let config = ForecastConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.cache_prefix, "data_saham_bbri_jk");
        assert_eq!(
            config.metrics_path(),
            PathBuf::from("data").join("model_evaluation_result.csv")
        );
        assert_eq!(config.lookback, Lookback::SixMonths);
        assert_eq!(config.return_window, 20);
        assert_eq!(config.min_returns, 5);
        assert_eq!(config.chart_window, 60);
        assert_eq!(config.model_name, "LightGBM");
        assert_eq!(config.utc_offset().whole_hours(), 7);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = ForecastConfig::default()
            .with_data_dir("/tmp/idx")
            .with_cache_prefix("DATA_SAHAM_BBCA")
            .with_lookback(Lookback::OneYear)
            .with_model_name("naive-drift")
            .with_utc_offset_hours(0)
            .expect("valid offset");

        assert_eq!(config.data_dir(), Path::new("/tmp/idx"));
        assert_eq!(config.cache_prefix, "data_saham_bbca");
        assert_eq!(config.lookback, Lookback::OneYear);
        assert_eq!(config.model_name, "naive-drift");
        assert_eq!(config.utc_offset(), UtcOffset::UTC);
    }

    #[test]
    fn cache_prefix_follows_symbol() {
        let bbca = Symbol::parse("BBCA.JK").expect("valid symbol");
        let config = ForecastConfig::default().with_symbol_cache(&bbca);
        assert_eq!(config.cache_prefix, "data_saham_bbca_jk");

        let bbri = Symbol::parse("bbri.jk").expect("valid symbol");
        let config = ForecastConfig::default().with_symbol_cache(&bbri);
        assert_eq!(config.cache_prefix, ForecastConfig::default().cache_prefix);
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = ForecastConfig::default()
            .with_utc_offset_hours(30)
            .expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidUtcOffset { hours: 30 });
    }
}
