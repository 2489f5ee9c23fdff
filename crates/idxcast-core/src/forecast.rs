//! Result assembly: load, estimate, project, evaluate, package.

use std::io;
use std::sync::Arc;

use serde::Serialize;
use time::Date;
use tracing::info;

use crate::chart::PriceChart;
use crate::config::ForecastConfig;
use crate::data_source::DataSource;
use crate::error::CoreError;
use crate::evaluation::{round2, MetricsOverride, ModelEvaluation, OverrideOutcome};
use crate::loader::{load_history, LoadOutcome};
use crate::projector::{project_path_with_band, ProjectedPoint};
use crate::stats::ReturnStatistics;
use crate::{format_calendar_date, HistoricalSeries, ProviderId, Symbol};

/// Header row of the downloadable forecast CSV.
pub const CSV_HEADER: [&str; 4] = ["Date", "Forecasted", "Lower Bound", "Upper Bound"];

/// Freshness stamp of a result with no data.
pub const NO_DATA_STAMP: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayOverview {
    pub last_close: f64,
    /// Percent change against the previous close.
    pub change_pct: f64,
    /// Thousands-separated integer, or `-` when unknown.
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub horizon_days: u32,
    pub end_price: f64,
    /// Drift as a percentage.
    pub avg_daily_change: f64,
}

/// Everything a presentation layer needs for one forecast.
///
/// A result with an empty `forecast` and every optional part `None` is the
/// "nothing to show" state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub forecast: Vec<ProjectedPoint>,
    pub today_overview: Option<TodayOverview>,
    pub forecast_summary: Option<ForecastSummary>,
    pub model_eval: Option<ModelEvaluation>,
    pub price_chart: Option<PriceChart>,
    pub last_updated: String,
    pub model_name: String,
    /// Where the history came from.
    pub origin: Option<ProviderId>,
}

impl ForecastResult {
    pub fn empty(model_name: impl Into<String>) -> Self {
        Self {
            forecast: Vec::new(),
            today_overview: None,
            forecast_summary: None,
            model_eval: None,
            price_chart: None,
            last_updated: String::from(NO_DATA_STAMP),
            model_name: model_name.into(),
            origin: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forecast.is_empty() && self.today_overview.is_none()
    }

    /// Write the projected path as CSV. The header is written even when the
    /// path is empty.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), CoreError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        for point in &self.forecast {
            writer.write_record([
                format_calendar_date(point.date),
                point.forecasted.to_string(),
                point.lower_bound.to_string(),
                point.upper_bound.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, CoreError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| CoreError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// A result plus the notes collected while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastReport {
    pub result: ForecastResult,
    pub warnings: Vec<String>,
}

/// Runs the forecast pipeline against a history source.
#[derive(Clone)]
pub struct ForecastEngine {
    config: ForecastConfig,
    source: Arc<dyn DataSource>,
    today: Option<Date>,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig, source: Arc<dyn DataSource>) -> Self {
        Self {
            config,
            source,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub async fn run(&self, symbol: &Symbol, horizon: u32) -> ForecastResult {
        self.report(symbol, horizon).await.result
    }

    /// Run the pipeline and keep the fallback notes.
    pub async fn report(&self, symbol: &Symbol, horizon: u32) -> ForecastReport {
        let outcome = load_history(&self.config, self.source.as_ref(), symbol).await;
        let mut warnings = outcome.warnings();
        let origin = outcome.origin();

        let series = match outcome {
            LoadOutcome::Cached { series, .. } | LoadOutcome::Fetched { series, .. } => series,
            LoadOutcome::Missing { .. } => {
                info!(%symbol, "no history available, returning empty forecast");
                return ForecastReport {
                    result: ForecastResult::empty(self.config.model_name.clone()),
                    warnings,
                };
            }
        };

        let metrics = match MetricsOverride::load(&self.config.metrics_path()) {
            OverrideOutcome::Applied(metrics) => Some(metrics),
            OverrideOutcome::Absent => None,
            OverrideOutcome::Malformed(error) => {
                warnings.push(format!("metrics override ignored: {error}"));
                None
            }
        };

        let today = self.today.unwrap_or_else(|| self.config.today());
        let mut result = assemble(&self.config, &series, horizon, today, metrics.as_ref());
        result.origin = origin;

        info!(
            %symbol,
            horizon,
            observations = series.len(),
            "forecast assembled"
        );
        ForecastReport { result, warnings }
    }
}

/// Build a result from a loaded series. Returns the empty result for an
/// empty series.
pub fn assemble(
    config: &ForecastConfig,
    series: &HistoricalSeries,
    horizon: u32,
    today: Date,
    metrics: Option<&MetricsOverride>,
) -> ForecastResult {
    let Some(last) = series.last() else {
        return ForecastResult::empty(config.model_name.clone());
    };

    let previous_close = series.previous().map_or(last.close, |previous| previous.close);
    let change_pct = if previous_close != 0.0 {
        (last.close - previous_close) / previous_close * 100.0
    } else {
        0.0
    };
    let today_overview = TodayOverview {
        last_close: round2(last.close),
        change_pct: round2(change_pct),
        volume: last
            .volume
            .map_or_else(|| String::from("-"), format_thousands),
    };

    let closes = series.closes();
    let stats = ReturnStatistics::estimate_with(&closes, config.min_returns, config.return_window);
    let forecast = project_path_with_band(last.close, &stats, horizon, today, config.fallback_band);

    let end_price = forecast.last().map_or(last.close, |point| point.forecasted);
    let forecast_summary = ForecastSummary {
        horizon_days: horizon,
        end_price: round2(end_price),
        avg_daily_change: round2(stats.drift * 100.0),
    };

    let computed = ModelEvaluation::naive_persistence(&closes);
    let model_eval = metrics
        .map_or(computed, |metrics| computed.apply(metrics))
        .rounded();

    let price_chart = PriceChart::build(series.tail(config.chart_window), &forecast);

    ForecastResult {
        forecast,
        today_overview: Some(today_overview),
        forecast_summary: Some(forecast_summary),
        model_eval: Some(model_eval),
        price_chart,
        last_updated: format_calendar_date(today),
        model_name: config.model_name.clone(),
        origin: None,
    }
}

/// Rounded to a whole number with `,` between thousands: `1,234,567`.
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let digits = rounded.as_bytes();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value.is_sign_negative() && rounded != "0" {
        grouped.push('-');
    }
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(*digit));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Observation;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 29);

    fn series(closes: &[f64], last_volume: Option<f64>) -> HistoricalSeries {
        let mut day = date!(2024 - 01 - 01);
        let mut observations = Vec::new();
        for (index, close) in closes.iter().enumerate() {
            let volume = if index + 1 == closes.len() { last_volume } else { None };
            observations.push(Observation::new(day, *close, volume).expect("valid"));
            day = day.next_day().expect("in range");
        }
        HistoricalSeries::new(crate::Symbol::parse("BBRI.JK").expect("valid"), observations)
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1_000.0), "1,000");
        assert_eq!(format_thousands(1_234_567.0), "1,234,567");
        assert_eq!(format_thousands(-12_345.0), "-12,345");
    }

    #[test]
    fn overview_reports_change_and_volume() {
        let result = assemble(
            &ForecastConfig::default(),
            &series(&[5000.0, 5100.0], Some(123_456_789.0)),
            7,
            TODAY,
            None,
        );

        let overview = result.today_overview.expect("overview");
        assert_eq!(overview.last_close, 5100.0);
        assert_eq!(overview.change_pct, 2.0);
        assert_eq!(overview.volume, "123,456,789");
    }

    #[test]
    fn single_observation_degrades_to_defaults() {
        let result = assemble(
            &ForecastConfig::default(),
            &series(&[4800.0], None),
            7,
            TODAY,
            None,
        );

        let overview = result.today_overview.expect("overview");
        assert_eq!(overview.change_pct, 0.0);
        assert_eq!(overview.volume, "-");
        assert_eq!(result.model_eval, Some(ModelEvaluation::default()));
        assert_eq!(result.forecast.len(), 7);
        for point in &result.forecast {
            assert_eq!(point.forecasted, 4800.0);
            assert!((point.upper_bound - 4896.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_horizon_keeps_last_close_as_end_price() {
        let result = assemble(
            &ForecastConfig::default(),
            &series(&[100.0, 101.0], None),
            0,
            TODAY,
            None,
        );

        assert!(result.forecast.is_empty());
        assert!(!result.is_empty());
        let summary = result.forecast_summary.expect("summary");
        assert_eq!(summary.horizon_days, 0);
        assert_eq!(summary.end_price, 101.0);
    }

    #[test]
    fn stamps_today_and_model_label() {
        let config = ForecastConfig::default().with_model_name("naive-drift");
        let result = assemble(&config, &series(&[100.0, 101.0], None), 1, TODAY, None);

        assert_eq!(result.last_updated, "2024-03-29");
        assert_eq!(result.model_name, "naive-drift");
        assert_eq!(result.forecast[0].date, date!(2024 - 03 - 30));
    }

    #[test]
    fn chart_uses_trailing_window() {
        let closes = (0..100).map(|i| 100.0 + f64::from(i)).collect::<Vec<_>>();
        let result = assemble(&ForecastConfig::default(), &series(&closes, None), 0, TODAY, None);

        let chart = result.price_chart.expect("chart");
        // 59 segments + last-point marker
        assert_eq!(chart.data.len(), 60);
        assert_eq!(chart.data[0].y, vec![140.0, 141.0]);
    }

    #[test]
    fn empty_result_shape() {
        let result = ForecastResult::empty("LightGBM");

        assert!(result.is_empty());
        assert_eq!(result.last_updated, "-");
        assert_eq!(result.model_name, "LightGBM");
        let json = serde_json::to_value(&result).expect("serializes");
        assert_eq!(json["price_chart"], serde_json::Value::Null);
        assert_eq!(json["forecast"], serde_json::json!([]));
    }

    #[test]
    fn csv_has_header_and_one_row_per_point() {
        let result = assemble(
            &ForecastConfig::default(),
            &series(&[100.0, 100.0], None),
            2,
            TODAY,
            None,
        );

        let csv = result.to_csv_string().expect("csv");
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Date,Forecasted,Lower Bound,Upper Bound");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2024-03-30,100,98,102");

        let empty = ForecastResult::empty("LightGBM").to_csv_string().expect("csv");
        assert_eq!(empty, "Date,Forecasted,Lower Bound,Upper Bound\n");
    }
}
