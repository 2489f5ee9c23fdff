//! Core contracts for idxcast.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The history loader (local CSV cache, then a live fetch)
//! - Return statistics, path projection and naive error metrics
//! - Result assembly, the chart artifact and the forecast CSV
//! - Data source traits, the Yahoo adapter and the HTTP transport seam
//! - Market snapshots and the response envelope

pub mod adapters;
pub mod cache;
pub mod chart;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod evaluation;
pub mod forecast;
pub mod http_client;
pub mod loader;
pub mod market;
pub mod projector;
pub mod source;
pub mod stats;

pub use adapters::YahooAdapter;
pub use cache::ForecastCache;
pub use chart::PriceChart;
pub use config::ForecastConfig;
pub use data_source::{BarsRequest, DataSource, SourceError, SourceErrorKind};
pub use domain::{
    calendar_date, format_calendar_date, parse_calendar_date, Bar, BarSeries, HistoricalSeries,
    Interval, Lookback, Observation, Symbol, UtcDateTime,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{CoreError, LoadError, ValidationError};
pub use evaluation::{MetricsOverride, ModelEvaluation, OverrideOutcome};
pub use forecast::{
    assemble, ForecastEngine, ForecastReport, ForecastResult, ForecastSummary, TodayOverview,
};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, OfflineHttpClient, ReqwestHttpClient,
};
pub use loader::{load_history, ColumnMap, LoadOutcome};
pub use market::{fetch_snapshot, format_volume, MarketRange, MarketSnapshot, SUPPORTED_TICKERS};
pub use projector::{project_path, ProjectedPoint};
pub use source::ProviderId;
pub use stats::ReturnStatistics;
