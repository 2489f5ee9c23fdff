mod forecast;
mod market;
mod tickers;

use std::sync::Arc;
use std::time::Instant;

use idxcast_core::{
    DataSource, Envelope, EnvelopeError, ForecastConfig, OfflineHttpClient, ProviderId,
    YahooAdapter,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            source_chain,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();

    let mut config = ForecastConfig::from_env();
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    let source = build_source(cli);

    let command_result = match &cli.command {
        Command::Forecast(args) => forecast::run(args, config, source).await?,
        Command::Market(args) => market::run(args, source.as_ref()).await?,
        Command::Tickers => tickers::run()?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        source_chain,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut metadata = Metadata::new(source_chain, latency_ms);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    let meta = metadata.into_envelope_meta()?;
    Envelope::with_errors(meta, data, errors).map_err(CliError::from)
}

fn build_source(cli: &Cli) -> Arc<dyn DataSource> {
    let adapter = if cli.offline {
        debug!("offline mode, network requests disabled");
        YahooAdapter::with_http_client(Arc::new(OfflineHttpClient))
    } else {
        YahooAdapter::default()
    };

    Arc::new(adapter.with_timeout_ms(cli.timeout_ms))
}

/// Envelope error for a failed provider call.
fn source_error(
    error: &idxcast_core::SourceError,
    source: ProviderId,
) -> Result<EnvelopeError, CliError> {
    Ok(EnvelopeError::new(error.code(), error.message())?
        .with_retryable(error.retryable())
        .with_source(source))
}
