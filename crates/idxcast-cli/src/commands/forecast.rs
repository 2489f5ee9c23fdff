use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use idxcast_core::{
    CoreError, DataSource, EnvelopeError, ForecastConfig, ForecastEngine, ForecastResult, Symbol,
};
use tracing::info;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &ForecastArgs,
    config: ForecastConfig,
    source: Arc<dyn DataSource>,
) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let config = config.with_symbol_cache(&symbol);

    let engine = ForecastEngine::new(config, source);
    let report = engine.report(&symbol, args.horizon).await;
    let result = report.result;

    let mut warnings = report.warnings;
    let mut errors = Vec::new();
    if result.is_empty() {
        errors.push(
            EnvelopeError::new(
                "forecast.no_data",
                format!("no history available for {symbol}"),
            )?
            .with_retryable(true),
        );
    }

    if let Some(path) = &args.csv {
        write_csv(&result, path)?;
        info!(path = %path.display(), rows = result.forecast.len(), "forecast csv written");
    }

    if let Some(path) = &args.chart {
        match &result.price_chart {
            Some(chart) => {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(BufWriter::new(file), chart)?;
            }
            None => warnings.push(format!("no chart to write to {}", path.display())),
        }
    }

    let source_chain = result.origin.into_iter().collect();
    let data = serde_json::to_value(&result)?;

    Ok(CommandResult::ok(data, source_chain)
        .with_warnings(warnings)
        .with_errors(errors))
}

fn write_csv(result: &ForecastResult, path: &Path) -> Result<(), CliError> {
    let export_error = |source: CoreError| CliError::Export {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| export_error(CoreError::Io(e)))?;
    result.write_csv(BufWriter::new(file)).map_err(export_error)
}
