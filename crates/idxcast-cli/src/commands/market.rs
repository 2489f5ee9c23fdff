use serde::Serialize;

use idxcast_core::market::fetch_snapshot;
use idxcast_core::{DataSource, MarketRange, MarketSnapshot, Symbol};
use serde_json::Value;

use crate::cli::MarketArgs;
use crate::error::CliError;

use super::{source_error, CommandResult};

#[derive(Debug, Serialize)]
struct MarketResponseData {
    #[serde(flatten)]
    snapshot: MarketSnapshot,
    volume_display: String,
}

pub async fn run(args: &MarketArgs, source: &dyn DataSource) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let range = args.range.parse::<MarketRange>()?;

    let mut result = match fetch_snapshot(source, &symbol, range).await {
        Ok(snapshot) => {
            let volume_display = snapshot.formatted_volume();
            let data = serde_json::to_value(MarketResponseData {
                snapshot,
                volume_display,
            })?;
            CommandResult::ok(data, vec![source.id()])
        }
        Err(error) => CommandResult::ok(Value::Null, vec![source.id()])
            .with_errors(vec![source_error(&error, source.id())?]),
    };

    if !symbol.is_idx() {
        result = result.with_warning(format!("{symbol} is not an IDX (.JK) ticker"));
    }

    Ok(result)
}
