use serde::Serialize;

use idxcast_core::SUPPORTED_TICKERS;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TickersResponseData {
    tickers: Vec<&'static str>,
}

pub fn run() -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(TickersResponseData {
        tickers: SUPPORTED_TICKERS.to_vec(),
    })?;

    Ok(CommandResult::ok(data, Vec::new()))
}
