//! Backward-looking error metrics and the optional metrics file override.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LoadError;

/// RMSE, MAE and MAPE (percent) for a forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
}

impl ModelEvaluation {
    /// Errors of the persistence forecast: each close predicted by the one
    /// before it.
    ///
    /// MAPE only averages over non-zero actuals and is 0 if there are none.
    /// Everything is 0 with fewer than two closes.
    pub fn naive_persistence(closes: &[f64]) -> Self {
        if closes.len() < 2 {
            return Self::default();
        }

        let pairs = closes
            .windows(2)
            .map(|pair| (pair[1], pair[1] - pair[0]))
            .collect::<Vec<_>>();
        let count = pairs.len() as f64;

        let rmse = (pairs.iter().map(|(_, err)| err * err).sum::<f64>() / count).sqrt();
        let mae = pairs.iter().map(|(_, err)| err.abs()).sum::<f64>() / count;

        let relative = pairs
            .iter()
            .filter(|(actual, _)| *actual != 0.0)
            .map(|(actual, err)| (err / actual).abs())
            .collect::<Vec<_>>();
        let mape = if relative.is_empty() {
            0.0
        } else {
            relative.iter().sum::<f64>() / relative.len() as f64 * 100.0
        };

        Self { rmse, mae, mape }
    }

    pub fn apply(self, metrics: &MetricsOverride) -> Self {
        Self {
            rmse: metrics.rmse.unwrap_or(self.rmse),
            mae: metrics.mae.unwrap_or(self.mae),
            mape: metrics.mape.unwrap_or(self.mape),
        }
    }

    pub fn rounded(self) -> Self {
        Self {
            rmse: round2(self.rmse),
            mae: round2(self.mae),
            mape: round2(self.mape),
        }
    }
}

/// Metrics read from an externally produced evaluation file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsOverride {
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
    pub mape: Option<f64>,
}

#[derive(Debug)]
pub enum OverrideOutcome {
    /// No metrics file.
    Absent,
    Applied(MetricsOverride),
    /// The file exists but could not be read. Computed metrics stand.
    Malformed(LoadError),
}

impl OverrideOutcome {
    pub fn metrics(&self) -> Option<&MetricsOverride> {
        match self {
            Self::Applied(metrics) => Some(metrics),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

impl MetricsOverride {
    /// Read `rmse`/`mae`/`mape` from the first data row of a CSV file.
    ///
    /// Headers match case-insensitively. Each metric overrides on its own;
    /// a missing column or a cell that is not a finite number leaves it out.
    pub fn load(path: &Path) -> OverrideOutcome {
        if !path.is_file() {
            debug!(path = %path.display(), "no metrics override file");
            return OverrideOutcome::Absent;
        }

        match Self::read(path) {
            Ok(metrics) => OverrideOutcome::Applied(metrics),
            Err(error) => {
                warn!(%error, "ignoring malformed metrics override file");
                OverrideOutcome::Malformed(error)
            }
        }
    }

    fn read(path: &Path) -> Result<Self, LoadError> {
        let csv_error = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>();

        let Some(row) = reader.records().next() else {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        };
        let row = row.map_err(csv_error)?;

        let metric = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .and_then(|index| row.get(index))
                .and_then(|cell| cell.parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };

        Ok(Self {
            rmse: metric("rmse"),
            mae: metric("mae"),
            mape: metric("mape"),
        })
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
