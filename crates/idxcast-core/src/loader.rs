//! Historical series loading: local CSV cache first, live fetch second.
//!
//! The outcome of a load is an explicit [`LoadOutcome`] so callers can see
//! which fallback was taken and why, instead of an absorbed exception.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ForecastConfig;
use crate::data_source::{BarsRequest, DataSource, SourceError};
use crate::error::LoadError;
use crate::{parse_calendar_date, HistoricalSeries, Observation, ProviderId, Symbol};

/// Column positions resolved from a header row.
///
/// Matching is case-insensitive on trimmed names. Date falls back to the
/// first column, close to `close_price` and then the last column; volume is
/// only used when a `volume` column exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub close: usize,
    pub volume: Option<usize>,
}

impl ColumnMap {
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Option<Self> {
        if headers.is_empty() {
            return None;
        }

        let lowered = headers
            .iter()
            .map(|header| header.as_ref().trim().to_ascii_lowercase())
            .collect::<Vec<_>>();
        let position = |name: &str| lowered.iter().position(|header| header == name);

        let date = position("date").unwrap_or(0);
        let close = position("close")
            .or_else(|| position("close_price"))
            .unwrap_or(lowered.len() - 1);
        let volume = position("volume");

        Some(Self {
            date,
            close,
            volume,
        })
    }
}

/// Which source produced the history, or why none did.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The local cache file parsed.
    Cached {
        path: PathBuf,
        series: HistoricalSeries,
    },
    /// The live fetch succeeded. `cache_error` says why a cache file that
    /// existed was skipped.
    Fetched {
        series: HistoricalSeries,
        cache_error: Option<LoadError>,
    },
    /// Nothing usable. Rendered as the empty forecast result.
    Missing {
        cache_error: Option<LoadError>,
        fetch_error: SourceError,
    },
}

impl LoadOutcome {
    pub fn series(&self) -> Option<&HistoricalSeries> {
        match self {
            Self::Cached { series, .. } | Self::Fetched { series, .. } => Some(series),
            Self::Missing { .. } => None,
        }
    }

    pub fn origin(&self) -> Option<ProviderId> {
        match self {
            Self::Cached { .. } => Some(ProviderId::Cache),
            Self::Fetched { .. } => Some(ProviderId::Yahoo),
            Self::Missing { .. } => None,
        }
    }

    /// Human-readable notes about skipped sources, for envelope warnings.
    pub fn warnings(&self) -> Vec<String> {
        let (cache_error, fetch_error) = match self {
            Self::Cached { .. } => (None, None),
            Self::Fetched { cache_error, .. } => (cache_error.as_ref(), None),
            Self::Missing {
                cache_error,
                fetch_error,
            } => (cache_error.as_ref(), Some(fetch_error)),
        };

        let mut warnings = Vec::new();
        if let Some(error) = cache_error {
            warnings.push(format!("history cache skipped: {error}"));
        }
        if let Some(error) = fetch_error {
            warnings.push(format!("history fetch failed: {error}"));
        }
        warnings
    }
}

/// Load the daily history for `symbol`.
///
/// Never fails: every failure path ends in [`LoadOutcome::Missing`].
pub async fn load_history(
    config: &ForecastConfig,
    source: &dyn DataSource,
    symbol: &Symbol,
) -> LoadOutcome {
    let mut cache_error = None;

    match find_cache_file(&config.data_dir, &config.cache_prefix) {
        Ok(Some(path)) => match read_history_csv(&path, symbol) {
            Ok(series) => {
                info!(path = %path.display(), rows = series.len(), "loaded history from cache");
                return LoadOutcome::Cached { path, series };
            }
            Err(error) => {
                warn!(%error, "history cache unusable, falling back to live fetch");
                cache_error = Some(error);
            }
        },
        Ok(None) => {
            debug!(dir = %config.data_dir.display(), prefix = %config.cache_prefix, "no history cache file");
        }
        Err(error) => {
            warn!(%error, "history cache directory unreadable, falling back to live fetch");
            cache_error = Some(error);
        }
    }

    let request = BarsRequest::daily(symbol.clone(), config.lookback);
    match source.bars(request).await {
        Ok(bars) if !bars.bars.is_empty() => {
            let series = HistoricalSeries::from_bars(&bars, config.utc_offset());
            info!(source = %source.id(), rows = series.len(), "fetched live history");
            LoadOutcome::Fetched {
                series,
                cache_error,
            }
        }
        Ok(_) => {
            warn!(%symbol, "live fetch returned no bars");
            LoadOutcome::Missing {
                cache_error,
                fetch_error: SourceError::unavailable(format!(
                    "{} returned no bars for {symbol}",
                    source.id()
                )),
            }
        }
        Err(fetch_error) => {
            warn!(error = %fetch_error, "live fetch failed");
            LoadOutcome::Missing {
                cache_error,
                fetch_error,
            }
        }
    }
}

/// First file in `dir` (by name) whose lowercase name starts with `prefix`.
///
/// A missing directory means there is no cache; any other listing failure
/// is reported.
pub fn find_cache_file(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, LoadError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let prefix = prefix.to_ascii_lowercase();

    let mut matches = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|kind| kind.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_ascii_lowercase()
                .starts_with(&prefix)
        })
        .map(|entry| entry.path())
        .collect::<Vec<_>>();

    matches.sort();
    Ok(matches.into_iter().next())
}

/// Parse a history CSV into a series sorted by date.
///
/// Rows with an empty date or close cell are skipped; any other cell that
/// does not parse makes the whole file malformed. Unparseable volumes are
/// dropped per row.
pub fn read_history_csv(path: &Path, symbol: &Symbol) -> Result<HistoricalSeries, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = ColumnMap::resolve(&headers.iter().collect::<Vec<_>>()).ok_or_else(|| {
        LoadError::MissingColumns {
            path: path.to_path_buf(),
        }
    })?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let malformed = |reason: String| LoadError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let date_cell = record.get(columns.date).unwrap_or_default();
        let close_cell = record.get(columns.close).unwrap_or_default();
        if date_cell.is_empty() || close_cell.is_empty() {
            debug!(line, "skipping row with empty date or close");
            continue;
        }

        let date = parse_calendar_date(date_cell).map_err(|e| malformed(e.to_string()))?;
        let close = close_cell
            .parse::<f64>()
            .map_err(|_| malformed(format!("close '{close_cell}' is not a number")))?;
        let volume = columns
            .volume
            .and_then(|index| record.get(index))
            .and_then(|cell| cell.parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value >= 0.0);

        let observation =
            Observation::new(date, close, volume).map_err(|e| malformed(e.to_string()))?;
        observations.push(observation);
    }

    if observations.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(HistoricalSeries::new(symbol.clone(), observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::date;

    fn symbol() -> Symbol {
        Symbol::parse("BBRI.JK").expect("valid symbol")
    }

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create fixture");
        file.write_all(contents.as_bytes()).expect("write fixture");
        path
    }

    #[test]
    fn resolves_named_columns_case_insensitively() {
        let columns = ColumnMap::resolve(&["Open", " DATE ", "Close", "Volume"]).expect("columns");
        assert_eq!(
            columns,
            ColumnMap {
                date: 1,
                close: 2,
                volume: Some(3)
            }
        );
    }

    #[test]
    fn resolves_close_price_alias() {
        let columns = ColumnMap::resolve(&["date", "close_price", "other"]).expect("columns");
        assert_eq!(columns.close, 1);
        assert_eq!(columns.volume, None);
    }

    #[test]
    fn falls_back_to_positional_columns() {
        let columns = ColumnMap::resolve(&["tanggal", "harga_buka", "harga_tutup"]).expect("columns");
        assert_eq!(columns.date, 0);
        assert_eq!(columns.close, 2);
        assert_eq!(columns.volume, None);
    }

    #[test]
    fn prefers_exact_close_over_alias() {
        let columns = ColumnMap::resolve(&["Date", "close_price", "Close"]).expect("columns");
        assert_eq!(columns.close, 2);
    }

    #[test]
    fn no_headers_resolve_to_none() {
        let headers: [&str; 0] = [];
        assert!(ColumnMap::resolve(&headers).is_none());
    }

    #[test]
    fn reads_and_sorts_history_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "data_saham_bbri_jk.csv",
            "Date,Open,Close,Volume\n\
             2024-01-03,100,110,2000\n\
             2024-01-02 00:00:00+07:00,99,100,n/a\n",
        );

        let series = read_history_csv(&path, &symbol()).expect("parses");
        let observations = series.observations();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].date, date!(2024 - 01 - 02));
        assert_eq!(observations[0].close, 100.0);
        assert_eq!(observations[0].volume, None);
        assert_eq!(observations[1].volume, Some(2000.0));
    }

    #[test]
    fn skips_rows_with_empty_close() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "history.csv",
            "date,close\n2024-01-02,100\n2024-01-03,\n2024-01-04,102\n",
        );

        let series = read_history_csv(&path, &symbol()).expect("parses");
        assert_eq!(series.closes(), vec![100.0, 102.0]);
    }

    #[test]
    fn unparseable_date_is_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            dir.path(),
            "history.csv",
            "Price,Close,Volume\nTicker,BBRI.JK,BBRI.JK\n2024-01-02,100,10\n",
        );

        let error = read_history_csv(&path, &symbol()).expect_err("must fail");
        assert!(matches!(error, LoadError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn non_numeric_close_is_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "history.csv", "date,close\n2024-01-02,abc\n");

        let error = read_history_csv(&path, &symbol()).expect_err("must fail");
        assert!(error.to_string().contains("not a number"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "history.csv", "date,close\n");

        let error = read_history_csv(&path, &symbol()).expect_err("must fail");
        assert!(matches!(error, LoadError::Empty { .. }));
    }

    #[test]
    fn finds_cache_file_by_case_insensitive_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "notes.txt", "");
        write_file(dir.path(), "Data_Saham_BBRI_JK_2024.csv", "date,close\n");
        write_file(dir.path(), "data_saham_bbri_jk.csv", "date,close\n");

        let found = find_cache_file(dir.path(), "data_saham_bbri_jk")
            .expect("listable")
            .expect("match");
        assert_eq!(
            found.file_name().and_then(|name| name.to_str()),
            Some("Data_Saham_BBRI_JK_2024.csv")
        );
    }

    #[test]
    fn missing_directory_has_no_cache_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let found = find_cache_file(&dir.path().join("absent"), "data_saham_bbri_jk");
        assert!(matches!(found, Ok(None)));
    }

    #[test]
    fn unlistable_directory_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let not_a_dir = write_file(dir.path(), "data", "plain file");

        let error = find_cache_file(&not_a_dir, "data_saham_bbri_jk").expect_err("must fail");
        assert!(matches!(error, LoadError::Io { path, .. } if path == not_a_dir));
    }
}
