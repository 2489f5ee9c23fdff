//! Shared fixtures for the idxcast behavior suites.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use idxcast_core::{
    Bar, BarSeries, BarsRequest, DataSource, HttpClient, HttpError, HttpRequest, HttpResponse,
    Interval, ProviderId, SourceError, Symbol, UtcDateTime,
};

/// 2024-01-02 02:00 UTC, 09:00 on the Jakarta clock.
pub const FIRST_SESSION_TS: i64 = 1_704_160_800;
const DAY_SECONDS: i64 = 86_400;

/// Data source with a canned answer that counts its calls.
pub struct StubSource {
    response: Result<BarSeries, SourceError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<BarsRequest>>,
}

impl StubSource {
    pub fn returning(series: BarSeries) -> Self {
        Self::with_response(Ok(series))
    }

    pub fn failing(error: SourceError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<BarSeries, SourceError>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<BarsRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl DataSource for StubSource {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn bars<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(req);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

/// HTTP transport that records requests and answers with one canned response.
pub struct RecordingHttpClient {
    response: Result<HttpResponse, HttpError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub fn new(response: Result<HttpResponse, HttpError>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

pub fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

/// Daily bars, one session per calendar day from 2024-01-02, flat candles.
pub fn daily_bars(symbol: &Symbol, closes: &[f64]) -> BarSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            let ts = UtcDateTime::from_unix_timestamp(FIRST_SESSION_TS + index as i64 * DAY_SECONDS)
                .expect("valid timestamp");
            Bar::new(ts, *close, *close, *close, *close, Some(1_000_000)).expect("valid bar")
        })
        .collect();
    BarSeries::new(symbol.clone(), Interval::OneDay, bars)
}

/// History CSV text with `date,close` rows starting 2024-01-02.
pub fn history_csv(closes: &[f64]) -> String {
    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    let mut day = time::macros::date!(2024 - 01 - 02);
    for close in closes {
        csv.push_str(&format!("{day},{close},{close},{close},{close},1500000\n"));
        day = day.next_day().expect("in range");
    }
    csv
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}
