//! Behavior-driven tests for the market overview
//!
//! These tests verify range-to-request mapping, snapshot arithmetic and
//! provider failure handling for the market snapshot.

use std::sync::Arc;

use idxcast_core::market::{fetch_snapshot, format_volume, supported_symbols};
use idxcast_core::{
    HttpError, HttpResponse, MarketRange, OfflineHttpClient, SourceErrorKind, YahooAdapter,
    SUPPORTED_TICKERS,
};

use idxcast_tests::{symbol, RecordingHttpClient};

const WEEK_BODY: &str = r#"{
    "chart": {
        "result": [{
            "timestamp": [1704160800, 1704162600, 1704164400, 1704166200, 1704168000, 1704169800],
            "indicators": {"quote": [{
                "open":   [4800, 4810, 4820, 4830, 4840, 4850],
                "high":   [4820, 4830, 4840, 4850, 4900, 5300],
                "low":    [4790, 4800, 4810, 4820, 4830, 4700],
                "close":  [4800, 4820, 4830, 4840, 4850, 5280],
                "volume": [1000, 2000, 3000, 4000, 5000, 2500000000]
            }]}
        }],
        "error": null
    }
}"#;

// =============================================================================
// Snapshots
// =============================================================================

#[tokio::test]
async fn when_weekly_range_is_requested_change_spans_five_bars() {
    // Given: Yahoo answering with six 30 minute bars
    let client = Arc::new(RecordingHttpClient::new(Ok(HttpResponse::ok_json(WEEK_BODY))));
    let adapter = YahooAdapter::with_http_client(client.clone());

    // When: A weekly snapshot is fetched
    let snapshot = fetch_snapshot(&adapter, &symbol("BBRI.JK"), MarketRange::OneWeek)
        .await
        .expect("snapshot");

    // Then: The request used the weekly window and change is against the first bar
    let requests = client.recorded_requests();
    assert!(requests[0].url.ends_with("BBRI.JK?range=5d&interval=30m"));
    assert_eq!(snapshot.current_price, 5280.0);
    assert_eq!(snapshot.open, 4850.0);
    assert_eq!(snapshot.low, 4700.0);
    assert_eq!(snapshot.high, 5300.0);
    assert_eq!(snapshot.change_pct, 10.0);
    assert_eq!(snapshot.formatted_volume(), "2.50 B");
}

#[tokio::test]
async fn when_daily_range_is_requested_change_is_against_previous_bar() {
    // Given: The same bars served for a one day range
    let client = Arc::new(RecordingHttpClient::new(Ok(HttpResponse::ok_json(WEEK_BODY))));
    let adapter = YahooAdapter::with_http_client(client.clone());

    // When: A daily snapshot is fetched
    let snapshot = fetch_snapshot(&adapter, &symbol("BBRI.JK"), MarketRange::OneDay)
        .await
        .expect("snapshot");

    // Then: Five minute bars were requested and change uses the prior close
    assert!(client.recorded_requests()[0]
        .url
        .ends_with("range=1d&interval=5m"));
    assert_eq!(snapshot.change_pct, 8.87);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn when_provider_has_no_bars_snapshot_is_unavailable() {
    // Given: An empty chart result
    let body = r#"{"chart":{"result":[],"error":null}}"#;
    let adapter = YahooAdapter::with_http_client(Arc::new(RecordingHttpClient::new(Ok(
        HttpResponse::ok_json(body),
    ))));

    // When: A monthly snapshot is fetched
    let error = fetch_snapshot(&adapter, &symbol("TLKM.JK"), MarketRange::OneMonth)
        .await
        .expect_err("must fail");

    // Then: The error is an unavailable source error naming the range
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert!(error.message().contains("TLKM.JK (1M)"));
}

#[tokio::test]
async fn when_offline_no_request_leaves_the_process() {
    // Given: An adapter over the offline transport
    let adapter = YahooAdapter::with_http_client(Arc::new(OfflineHttpClient));

    // When: A snapshot is fetched
    let error = fetch_snapshot(&adapter, &symbol("BBRI.JK"), MarketRange::OneYear)
        .await
        .expect_err("must fail");

    // Then: The failure is internal and not retryable
    assert_eq!(error.kind(), SourceErrorKind::Internal);
    assert!(!error.retryable());
    assert!(error.message().contains("offline mode"));
}

#[tokio::test]
async fn when_transport_times_out_the_error_is_retryable() {
    // Given: A transport that times out
    let adapter = YahooAdapter::with_http_client(Arc::new(RecordingHttpClient::new(Err(
        HttpError::new("request timeout: deadline elapsed"),
    ))));

    // When: A snapshot is fetched
    let error = fetch_snapshot(&adapter, &symbol("BBRI.JK"), MarketRange::OneDay)
        .await
        .expect_err("must fail");

    // Then: The caller may retry
    assert!(error.retryable());
    assert_eq!(error.code(), "source.unavailable");
}

// =============================================================================
// Presentation helpers
// =============================================================================

#[test]
fn volume_is_compacted_by_magnitude() {
    assert_eq!(format_volume(1_250_000_000.0), "1.25 B");
    assert_eq!(format_volume(75_500_000.0), "75.50 M");
    assert_eq!(format_volume(1_500.0), "1.50 K");
    assert_eq!(format_volume(950.0), "950");
}

#[test]
fn supported_tickers_are_idx_symbols() {
    let symbols = supported_symbols();
    assert_eq!(symbols.len(), 10);
    assert_eq!(symbols[0].as_str(), SUPPORTED_TICKERS[0]);
    assert!(symbols.iter().all(|symbol| symbol.is_idx()));
}
