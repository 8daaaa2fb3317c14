//! Behavior tests for the market-data gateway
//!
//! These tests drive `MarketDataGateway` through a scripted transport and
//! check provider selection, pagination, rate-limit shrinking and the
//! big-movers scan.

use std::sync::Arc;
use std::time::Duration;

use quotebridge_core::{
    BackoffPolicy, SourceErrorKind, Symbol, Timespan, Window, WindowUnit, MAX_SEARCH_LIMIT,
};
use quotebridge_tests::{
    gateway, gateway_with_backoff, polygon_page, yahoo_chart, ScriptedHttpClient,
};
use time::macros::format_description;
use time::Date;

const AGGS: &str = "/v2/aggs/ticker/AAPL/range/1/day/";

fn aapl() -> Symbol {
    Symbol::parse("aapl").expect("valid symbol")
}

fn window(value: &str) -> Window {
    value.parse().expect("valid window")
}

/// Days between the start and end dates of a first-page aggregates URL.
fn requested_span(url: &str) -> i64 {
    let format = format_description!("[year]-[month]-[day]");
    let tail = url.split(AGGS).nth(1).expect("aggregates url");
    let dates = tail.split('?').next().expect("path");
    let mut parts = dates.split('/');
    let start = Date::parse(parts.next().expect("start"), format).expect("start date");
    let end = Date::parse(parts.next().expect("end"), format).expect("end date");
    (end - start).whole_days()
}

// =============================================================================
// Polygon: rate-limit shrinking
// =============================================================================

#[tokio::test]
async fn when_polygon_keeps_rate_limiting_gateway_gives_up_after_budget() {
    // Given: Polygon answers 429 to everything
    let client = Arc::new(ScriptedHttpClient::new().on_status(AGGS, 429));
    let gateway = gateway(&client, Some("pk"));

    // When: Candles are requested over 8 days
    let result = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("8d"), None)
        .await;

    // Then: One initial attempt plus three shrinks, each halving the span
    let error = result.expect_err("rate limit should persist");
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);

    let spans = client.urls().iter().map(|url| requested_span(url)).collect::<Vec<_>>();
    assert_eq!(spans, vec![8, 4, 2, 1]);
}

#[tokio::test]
async fn when_a_page_is_rate_limited_the_whole_attempt_is_discarded() {
    // Given: The first attempt gets one page then a 429; the retry succeeds over two pages
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(
                AGGS,
                polygon_page(
                    &[(1, 1.0, 1.0)],
                    Some("https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/c?cursor=first"),
                ),
            )
            .on_status(AGGS, 429)
            .on_json(
                AGGS,
                polygon_page(
                    &[(10, 100.0, 101.0)],
                    Some("https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/c?cursor=second"),
                ),
            )
            .on_json(AGGS, polygon_page(&[(20, 101.0, 102.0)], None)),
    );
    let gateway = gateway(&client, Some("pk"));

    // When: Candles are requested over 10 days
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("10d"), None)
        .await
        .expect("retry should succeed");

    // Then: Only the retry's pages are returned, in order
    let timestamps = candles.iter().map(|candle| candle.timestamp).collect::<Vec<_>>();
    assert_eq!(timestamps, vec![10, 20]);

    // And: The retry asked for half the span
    let urls = client.urls();
    assert_eq!(urls.len(), 4);
    assert_eq!(requested_span(&urls[0]), 10);
    assert_eq!(requested_span(&urls[2]), 5);
}

#[tokio::test]
async fn when_polygon_paginates_every_page_carries_the_key() {
    // Given: Two pages linked by a cursor URL without a key
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(
                AGGS,
                polygon_page(
                    &[(1, 10.0, 11.0)],
                    Some("https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/c?cursor=abc"),
                ),
            )
            .on_json(AGGS, polygon_page(&[(2, 11.0, 12.0)], None)),
    );
    let gateway = gateway(&client, None);

    // When: The caller passes a key explicitly
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("5d"), Some("caller-key"))
        .await
        .expect("pages should merge");

    // Then: Both pages are merged and both requests carry the key
    assert_eq!(candles.len(), 2);
    let urls = client.urls();
    assert_eq!(urls.len(), 2);
    assert!(urls[1].contains("cursor=abc"));
    assert!(urls.iter().all(|url| url.contains("apiKey=caller-key")));
}

#[tokio::test]
async fn when_polygon_fails_with_server_error_gateway_fails_fast() {
    // Given: Polygon answers 500
    let client = Arc::new(ScriptedHttpClient::new().on_status(AGGS, 500));
    let gateway = gateway(&client, Some("pk"));

    // When: Candles are requested
    let result = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("1m"), None)
        .await;

    // Then: Exactly one request, no fallback to Yahoo
    assert_eq!(result.expect_err("500 propagates").kind(), SourceErrorKind::Upstream);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn when_polygon_has_no_data_result_is_empty() {
    // Given: A successful response without `results`
    let client = Arc::new(
        ScriptedHttpClient::new().on_json(AGGS, serde_json::json!({ "status": "OK" })),
    );
    let gateway = gateway(&client, Some("pk"));

    // When / Then: An empty series, not an error
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("5d"), None)
        .await
        .expect("empty series");
    assert!(candles.is_empty());
}

#[tokio::test]
async fn when_window_reaches_past_the_calendar_polygon_is_never_called() {
    // Given: A window built directly, bypassing the parser's length check
    let client = Arc::new(ScriptedHttpClient::new().on_json(AGGS, polygon_page(&[], None)));
    let gateway = gateway(&client, Some("pk"));
    let ancient = Window::Relative {
        amount: 30_000,
        unit: WindowUnit::Years,
    };

    // When: Candles are requested over it
    let result = gateway
        .fetch_candles(&aapl(), Timespan::Day, ancient, None)
        .await;

    // Then: The request fails as bad input instead of reaching Polygon
    assert_eq!(
        result.expect_err("window too long").kind(),
        SourceErrorKind::InvalidInput
    );
    assert!(client.requests().is_empty());

    // And: The movers scan drops the symbol rather than failing the batch
    let movers = gateway
        .big_movers(&[String::from("AAPL")], Timespan::Day, ancient, 0.0, None)
        .await;
    assert!(movers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn when_polygon_rate_limits_the_retry_waits_out_the_cooldown() {
    // Given: One 429, then a single page
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_status(AGGS, 429)
            .on_json(AGGS, polygon_page(&[(1, 10.0, 11.0)], None)),
    );
    let policy = BackoffPolicy {
        max_shrinks: 3,
        cooldown: Duration::from_secs(12),
        page_delay: Duration::from_millis(250),
    };
    let gateway = gateway_with_backoff(&client, Some("pk"), policy);
    let started = tokio::time::Instant::now();

    // When: Candles are requested
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("10d"), None)
        .await
        .expect("retry succeeds");

    // Then: The shrunken retry was issued only after the cool-down
    assert_eq!(candles.len(), 1);
    assert_eq!(client.requests().len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn when_polygon_paginates_pages_are_spaced_by_the_page_delay() {
    // Given: Two pages and no rate limiting
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(
                AGGS,
                polygon_page(
                    &[(1, 10.0, 11.0)],
                    Some("https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/day/c?cursor=p2"),
                ),
            )
            .on_json(AGGS, polygon_page(&[(2, 11.0, 12.0)], None)),
    );
    let policy = BackoffPolicy {
        max_shrinks: 3,
        cooldown: Duration::from_secs(60),
        page_delay: Duration::from_millis(250),
    };
    let gateway = gateway_with_backoff(&client, Some("pk"), policy);
    let started = tokio::time::Instant::now();

    // When: Candles are requested
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("5d"), None)
        .await
        .expect("two pages");

    // Then: The second page waited the page delay, but no cool-down was taken
    assert_eq!(candles.len(), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(60), "{elapsed:?}");
}

#[tokio::test]
async fn when_window_is_max_polygon_span_is_the_timespan_ceiling() {
    let client = Arc::new(ScriptedHttpClient::new().on_json(AGGS, polygon_page(&[], None)));
    let gateway = gateway(&client, Some("pk"));

    gateway
        .fetch_candles(&aapl(), Timespan::Day, window("max"), None)
        .await
        .expect("empty series");

    assert_eq!(requested_span(&client.urls()[0]), 7300);
}

// =============================================================================
// Yahoo: keyless candles
// =============================================================================

#[tokio::test]
async fn when_no_key_resolves_candles_come_from_yahoo() {
    // Given: No Polygon key and a chart with one incomplete row
    let client = Arc::new(ScriptedHttpClient::new().on_json(
        "/v8/finance/chart/AAPL?",
        yahoo_chart(&[1_700_000_000, 1_700_086_400, 1_700_172_800], &[
            Some(101.0),
            None,
            Some(103.0),
        ]),
    ));
    let gateway = gateway(&client, None);

    // When: Candles are requested
    let candles = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("1w"), Some("  "))
        .await
        .expect("yahoo candles");

    // Then: The incomplete row is dropped and timestamps are in milliseconds
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].timestamp, 1_700_000_000_000);
    assert_eq!(candles[1].close, 103.0);

    // And: Yahoo was asked with its own vocabulary and a browser user agent
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("interval=1d&range=7d"));
    assert_eq!(requests[0].header("user-agent"), Some("Mozilla/5.0"));
}

#[tokio::test]
async fn when_yahoo_returns_no_result_error_is_unsupported_shape() {
    let client = Arc::new(ScriptedHttpClient::new().on_json(
        "/v8/finance/chart/AAPL?",
        serde_json::json!({
            "chart": { "result": null, "error": { "description": "No data found" } }
        }),
    ));
    let gateway = gateway(&client, None);

    let error = gateway
        .fetch_candles(&aapl(), Timespan::Day, window("5d"), None)
        .await
        .expect_err("no result");

    assert_eq!(error.kind(), SourceErrorKind::UnsupportedResponseShape);
    assert!(error.message().contains("No data found"));
}

// =============================================================================
// Symbol search
// =============================================================================

const TICKERS: &str = "/v3/reference/tickers";
const AUTOC: &str = "autoc.finance.yahoo.com/autoc";

fn yahoo_suggestions() -> serde_json::Value {
    serde_json::json!({
        "ResultSet": { "Result": [
            { "symbol": "AAPL", "name": "Apple Inc." },
            { "symbol": "", "name": "blank" },
            { "symbol": "AAPL.MX", "name": "Apple Mexico" },
            { "symbol": "APLE", "name": "Apple Hospitality" }
        ]}
    })
}

#[tokio::test]
async fn when_polygon_search_fails_gateway_falls_through_to_yahoo() {
    // Given: Polygon search errors, Yahoo answers
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_status(TICKERS, 500)
            .on_json(AUTOC, yahoo_suggestions()),
    );
    let gateway = gateway(&client, Some("pk"));

    // When: The user searches with a limit of 2
    let items = gateway
        .search_symbols("apple", None, 2)
        .await
        .expect("fallback succeeds");

    // Then: Blank symbols are filtered before truncation
    let symbols = items.iter().map(|item| item.symbol.as_str()).collect::<Vec<_>>();
    assert_eq!(symbols, vec!["AAPL", "AAPL.MX"]);

    // And: Yahoo got the browser user agent
    let yahoo = client.requests_matching(AUTOC);
    assert_eq!(yahoo.len(), 1);
    assert_eq!(yahoo[0].header("user-agent"), Some("Mozilla/5.0"));
}

#[tokio::test]
async fn when_polygon_search_succeeds_yahoo_is_not_called() {
    let client = Arc::new(ScriptedHttpClient::new().on_json(
        TICKERS,
        serde_json::json!({ "results": [{ "ticker": "MSFT", "name": "Microsoft" }] }),
    ));
    let gateway = gateway(&client, Some("pk"));

    let items = gateway
        .search_symbols("micro", None, 10)
        .await
        .expect("polygon search");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Microsoft");
    let urls = client.urls();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("search=micro&active=true&limit=10&apiKey=pk"));
}

#[tokio::test]
async fn when_search_limit_exceeds_the_cap_it_is_clamped() {
    // Given: Polygon answers a ticker search
    let client = Arc::new(ScriptedHttpClient::new().on_json(
        TICKERS,
        serde_json::json!({ "results": [{ "ticker": "MSFT", "name": "Microsoft" }] }),
    ));
    let gateway = gateway(&client, Some("pk"));

    // When: The caller asks for more than the cap
    let items = gateway
        .search_symbols("micro", None, 500)
        .await
        .expect("oversized limit is clamped");

    // Then: The request succeeds and Polygon is asked for the cap
    assert_eq!(items.len(), 1);
    assert!(client.urls()[0].contains(&format!("limit={MAX_SEARCH_LIMIT}&")));
}

#[tokio::test]
async fn when_search_limit_is_zero_it_is_invalid_input() {
    let client = Arc::new(ScriptedHttpClient::new());
    let gateway = gateway(&client, Some("pk"));

    let error = gateway
        .search_symbols("micro", None, 0)
        .await
        .expect_err("zero limit");

    assert_eq!(error.kind(), SourceErrorKind::InvalidInput);
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn when_search_query_is_blank_no_request_is_made() {
    let client = Arc::new(ScriptedHttpClient::new());
    let gateway = gateway(&client, Some("pk"));

    let error = gateway
        .search_symbols("   ", None, 10)
        .await
        .expect_err("blank query");

    assert_eq!(error.kind(), SourceErrorKind::InvalidInput);
    assert!(client.requests().is_empty());
}

// =============================================================================
// Big movers
// =============================================================================

#[tokio::test]
async fn when_one_symbol_fails_big_movers_still_ranks_the_rest() {
    // Given: A rises 10%, B fails, C falls 3%
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json("/chart/A?", yahoo_chart(&[1, 2], &[Some(105.0), Some(110.0)]))
            .on_transport_error("/chart/B?", "connection reset")
            .on_json("/chart/C?", yahoo_chart(&[1], &[Some(97.0)])),
    );
    let gateway = gateway(&client, None);
    let symbols = ["a", "B", "c", "A", " "].map(String::from);

    // When: Scanning with a 2% threshold
    let movers = gateway
        .big_movers(&symbols, Timespan::Day, window("5d"), 2.0, None)
        .await;

    // Then: The failing symbol is dropped and the rest sort by magnitude
    let ranked = movers
        .iter()
        .map(|mover| (mover.symbol.as_str(), mover.change_pct.round()))
        .collect::<Vec<_>>();
    assert_eq!(ranked, vec![("A", 10.0), ("C", -3.0)]);

    // And: Duplicates were fetched once
    assert_eq!(client.requests_matching("/chart/A?").len(), 1);
}

#[tokio::test]
async fn when_threshold_is_high_small_moves_are_excluded() {
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json("/chart/A?", yahoo_chart(&[1, 2], &[Some(105.0), Some(110.0)]))
            .on_json("/chart/C?", yahoo_chart(&[1], &[Some(97.0)])),
    );
    let gateway = gateway(&client, None);
    let symbols = ["A", "C"].map(String::from);

    let movers = gateway
        .big_movers(&symbols, Timespan::Day, window("5d"), 5.0, None)
        .await;

    assert_eq!(movers.len(), 1);
    assert_eq!(movers[0].symbol, "A");
}
