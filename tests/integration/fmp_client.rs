//! HTTP-level tests for the market-data client: payload parsing, failure
//! containment and auth detection.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rust_screener::api::{ApiError, FmpClient, StockDataProvider};
use rust_screener::models::{InsiderTransactionKind, MarketCapBucket};

use crate::common::test_data;

async fn client_for(server: &MockServer) -> FmpClient {
    let config = test_data::test_config(&server.uri());
    FmpClient::new(&config).unwrap()
}

#[test(tokio::test)]
async fn quote_parses_the_documented_array_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/ACME"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "symbol": "ACME",
            "price": 41.5,
            "changesPercentage": -0.8,
            "avgVolume": 120000,
            "sharesOutstanding": 9000000,
            "yearHigh": 60.0,
            "yearLow": 22.0,
            "marketCap": 373500000
        }])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let quote = client.quote("ACME").await.unwrap().unwrap();
    assert_eq!(quote.price, Some(41.5));
    assert_eq!(quote.avg_volume, Some(120_000.0));
    assert_eq!(quote.shares_outstanding, Some(9_000_000.0));
}

#[test(tokio::test)]
async fn missing_symbols_come_back_as_absent_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/GHOST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.quote("GHOST").await.unwrap().is_none());
}

#[test(tokio::test)]
async fn server_errors_are_contained_not_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.ratios_ttm("ACME").await.unwrap().is_none());
    let slice = client
        .screener_slice(MarketCapBucket::Nano, 10)
        .await
        .unwrap();
    assert!(slice.is_empty());
}

#[test(tokio::test)]
async fn authentication_failures_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.quote("ACME").await.unwrap_err();
    assert_matches!(err, ApiError::Auth { status: 401 });
    assert!(err.is_auth());
}

#[test(tokio::test)]
async fn annual_figures_merge_years_present_in_both_statements() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/income-statement/ACME"))
        .and(query_param("period", "annual"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "calendarYear": "2024", "revenue": 144.0, "netIncome": 12.0,
              "weightedAverageShsOutDil": 1000000 },
            { "calendarYear": "2023", "revenue": 121.0, "netIncome": 10.0,
              "weightedAverageShsOutDil": 1100000 },
            { "calendarYear": "2022", "revenue": 100.0, "netIncome": 9.0,
              "weightedAverageShsOutDil": 1200000 }
        ])))
        .mount(&server)
        .await;
    // No balance sheet was filed for 2022.
    Mock::given(method("GET"))
        .and(path("/balance-sheet-statement/ACME"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "calendarYear": "2024", "totalDebt": 50.0, "totalStockholdersEquity": 200.0,
              "cashAndCashEquivalents": 30.0, "totalCurrentAssets": 90.0,
              "totalLiabilities": 60.0 },
            { "calendarYear": "2023", "totalDebt": 55.0, "totalStockholdersEquity": 180.0,
              "cashAndCashEquivalents": 25.0, "totalCurrentAssets": 85.0,
              "totalLiabilities": 65.0 }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let figures = client.annual_figures("ACME", 6).await.unwrap();

    // Oldest first, and 2022 is dropped for lack of a balance sheet.
    assert_eq!(figures.len(), 2);
    assert_eq!(figures[0].calendar_year, 2023);
    assert_eq!(figures[1].calendar_year, 2024);
    assert_eq!(figures[1].revenue, Some(144.0));
    assert_eq!(figures[1].total_debt, Some(50.0));
}

#[test(tokio::test)]
async fn insider_trades_map_purchase_and_sale_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/insider-trading"))
        .and(query_param("symbol", "ACME"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "transactionDate": "2025-07-01", "transactionType": "P-Purchase",
              "securitiesTransacted": 500, "price": 4.0 },
            { "transactionDate": "2025-06-15 00:00:00", "transactionType": "S-Sale",
              "securitiesTransacted": 200, "price": 5.0 },
            { "transactionDate": "2025-06-01", "transactionType": "G-Gift" },
            { "transactionDate": null, "transactionType": "P-Purchase" }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let trades = client.insider_trades("ACME").await.unwrap();

    // The undated row is dropped, the gift maps to Other.
    assert_eq!(trades.len(), 3);
    assert_eq!(trades[0].kind, InsiderTransactionKind::Purchase);
    assert_eq!(trades[0].shares, Some(500.0));
    assert_eq!(trades[1].kind, InsiderTransactionKind::Sale);
    assert_eq!(trades[2].kind, InsiderTransactionKind::Other);
}

#[test(tokio::test)]
async fn insider_ownership_takes_the_latest_filing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/insider-ownership"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filingDate": "2025-01-10", "ownershipPercentage": 8.0 },
            { "filingDate": "2025-06-01", "ownershipPercentage": 11.5 },
            { "filingDate": "2025-07-01", "ownershipPercentage": null }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let pct = client.insider_ownership_pct("ACME").await.unwrap();
    assert_eq!(pct, Some(11.5));
}

#[test(tokio::test)]
async fn screener_slice_forwards_cap_boundaries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock-screener"))
        .and(query_param("marketCapMoreThan", "50000000"))
        .and(query_param("marketCapLowerThan", "300000000"))
        .and(query_param("isActivelyTrading", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "symbol": "MIC", "companyName": "Micro Co", "sector": "Industrials",
              "price": 12.0, "marketCap": 120000000, "volume": 80000,
              "isEtf": false, "isFund": false, "isActivelyTrading": true }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let items = client
        .screener_slice(MarketCapBucket::Micro, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].symbol, "MIC");
    assert_eq!(items[0].market_cap, Some(120_000_000.0));
}

#[test(tokio::test)]
async fn local_symbol_lists_degrade_to_empty_when_unreadable() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    // The test config points both lists at paths that do not exist.
    assert!(client.reg_sho_symbols().await.unwrap().is_empty());
    assert!(client.benchmark_symbols().await.unwrap().is_empty());
}

#[test(tokio::test)]
async fn local_symbol_lists_parse_their_file_formats() {
    let dir = tempfile::tempdir().unwrap();
    let reg_sho_path = dir.path().join("regsho.json");
    let benchmark_path = dir.path().join("sp500.json");
    std::fs::write(&reg_sho_path, r#"["gme", "AMC"]"#).unwrap();
    std::fs::write(
        &benchmark_path,
        r#"[{"Symbol": "AAPL"}, {"Symbol": "MSFT"}, {"Name": "no symbol"}]"#,
    )
    .unwrap();

    let server = MockServer::start().await;
    let mut config = test_data::test_config(&server.uri());
    config.reg_sho_path = reg_sho_path.to_string_lossy().into_owned();
    config.benchmark_symbols_path = benchmark_path.to_string_lossy().into_owned();
    let client = FmpClient::new(&config).unwrap();

    let reg_sho = client.reg_sho_symbols().await.unwrap();
    assert!(reg_sho.contains("GME"));
    assert!(reg_sho.contains("AMC"));

    let benchmark = client.benchmark_symbols().await.unwrap();
    assert_eq!(benchmark, vec!["AAPL".to_string(), "MSFT".to_string()]);
}
