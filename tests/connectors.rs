//! HTTP adapters against mocked endpoints.

use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use the_sentinel::config::TokenSource;
use the_sentinel::connectors::coinmarketcap::CoinMarketCapClient;
use the_sentinel::connectors::rpc::RpcBalanceProvider;
use the_sentinel::connectors::telegram::TelegramNotifier;
use the_sentinel::connectors::traits::{BalanceProvider, BalanceRequest, Notifier, PriceFeedProvider};
use the_sentinel::error::{FeedError, NotifierError};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WALLET: &str = "0x9e8ca6e7e4a612909ed892dc69bd69325a497e73";
const USDT: &str = "0xc2132d05d31c914a87c6611c10748aeb04b58e8f";

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn cmc(server: &MockServer) -> CoinMarketCapClient {
    CoinMarketCapClient::new("test-key".to_string(), Duration::from_secs(5))
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn quotes_are_read_for_the_convert_currency() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "status": { "error_code": 0 },
        "data": {
            "ETH": {
                "symbol": "ETH",
                "quote": {
                    "GBP": {
                        "price": 2601.5,
                        "percent_change_3h": 1.25,
                        "percent_change_24h": -3.5
                    }
                }
            }
        }
    });
    Mock::given(method("GET"))
        .and(path("/v1/cryptocurrency/quotes/latest"))
        .and(query_param("symbol", "ETH"))
        .and(query_param("convert", "GBP"))
        .and(header("X-CMC_PRO_API_KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = cmc(&server).fetch("ETH", "GBP").await.unwrap();

    assert_eq!(snapshot.price, d("2601.5"));
    assert_eq!(snapshot.change_3h, d("1.25"));
    assert_eq!(snapshot.change_24h, d("-3.5"));
}

#[tokio::test]
async fn missing_changes_default_to_zero() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "data": { "POL": { "quote": { "GBP": { "price": 0.19 } } } }
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let snapshot = cmc(&server).fetch("POL", "GBP").await.unwrap();

    assert_eq!(snapshot.price, d("0.19"));
    assert_eq!(snapshot.change_3h, Decimal::ZERO);
    assert_eq!(snapshot.change_24h, Decimal::ZERO);
}

#[tokio::test]
async fn absent_or_null_price_is_a_feed_error() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "data": { "LINK": { "quote": { "GBP": { "price": null } } } }
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let client = cmc(&server);

    let err = client.fetch("LINK", "GBP").await.unwrap_err();
    assert!(matches!(err, FeedError::MissingQuote { .. }));

    let err = client.fetch("AAVE", "GBP").await.unwrap_err();
    assert!(matches!(err, FeedError::MissingQuote { .. }));
}

#[tokio::test]
async fn zero_price_is_rejected() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "data": { "DAI": { "quote": { "GBP": { "price": 0.0 } } } }
    });
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = cmc(&server).fetch("DAI", "GBP").await.unwrap_err();
    assert!(matches!(err, FeedError::InvalidPrice { .. }));
}

#[tokio::test]
async fn http_error_status_is_a_feed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = cmc(&server).fetch("ETH", "GBP").await.unwrap_err();
    assert!(matches!(err, FeedError::Http(_)));
}

#[tokio::test]
async fn telegram_posts_markdown_to_the_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_string_contains("chat_id=42"))
        .and(body_string_contains("parse_mode=Markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new("TOKEN".to_string(), "42".to_string(), Duration::from_secs(5))
        .unwrap()
        .with_api_base(server.uri());

    notifier.send("🚨 *Crypto Alert: ETH* 🚨").await.unwrap();
}

#[tokio::test]
async fn telegram_rejection_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new("TOKEN".to_string(), "42".to_string(), Duration::from_secs(5))
        .unwrap()
        .with_api_base(server.uri());

    let err = notifier.send("hello").await.unwrap_err();
    match err {
        NotifierError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "chat not found");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn rpc_balances_degrade_to_zero_per_asset() {
    let server = MockServer::start().await;
    // USDT balanceOf -> 30.5 (6 decimals)
    Mock::given(method("POST"))
        .and(body_string_contains("eth_call"))
        .and(body_string_contains(USDT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x1d164a0"
        })))
        .mount(&server)
        .await;
    // Native balance -> 1 (18 decimals)
    Mock::given(method("POST"))
        .and(body_string_contains("eth_getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": "0xde0b6b3a7640000"
        })))
        .mount(&server)
        .await;
    // Any other contract call errors out
    Mock::given(method("POST"))
        .and(body_string_contains("eth_call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "error": { "code": -32000, "message": "execution reverted" }
        })))
        .mount(&server)
        .await;

    let provider = RpcBalanceProvider::new(
        Url::parse(&server.uri()).unwrap(),
        WALLET.to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    let requests = vec![
        BalanceRequest {
            symbol: "USDT".to_string(),
            token: Some(TokenSource::Erc20 {
                contract: USDT.to_string(),
                decimals: 6,
            }),
        },
        BalanceRequest {
            symbol: "MATIC".to_string(),
            token: Some(TokenSource::Native { decimals: 18 }),
        },
        BalanceRequest {
            symbol: "LINK".to_string(),
            token: Some(TokenSource::Erc20 {
                contract: "0x53e0bca35ec356bd5dddfebbd1fc0fd03fabad39".to_string(),
                decimals: 18,
            }),
        },
        BalanceRequest {
            symbol: "DAI".to_string(),
            token: None,
        },
    ];

    let snapshot = provider.fetch_all(&requests).await;

    assert_eq!(snapshot.get("USDT"), d("30.5"));
    assert_eq!(snapshot.get("MATIC"), Decimal::ONE);
    assert_eq!(snapshot.get("LINK"), Decimal::ZERO);
    assert_eq!(snapshot.get("DAI"), Decimal::ZERO);
}

#[tokio::test]
async fn slow_rpc_read_only_zeroes_its_own_symbol() {
    let server = MockServer::start().await;
    let slow = "0x1111111111111111111111111111111111111111";
    Mock::given(method("POST"))
        .and(body_string_contains(slow))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "jsonrpc": "2.0", "id": 1, "result": "0x8ac7230489e80000"
                }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(USDT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x1d164a0"
        })))
        .mount(&server)
        .await;

    let provider = RpcBalanceProvider::new(
        Url::parse(&server.uri()).unwrap(),
        WALLET.to_string(),
        Duration::from_secs(1),
    )
    .unwrap();
    let requests = vec![
        BalanceRequest {
            symbol: "SLOW".to_string(),
            token: Some(TokenSource::Erc20 {
                contract: slow.to_string(),
                decimals: 18,
            }),
        },
        BalanceRequest {
            symbol: "USDT".to_string(),
            token: Some(TokenSource::Erc20 {
                contract: USDT.to_string(),
                decimals: 6,
            }),
        },
    ];

    let snapshot = provider.fetch_all(&requests).await;

    assert_eq!(snapshot.get("SLOW"), Decimal::ZERO);
    assert_eq!(snapshot.get("USDT"), d("30.5"));
}
