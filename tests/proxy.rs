//! End-to-end tests: HTTP client → proxy → mock upstream.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nse_proxy::{HttpServer, ProxyConfig, Shutdown, UpstreamClient};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

mod common;

use common::{MockReply, MockUpstream};

struct RunningProxy {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl RunningProxy {
    async fn start(config: ProxyConfig) -> Self {
        let client = UpstreamClient::connect(&config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let server = HttpServer::new(config, Arc::new(client));
        let handle = tokio::spawn(async move {
            let _ = server.run(listener, signal).await;
        });

        Self { addr, shutdown, handle }
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();
        let res = client
            .get(format!("http://{}{}", self.addr, path))
            .send()
            .await
            .expect("Proxy unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), self.handle).await;
    }
}

fn index_payload() -> Value {
    json!({
        "name": "NIFTY 50",
        "data": [
            {"symbol": "NIFTY 50", "open": 22000, "meta": null},
            {"symbol": "HDFCBANK", "open": 1450, "meta": {"isin": "INE040A01034"}},
            {"symbol": "ITC", "open": 430, "meta": {"isin": "INE154A01025"}},
        ]
    })
}

#[tokio::test]
async fn test_stale_session_is_recovered() {
    let api_calls = Arc::new(AtomicUsize::new(0));
    let calls = api_calls.clone();
    let upstream = MockUpstream::start(move |request| {
        if request.is_warmup() {
            return MockReply::status(200, "").with_cookie("bm_sv=token; Path=/");
        }
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            MockReply::status(401, "{}")
        } else {
            MockReply::json(index_payload())
        }
    })
    .await;
    let proxy = RunningProxy::start(upstream.config()).await;

    let (status, body) = proxy.get("/nse/live_market_data/nifty%2050/true").await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"symbols": ["NIFTY 50", "HDFCBANK", "ITC"]}));
    assert_eq!(api_calls.load(Ordering::SeqCst), 2);
    let warmups = upstream.requests().iter().filter(|r| r.is_warmup()).count();
    assert_eq!(warmups, 2, "initial session plus one reset");

    proxy.stop().await;
}

#[tokio::test]
async fn test_persistent_failure_is_service_unavailable() {
    let upstream = MockUpstream::start(|request| {
        if request.is_warmup() {
            MockReply::status(200, "")
        } else {
            MockReply::status(503, "{}")
        }
    })
    .await;
    let proxy = RunningProxy::start(upstream.config()).await;

    let (status, body) = proxy.get("/nse/option_chain_data/NIFTY/true").await;

    assert_eq!(status, 503);
    assert!(body["error"].as_str().unwrap().contains("option_chain unavailable after 2 attempts"));
    let api_calls = upstream.requests().iter().filter(|r| !r.is_warmup()).count();
    assert_eq!(api_calls, 2);

    proxy.stop().await;
}

#[tokio::test]
async fn test_equity_history_steps_back_to_trading_day() {
    // 09-03-2024 and 10-03-2024 fall on a weekend.
    let upstream = MockUpstream::start(|request| {
        if request.is_warmup() {
            MockReply::status(200, "")
        } else if request.path.contains("to=08-03-2024") {
            MockReply::json(json!({"data": [
                {"CH_SYMBOL": "WIPRO", "CH_TIMESTAMP": "2024-03-08", "CH_CLOSING_PRICE": 520.5}
            ]}))
        } else {
            MockReply::json(json!({"data": []}))
        }
    })
    .await;
    let proxy = RunningProxy::start(upstream.config()).await;

    let (status, body) = proxy.get("/get_equity_data/wipro/eq/10-03-2024").await;

    assert_eq!(status, 200);
    assert_eq!(body["previous_day"][0]["CH_TIMESTAMP"], "2024-03-08");
    let history_calls: Vec<_> = upstream
        .requests()
        .into_iter()
        .filter(|r| r.path.starts_with("/api/historical/cm/equity"))
        .collect();
    assert_eq!(history_calls.len(), 3);
    assert!(history_calls[0].path.contains("symbol=WIPRO"));

    proxy.stop().await;
}

#[tokio::test]
async fn test_holiday_calendar_end_to_end() {
    let upstream = MockUpstream::start(|request| {
        if request.is_warmup() {
            MockReply::status(200, "")
        } else {
            MockReply::json(json!({
                "CM": [
                    {"tradingDate": "26-Jan-2024", "description": "Republic Day"},
                    {"tradingDate": "08-Mar-2024", "description": "Mahashivratri", "weekDay": "Friday"},
                ],
                "FO": [{"tradingDate": "26-Jan-2024"}]
            }))
        }
    })
    .await;
    let proxy = RunningProxy::start(upstream.config()).await;

    let (status, body) = proxy.get("/nse/holiday_data/trading").await;

    assert_eq!(status, 200);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["weekDay"], Value::Null);
    assert_eq!(rows[1]["weekDay"], "Friday");

    proxy.stop().await;
}
