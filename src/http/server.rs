//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every market-data route
//! - Wire up middleware (timeout, request ID, tracing, CORS, metrics)
//! - Translate path parameters into upstream client calls
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    error_handling::HandleErrorLayer,
    extract::{MatchedPath, Path, Request, State},
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Json, Router,
};
use chrono::NaiveDate;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, ProxyConfig};
use crate::http::request::{request_id_of, RequestIdMaker, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::upstream::endpoints::DATE_FORMAT;
use crate::upstream::keys::supported_keys;
use crate::upstream::{LiveMarket, ResultSet, UpstreamClient};

/// Index served by the fixed `nifty_50` route.
const NIFTY_50: &str = "NIFTY 50";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<UpstreamClient>,
}

/// HTTP server for the market-data proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `client`.
    pub fn new(config: ProxyConfig, client: Arc<UpstreamClient>) -> Self {
        let router = Self::build_router(&config, AppState { client });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let deadline = Duration::from_secs(config.timeouts.request_secs);

        Router::new()
            .route("/nse/pre_market_data/{key}", get(pre_market))
            .route("/nse/live_market_data/nifty_50", get(nifty_50))
            .route("/nse/live_market_data/{key}/{symbol_list}", get(live_market))
            .route("/nse/holiday_data/{key}", get(holiday))
            .route("/nse/option_chain_data/{symbol}/{indices}", get(option_chain))
            .route("/get_equity_data/{symbol}/{series}/{date}", get(equity_history))
            .route("/nse/keys", get(keys))
            .route("/health", get(health))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestIdMaker))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id_of(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(cors_layer(&config.cors))
                    .layer(HandleErrorLayer::new(move |error: BoxError| async move {
                        middleware_error(error, deadline)
                    }))
                    .timeout(deadline),
            )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };
    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(origin)
}

/// Turn a failure from the service stack into a JSON error response.
fn middleware_error(error: BoxError, deadline: Duration) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout(deadline)
    } else {
        ApiError::Internal(error.to_string())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}

/// `"true"` in any letter case.
fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

async fn pre_market(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ResultSet>, ApiError> {
    Ok(Json(state.client.pre_market(&key).await?))
}

async fn live_market(
    State(state): State<AppState>,
    Path((key, symbol_list)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let market = state.client.live_market(&key, flag(&symbol_list)).await?;
    Ok(live_market_response(market))
}

async fn nifty_50(State(state): State<AppState>) -> Result<Response, ApiError> {
    let market = state.client.live_market(NIFTY_50, false).await?;
    Ok(live_market_response(market))
}

fn live_market_response(market: LiveMarket) -> Response {
    match market {
        LiveMarket::Records(records) => Json(records).into_response(),
        LiveMarket::Symbols(symbols) => Json(json!({ "symbols": symbols })).into_response(),
    }
}

async fn holiday(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ResultSet>, ApiError> {
    Ok(Json(state.client.holiday(&key).await?))
}

async fn option_chain(
    State(state): State<AppState>,
    Path((symbol, indices)): Path<(String, String)>,
) -> Result<Json<ResultSet>, ApiError> {
    Ok(Json(state.client.option_chain(&symbol, flag(&indices)).await?))
}

async fn equity_history(
    State(state): State<AppState>,
    Path((symbol, series, date)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| {
        ApiError::BadRequest(format!("invalid date '{}', expected DD-MM-YYYY", date))
    })?;
    let records = state.client.equity_history(&symbol, &series, date).await?;
    Ok(Json(json!({ "previous_day": records })).into_response())
}

async fn keys() -> impl IntoResponse {
    Json(supported_keys())
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
