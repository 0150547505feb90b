use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    errors::TradeError,
    services::{BinanceFutures, FuturesApi, TradingClient},
    types::*,
};

/// One session shared by all requests; the mutex keeps calls strictly one
/// at a time, same as the interactive shell.
pub struct AppState<A: FuturesApi = BinanceFutures> {
    pub client: Arc<Mutex<TradingClient<A>>>,
}

impl<A: FuturesApi> AppState<A> {
    pub fn new(client: TradingClient<A>) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
        }
    }
}

impl<A: FuturesApi> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn error_response(err: TradeError) -> (StatusCode, String) {
    let status = match &err {
        TradeError::Validation(_) => StatusCode::BAD_REQUEST,
        TradeError::Lookup(_) => StatusCode::NOT_FOUND,
        TradeError::Exchange { .. } => StatusCode::BAD_GATEWAY,
        TradeError::Connection(_) | TradeError::Transport(_) | TradeError::Decode(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, err.to_string())
}

// health check
pub async fn health<A: FuturesApi>(State(state): State<AppState<A>>) -> Json<HealthResponse> {
    let environment = state.client.lock().await.environment().to_string();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp() as u64,
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment,
    })
}

// wallet, available balance and unrealized pnl
pub async fn get_account<A: FuturesApi>(State(state): State<AppState<A>>) -> ApiResult<AccountInfo> {
    let client = state.client.lock().await;
    client
        .get_account_snapshot()
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_price<A: FuturesApi>(
    State(state): State<AppState<A>>,
    Path(symbol): Path<String>,
) -> ApiResult<TickerPrice> {
    let client = state.client.lock().await;
    let price = client.get_price(&symbol).await.map_err(error_response)?;
    Ok(Json(TickerPrice {
        symbol: symbol.to_ascii_uppercase(),
        price,
        time: Some(chrono::Utc::now().timestamp_millis()),
    }))
}

#[derive(Deserialize)]
pub struct OpenOrdersQuery {
    pub symbol: Option<String>,
}

pub async fn get_open_orders<A: FuturesApi>(
    State(state): State<AppState<A>>,
    Query(query): Query<OpenOrdersQuery>,
) -> ApiResult<Vec<OrderResult>> {
    let client = state.client.lock().await;
    client
        .list_open_orders(query.symbol.as_deref())
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_order<A: FuturesApi>(
    State(state): State<AppState<A>>,
    Path((symbol, order_id)): Path<(String, u64)>,
) -> ApiResult<OrderResult> {
    let client = state.client.lock().await;
    client
        .get_order_status(&symbol, order_id)
        .await
        .map(Json)
        .map_err(error_response)
}
