#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures_trader::{
    errors::ApiError,
    services::FuturesApi,
    types::{AccountInfo, AssetBalance, NewOrderParams, OrderResult, TickerPrice},
};
use serde_json::json;

/// Every request the fake exchange received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Account,
    Ticker(String),
    NewOrder(NewOrderParams),
    Cancel(String, u64),
    Query(String, u64),
    OpenOrders(Option<String>),
}

#[derive(Default)]
struct Book {
    calls: Vec<Call>,
    orders: BTreeMap<u64, OrderResult>,
    next_id: u64,
    account_down: bool,
    reject_orders: Option<ApiError>,
}

/// In-memory exchange. Clones share state, so a test keeps one handle to
/// inspect calls after giving the other to a `TradingClient`.
#[derive(Clone, Default)]
pub struct FakeExchange {
    book: Arc<Mutex<Book>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.book.lock().unwrap().next_id = 1000;
        fake
    }

    /// The account endpoint answers with a transport failure.
    pub fn unreachable() -> Self {
        let fake = Self::new();
        fake.book.lock().unwrap().account_down = true;
        fake
    }

    pub fn reject_orders_with(&self, code: i64, message: &str) {
        self.book.lock().unwrap().reject_orders = Some(ApiError::Rejected {
            code,
            message: message.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.book.lock().unwrap().calls.clone()
    }

    pub fn placed(&self) -> Vec<NewOrderParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::NewOrder(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.book.lock().unwrap().calls.push(call);
    }
}

fn price_of(symbol: &str) -> Option<f64> {
    match symbol {
        "BTCUSDT" => Some(50_000.0),
        "ETHUSDT" => Some(3_000.0),
        "ADAUSDT" => Some(0.45),
        "SOLUSDT" => Some(150.0),
        _ => None,
    }
}

fn unknown_order() -> ApiError {
    ApiError::Rejected {
        code: -2011,
        message: "Unknown order sent.".to_string(),
    }
}

fn missing_order() -> ApiError {
    ApiError::Rejected {
        code: -2013,
        message: "Order does not exist.".to_string(),
    }
}

fn invalid_symbol() -> ApiError {
    ApiError::Rejected {
        code: -1121,
        message: "Invalid symbol.".to_string(),
    }
}

fn order_result(id: u64, params: &NewOrderParams) -> OrderResult {
    let status = if params.order_type == "MARKET" { "FILLED" } else { "NEW" };
    serde_json::from_value(json!({
        "orderId": id,
        "symbol": params.symbol,
        "status": status,
        "clientOrderId": format!("fake-{}", id),
        "side": params.side.as_str(),
        "type": params.order_type,
        "price": params.price.unwrap_or(0.0).to_string(),
        "origQty": params.quantity.to_string(),
        "executedQty": "0",
        "stopPrice": params.stop_price.unwrap_or(0.0).to_string(),
        "timeInForce": params.time_in_force.map(|t| t.as_str()).unwrap_or("GTC"),
        "updateTime": 1_700_000_000_000i64,
        "positionSide": "BOTH"
    }))
    .unwrap()
}

#[async_trait]
impl FuturesApi for FakeExchange {
    async fn account(&self) -> Result<AccountInfo, ApiError> {
        self.record(Call::Account);
        if self.book.lock().unwrap().account_down {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(AccountInfo {
            total_wallet_balance: 15_000.0,
            available_balance: 14_250.5,
            total_unrealized_profit: -12.25,
            total_margin_balance: 14_987.75,
            can_trade: Some(true),
            assets: vec![AssetBalance {
                asset: "USDT".to_string(),
                wallet_balance: 15_000.0,
                available_balance: 14_250.5,
                unrealized_profit: -12.25,
            }],
        })
    }

    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ApiError> {
        self.record(Call::Ticker(symbol.to_string()));
        let price = price_of(symbol).ok_or_else(invalid_symbol)?;
        Ok(TickerPrice {
            symbol: symbol.to_string(),
            price,
            time: None,
        })
    }

    async fn new_order(&self, params: &NewOrderParams) -> Result<OrderResult, ApiError> {
        self.record(Call::NewOrder(params.clone()));
        let mut book = self.book.lock().unwrap();
        if let Some(err) = book.reject_orders.clone() {
            return Err(err);
        }
        if price_of(&params.symbol).is_none() {
            return Err(invalid_symbol());
        }
        book.next_id += 1;
        let order = order_result(book.next_id, params);
        book.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError> {
        self.record(Call::Cancel(symbol.to_string(), order_id));
        let mut book = self.book.lock().unwrap();
        match book.orders.get_mut(&order_id) {
            Some(order) if order.symbol == symbol && order.status.as_deref() == Some("NEW") => {
                order.status = Some("CANCELED".to_string());
                Ok(order.clone())
            }
            _ => Err(unknown_order()),
        }
    }

    async fn query_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError> {
        self.record(Call::Query(symbol.to_string(), order_id));
        let book = self.book.lock().unwrap();
        book.orders
            .get(&order_id)
            .filter(|order| order.symbol == symbol)
            .cloned()
            .ok_or_else(missing_order)
    }

    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderResult>, ApiError> {
        self.record(Call::OpenOrders(symbol.map(str::to_string)));
        let book = self.book.lock().unwrap();
        Ok(book
            .orders
            .values()
            .filter(|order| order.status.as_deref() == Some("NEW"))
            .filter(|order| symbol.map_or(true, |s| order.symbol == s))
            .cloned()
            .collect())
    }
}
