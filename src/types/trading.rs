use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Order parameters as entered by the operator. Nothing here is trusted until
/// it has been through `validate_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: impl Into<String>, quantity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: OrderKind::Market.name().to_string(),
            quantity,
            price: None,
            stop_price: None,
        }
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: impl Into<String>,
        quantity: f64,
        price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: OrderKind::Limit.name().to_string(),
            quantity,
            price: Some(price),
            stop_price: None,
        }
    }

    pub fn stop_loss_limit(
        symbol: impl Into<String>,
        side: impl Into<String>,
        quantity: f64,
        price: f64,
        stop_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: OrderKind::StopLossLimit.name().to_string(),
            quantity,
            price: Some(price),
            stop_price: Some(stop_price),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Market,
    Limit,
    StopLossLimit,
}

impl OrderKind {
    /// Name used by operators and in logs.
    pub fn name(self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit => "LIMIT",
            OrderKind::StopLossLimit => "STOP_LOSS_LIMIT",
        }
    }

    /// Order `type` understood by the futures endpoint. A futures stop-limit
    /// order is called `STOP` on the wire.
    pub fn wire_type(self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit => "LIMIT",
            OrderKind::StopLossLimit => "STOP",
        }
    }

    pub fn requires_price(self) -> bool {
        !matches!(self, OrderKind::Market)
    }

    pub fn requires_stop_price(self) -> bool {
        matches!(self, OrderKind::StopLossLimit)
    }
}

impl FromStr for OrderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderKind::Market),
            "LIMIT" => Ok(OrderKind::Limit),
            "STOP_LOSS_LIMIT" => Ok(OrderKind::StopLossLimit),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    Gtc,
}

impl TimeInForce {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

/// Exactly the fields sent to the order endpoint, minus auth parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderParams {
    pub symbol: String,
    pub side: Side,
    pub order_type: &'static str,
    pub quantity: f64,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub time_in_force: Option<TimeInForce>,
}

impl NewOrderParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("symbol", self.symbol.clone()),
            ("side", self.side.as_str().to_string()),
            ("type", self.order_type.to_string()),
        ];
        if let Some(tif) = self.time_in_force {
            pairs.push(("timeInForce", tif.as_str().to_string()));
        }
        pairs.push(("quantity", self.quantity.to_string()));
        if let Some(price) = self.price {
            pairs.push(("price", price.to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            pairs.push(("stopPrice", stop_price.to_string()));
        }
        pairs
    }
}

/// Order object returned by the order, cancel, query and open-orders
/// endpoints. Fields the client does not name are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub order_id: u64,
    pub symbol: String,
    pub status: Option<String>,
    pub client_order_id: Option<String>,
    pub side: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub price: Option<String>,
    pub avg_price: Option<String>,
    pub orig_qty: Option<String>,
    pub executed_qty: Option<String>,
    pub cum_quote: Option<String>,
    pub stop_price: Option<String>,
    pub time_in_force: Option<String>,
    pub reduce_only: Option<bool>,
    pub update_time: Option<i64>,
    pub time: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderResult {
    pub fn status_or_pending(&self) -> &str {
        self.status.as_deref().unwrap_or("PENDING")
    }

    /// Latest exchange timestamp on the order, if any.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.update_time
            .or(self.time)
            .and_then(DateTime::from_timestamp_millis)
    }
}
