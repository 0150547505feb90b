use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::errors::ApiError;
use crate::services::signing::sign_query;
use crate::types::*;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// The exchange endpoints the trading client relies on. Implemented by the
/// REST handle below and by in-memory fakes in tests.
#[async_trait]
pub trait FuturesApi: Send + Sync {
    async fn account(&self) -> Result<AccountInfo, ApiError>;

    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ApiError>;

    async fn new_order(&self, params: &NewOrderParams) -> Result<OrderResult, ApiError>;

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError>;

    async fn query_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError>;

    /// Open orders for one symbol, or for every symbol when `None`.
    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderResult>, ApiError>;
}

#[derive(Clone)]
pub struct BinanceFutures {
    client: Client,
    base_url: String,
    credentials: Credentials,
    environment: Environment,
    recv_window: u64,
}

impl BinanceFutures {
    // client initialization
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            environment: config.environment,
            recv_window: config.recv_window,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn signed_query(&self, params: &[(&str, String)]) -> Result<String, ApiError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.signed_query_at(params, timestamp)
    }

    fn signed_query_at(&self, params: &[(&str, String)], timestamp: i64) -> Result<String, ApiError> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query.append_pair("recvWindow", &self.recv_window.to_string());
        query.append_pair("timestamp", &timestamp.to_string());
        let query = query.finish();

        let signature = sign_query(&query, &self.credentials.api_secret)?;
        Ok(format!("{}&signature={}", query, signature))
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params)?);

        let response = self
            .client
            .request(method, &url)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }

    async fn send_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }
}

#[async_trait]
impl FuturesApi for BinanceFutures {
    async fn account(&self) -> Result<AccountInfo, ApiError> {
        self.send_signed(Method::GET, "/fapi/v2/account", &[]).await
    }

    async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ApiError> {
        self.send_public("/fapi/v1/ticker/price", &[("symbol", symbol.to_string())])
            .await
    }

    async fn new_order(&self, params: &NewOrderParams) -> Result<OrderResult, ApiError> {
        self.send_signed(Method::POST, "/fapi/v1/order", &params.query_pairs())
            .await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError> {
        let params = [("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.send_signed(Method::DELETE, "/fapi/v1/order", &params).await
    }

    async fn query_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, ApiError> {
        let params = [("symbol", symbol.to_string()), ("orderId", order_id.to_string())];
        self.send_signed(Method::GET, "/fapi/v1/order", &params).await
    }

    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderResult>, ApiError> {
        let params: Vec<(&str, String)> = symbol
            .map(|s| vec![("symbol", s.to_string())])
            .unwrap_or_default();
        self.send_signed(Method::GET, "/fapi/v1/openOrders", &params).await
    }
}

/// Turns a response into `T`, or into the exchange's own error when the body
/// is an error object.
pub fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if let Ok(err) = serde_json::from_str::<ApiErrorBody>(body) {
        if !status.is_success() || err.code < 0 {
            return Err(ApiError::Rejected {
                code: err.code,
                message: err.msg,
            });
        }
    }

    if !status.is_success() {
        return Err(ApiError::Transport(format!("HTTP {}: {}", status, body.trim())));
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            credentials: Credentials::new("test_key", "test_secret"),
            environment: Environment::Testnet,
            base_url: "https://testnet.binancefuture.com/".to_string(),
            recv_window: 5000,
            default_symbol: "BTCUSDT".to_string(),
            default_quantity: 0.001,
            log: LogSettings {
                file: PathBuf::from("logs/test.log"),
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = BinanceFutures::new(&test_config()).unwrap();
        assert_eq!(api.base_url(), "https://testnet.binancefuture.com");
        assert_eq!(api.environment(), Environment::Testnet);
    }

    #[test]
    fn test_signed_query_layout() {
        let api = BinanceFutures::new(&test_config()).unwrap();
        let params = NewOrderParams {
            symbol: "BTCUSDT".to_string(),
            side: Side::Buy,
            order_type: "MARKET",
            quantity: 0.001,
            price: None,
            stop_price: None,
            time_in_force: None,
        };

        let query = api.signed_query_at(&params.query_pairs(), 1_700_000_000_000).unwrap();
        let (unsigned, signature) = query.split_once("&signature=").unwrap();

        assert_eq!(
            unsigned,
            "symbol=BTCUSDT&side=BUY&type=MARKET&quantity=0.001&recvWindow=5000&timestamp=1700000000000"
        );
        assert_eq!(signature, sign_query(unsigned, "test_secret").unwrap());
    }

    #[test]
    fn test_decode_error_body_keeps_message() {
        let body = r#"{"code":-2011,"msg":"Unknown order sent."}"#;
        let result: Result<OrderResult, _> = decode_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            result.unwrap_err(),
            ApiError::Rejected { code: -2011, message: "Unknown order sent.".to_string() }
        );
    }

    #[test]
    fn test_decode_non_json_failure() {
        let result: Result<TickerPrice, _> =
            decode_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(result, Err(ApiError::Transport(msg)) if msg.contains("502")));
    }

    #[test]
    fn test_decode_order_preserves_unknown_fields() {
        let body = r#"{
            "orderId": 4055928391,
            "symbol": "BTCUSDT",
            "status": "NEW",
            "clientOrderId": "abc123",
            "price": "50000.00",
            "avgPrice": "0.00",
            "origQty": "0.010",
            "executedQty": "0.000",
            "cumQuote": "0.00000",
            "timeInForce": "GTC",
            "type": "LIMIT",
            "reduceOnly": false,
            "side": "SELL",
            "stopPrice": "0.00",
            "workingType": "CONTRACT_PRICE",
            "positionSide": "BOTH",
            "updateTime": 1700000000123
        }"#;

        let order: OrderResult = decode_body(StatusCode::OK, body).unwrap();
        assert_eq!(order.order_id, 4055928391);
        assert_eq!(order.order_type.as_deref(), Some("LIMIT"));
        assert_eq!(order.time_in_force.as_deref(), Some("GTC"));
        assert_eq!(order.extra.get("positionSide").and_then(|v| v.as_str()), Some("BOTH"));
        assert_eq!(order.timestamp().unwrap().timestamp_millis(), 1700000000123);
    }
}
