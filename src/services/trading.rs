use tracing::{debug, error, info, warn};

use crate::errors::{TradeError, INVALID_SYMBOL_CODE, NO_SUCH_ORDER_CODE};
use crate::logging::TradeLog;
use crate::services::exchange::{BinanceFutures, FuturesApi};
use crate::services::validation::validate_order;
use crate::types::{AccountInfo, Config, Environment, OrderRequest, OrderResult};

/// One authenticated exchange session. Every operation is a single request
/// that is awaited before returning; nothing is cached or retried, the
/// exchange stays the source of truth for orders and balances.
pub struct TradingClient<A: FuturesApi = BinanceFutures> {
    api: A,
    environment: Environment,
    log: TradeLog,
}

impl TradingClient<BinanceFutures> {
    /// Builds the REST session from config and checks it works.
    pub async fn connect(config: &Config, log: TradeLog) -> Result<Self, TradeError> {
        if !config.credentials.is_complete() {
            log.in_scope(|| error!("Failed to initialize client: API key and secret are required"));
            return Err(TradeError::Connection(
                "API key and secret are required".to_string(),
            ));
        }

        let api = BinanceFutures::new(config).map_err(|e| {
            log.in_scope(|| error!("Failed to initialize client: {}", e));
            TradeError::Connection(e.to_string())
        })?;

        log.in_scope(|| {
            info!(
                "Connecting to {} futures API at {}",
                config.environment,
                api.base_url()
            )
        });

        Self::establish(api, config.environment, log).await
    }
}

impl<A: FuturesApi> TradingClient<A> {
    /// Wraps an API handle and runs the liveness check. A session that fails
    /// the check is never handed out.
    pub async fn establish(api: A, environment: Environment, log: TradeLog) -> Result<Self, TradeError> {
        match api.account().await {
            Ok(account) => {
                log.in_scope(|| {
                    info!("API connection successful");
                    debug!(
                        "Liveness check: wallet balance {} USDT",
                        account.total_wallet_balance
                    );
                });
                Ok(Self { api, environment, log })
            }
            Err(e) => {
                log.in_scope(|| error!("API connection failed: {}", e));
                Err(TradeError::Connection(e.to_string()))
            }
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub async fn get_account_snapshot(&self) -> Result<AccountInfo, TradeError> {
        self.log.in_scope(|| info!("Fetching account information..."));

        match self.api.account().await {
            Ok(account) => {
                self.log.in_scope(|| {
                    info!("Total Balance: {} USDT", account.total_wallet_balance);
                    info!("Available Balance: {} USDT", account.available_balance);
                    info!("Unrealized PnL: {} USDT", account.total_unrealized_profit);
                });
                Ok(account)
            }
            Err(e) => Err(self.failed("getting account info", e.into())),
        }
    }

    pub async fn get_price(&self, symbol: &str) -> Result<f64, TradeError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.log.in_scope(|| info!("Fetching price for {}...", symbol));

        match self.api.ticker_price(&symbol).await {
            Ok(ticker) => {
                self.log
                    .in_scope(|| info!("Current price for {}: {}", symbol, ticker.price));
                Ok(ticker.price)
            }
            Err(e) => Err(self.failed(
                &format!("getting price for {}", symbol),
                e.lookup_on(INVALID_SYMBOL_CODE),
            )),
        }
    }

    /// Validates `request` and, only if it passes, sends exactly one order.
    pub async fn place_order(&self, request: &OrderRequest) -> Result<OrderResult, TradeError> {
        let order = match validate_order(request) {
            Ok(order) => order,
            Err(reason) => {
                self.log.in_scope(|| {
                    warn!(
                        "Rejected {} {} order for {:?}: {}",
                        request.order_type, request.side, request.symbol, reason
                    )
                });
                return Err(reason.into());
            }
        };

        self.log.in_scope(|| {
            info!(
                "Placing {} {} order: {} {}",
                order.kind(),
                order.side(),
                order.quantity(),
                order.symbol()
            );
            match (order.price(), order.stop_price()) {
                (Some(price), Some(stop)) => info!("Stop Price: {}, Limit Price: {}", stop, price),
                (Some(price), None) => info!("Limit Price: {}", price),
                _ => {}
            }
        });

        match self.api.new_order(&order.to_params()).await {
            Ok(result) => {
                self.log.in_scope(|| {
                    info!(
                        "{} order placed successfully: {} ({})",
                        order.kind(),
                        result.order_id,
                        result.status_or_pending()
                    )
                });
                Ok(result)
            }
            Err(e) => Err(self.failed(
                &format!(
                    "placing {} {} order for {} {}",
                    order.kind(),
                    order.side(),
                    order.quantity(),
                    order.symbol()
                ),
                e.into(),
            )),
        }
    }

    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: f64,
    ) -> Result<OrderResult, TradeError> {
        self.place_order(&OrderRequest::market(symbol, side, quantity))
            .await
    }

    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: f64,
        price: f64,
    ) -> Result<OrderResult, TradeError> {
        self.place_order(&OrderRequest::limit(symbol, side, quantity, price))
            .await
    }

    pub async fn place_stop_loss_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: f64,
        price: f64,
        stop_price: f64,
    ) -> Result<OrderResult, TradeError> {
        self.place_order(&OrderRequest::stop_loss_limit(
            symbol, side, quantity, price, stop_price,
        ))
        .await
    }

    pub async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<OrderResult, TradeError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.log
            .in_scope(|| info!("Cancelling order {} for {}", order_id, symbol));

        match self.api.cancel_order(&symbol, order_id).await {
            Ok(result) => {
                self.log
                    .in_scope(|| info!("Order {} cancelled successfully", order_id));
                Ok(result)
            }
            Err(e) => Err(self.failed(&format!("cancelling order {} for {}", order_id, symbol), e.into())),
        }
    }

    pub async fn get_order_status(&self, symbol: &str, order_id: u64) -> Result<OrderResult, TradeError> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.log
            .in_scope(|| info!("Checking status of order {} for {}", order_id, symbol));

        match self.api.query_order(&symbol, order_id).await {
            Ok(order) => {
                self.log
                    .in_scope(|| info!("Order {} status: {}", order_id, order.status_or_pending()));
                Ok(order)
            }
            Err(e) => Err(self.failed(
                &format!("getting status of order {} for {}", order_id, symbol),
                e.lookup_on(NO_SUCH_ORDER_CODE),
            )),
        }
    }

    pub async fn list_open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderResult>, TradeError> {
        let symbol = symbol
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty());
        self.log.in_scope(|| match &symbol {
            Some(s) => info!("Fetching open orders for {}...", s),
            None => info!("Fetching open orders..."),
        });

        match self.api.open_orders(symbol.as_deref()).await {
            Ok(orders) => {
                self.log.in_scope(|| match &symbol {
                    Some(s) => info!("Retrieved {} open orders for {}", orders.len(), s),
                    None => info!("Retrieved {} open orders", orders.len()),
                });
                Ok(orders)
            }
            Err(e) => Err(self.failed("getting open orders", e.into())),
        }
    }

    fn failed(&self, operation: &str, err: TradeError) -> TradeError {
        self.log.in_scope(|| match &err {
            TradeError::Exchange { code, message } => {
                error!("Exchange rejected {}: code={} msg={}", operation, code, message)
            }
            other => error!("Error {}: {}", operation, other),
        });
        err
    }
}

