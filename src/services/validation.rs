use crate::errors::ValidationError;
use crate::types::{NewOrderParams, OrderKind, OrderRequest, Side, TimeInForce};

const MIN_SYMBOL_LEN: usize = 3;

/// An order that passed `validate_order`. Only this type can be turned into
/// exchange parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    symbol: String,
    side: Side,
    kind: OrderKind,
    quantity: f64,
    price: Option<f64>,
    stop_price: Option<f64>,
}

impl ValidatedOrder {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.stop_price
    }

    /// Market orders carry no price, stop price or time-in-force. Resting
    /// orders are good-till-cancelled.
    pub fn to_params(&self) -> NewOrderParams {
        let (price, stop_price, time_in_force) = match self.kind {
            OrderKind::Market => (None, None, None),
            OrderKind::Limit => (self.price, None, Some(TimeInForce::Gtc)),
            OrderKind::StopLossLimit => (self.price, self.stop_price, Some(TimeInForce::Gtc)),
        };

        NewOrderParams {
            symbol: self.symbol.clone(),
            side: self.side,
            order_type: self.kind.wire_type(),
            quantity: self.quantity,
            price,
            stop_price,
            time_in_force,
        }
    }
}

/// Checks an order request in a fixed order and reports the first problem.
/// Pure: no I/O, no logging.
pub fn validate_order(request: &OrderRequest) -> Result<ValidatedOrder, ValidationError> {
    let symbol = request.symbol.trim();
    if symbol.chars().count() < MIN_SYMBOL_LEN {
        return Err(ValidationError::InvalidSymbol);
    }

    let side: Side = request
        .side
        .parse()
        .map_err(|_| ValidationError::InvalidSide)?;

    let kind: OrderKind = request
        .order_type
        .parse()
        .map_err(|_| ValidationError::UnsupportedOrderType)?;

    // written so that NaN fails too
    if !(request.quantity > 0.0 && request.quantity.is_finite()) {
        return Err(ValidationError::InvalidQuantity);
    }

    let price = if kind.requires_price() {
        Some(positive(request.price).ok_or(ValidationError::InvalidPrice)?)
    } else {
        None
    };

    let stop_price = if kind.requires_stop_price() {
        Some(positive(request.stop_price).ok_or(ValidationError::InvalidStopPrice)?)
    } else {
        None
    };

    Ok(ValidatedOrder {
        symbol: symbol.to_ascii_uppercase(),
        side,
        kind,
        quantity: request.quantity,
        price,
        stop_price,
    })
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0 && v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_order_accepted() {
        let order = validate_order(&OrderRequest::market("btcusdt", "buy", 0.001)).unwrap();
        assert_eq!(order.symbol(), "BTCUSDT");
        assert_eq!(order.side(), Side::Buy);
        assert_eq!(order.kind(), OrderKind::Market);
        assert_eq!(order.price(), None);
    }

    #[test]
    fn test_market_order_ignores_stray_price() {
        let mut request = OrderRequest::market("BTCUSDT", "SELL", 1.0);
        request.price = Some(-5.0);
        request.stop_price = Some(10.0);

        let params = validate_order(&request).unwrap().to_params();
        assert_eq!(params.price, None);
        assert_eq!(params.stop_price, None);
        assert_eq!(params.time_in_force, None);
    }

    #[test]
    fn test_checks_run_in_order() {
        // both symbol and quantity are bad; symbol is reported
        let request = OrderRequest::market("BT", "BUY", 0.0);
        assert_eq!(validate_order(&request), Err(ValidationError::InvalidSymbol));

        let request = OrderRequest::market("BTCUSDT", "HOLD", 0.0);
        assert_eq!(validate_order(&request), Err(ValidationError::InvalidSide));
    }

    #[test]
    fn test_unknown_order_type() {
        let mut request = OrderRequest::market("BTCUSDT", "BUY", 1.0);
        request.order_type = "OCO".to_string();
        assert_eq!(validate_order(&request), Err(ValidationError::UnsupportedOrderType));

        request.order_type = "stop_loss_limit".to_string();
        request.price = Some(100.0);
        request.stop_price = Some(101.0);
        assert!(validate_order(&request).is_ok());
    }

    #[test]
    fn test_nan_quantity_rejected() {
        let request = OrderRequest::market("BTCUSDT", "BUY", f64::NAN);
        assert_eq!(validate_order(&request), Err(ValidationError::InvalidQuantity));
    }

    #[test]
    fn test_stop_loss_needs_stop_price() {
        let mut request = OrderRequest::stop_loss_limit("ETHUSDT", "SELL", 0.5, 1800.0, 1850.0);
        request.stop_price = None;
        assert_eq!(validate_order(&request), Err(ValidationError::InvalidStopPrice));

        request.stop_price = Some(0.0);
        assert_eq!(validate_order(&request), Err(ValidationError::InvalidStopPrice));
    }

    #[test]
    fn test_stop_loss_params() {
        let request = OrderRequest::stop_loss_limit("ETHUSDT", "sell", 0.5, 1800.0, 1850.0);
        let params = validate_order(&request).unwrap().to_params();

        assert_eq!(params.order_type, "STOP");
        assert_eq!(params.time_in_force, Some(TimeInForce::Gtc));
        assert_eq!(
            params.query_pairs(),
            vec![
                ("symbol", "ETHUSDT".to_string()),
                ("side", "SELL".to_string()),
                ("type", "STOP".to_string()),
                ("timeInForce", "GTC".to_string()),
                ("quantity", "0.5".to_string()),
                ("price", "1800".to_string()),
                ("stopPrice", "1850".to_string()),
            ]
        );
    }
}
