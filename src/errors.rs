use thiserror::Error;

/// Why an order was refused before anything was sent to the exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid symbol")]
    InvalidSymbol,

    #[error("Side must be BUY or SELL")]
    InvalidSide,

    #[error("Unsupported order type")]
    UnsupportedOrderType,

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Price must be specified and greater than 0 for limit orders")]
    InvalidPrice,

    #[error("Stop price must be specified and greater than 0 for stop-loss orders")]
    InvalidStopPrice,
}

/// Failure reported by the REST connection itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The exchange answered with an error body. `message` is its `msg`, untouched.
    #[error("APIError(code={code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Could not sign request: {0}")]
    Signing(String),
}

// exchange error codes the client distinguishes
pub const INVALID_SYMBOL_CODE: i64 = -1121;
pub const NO_SUCH_ORDER_CODE: i64 = -2013;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Error returned by every trading client operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("API connection failed: {0}")]
    Connection(String),

    #[error("APIError(code={code}): {message}")]
    Exchange { code: i64, message: String },

    #[error("Not found: {0}")]
    Lookup(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TradeError {
    /// Only a failed startup is fatal; everything else returns to the menu.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TradeError::Connection(_))
    }

    pub fn exchange_message(&self) -> Option<&str> {
        match self {
            TradeError::Exchange { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<ApiError> for TradeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected { code, message } => TradeError::Exchange { code, message },
            ApiError::Transport(msg) => TradeError::Transport(msg),
            ApiError::Decode(msg) => TradeError::Decode(msg),
            ApiError::Signing(msg) => TradeError::Transport(msg),
        }
    }
}

impl ApiError {
    /// Maps a rejection with `code` to a lookup failure, everything else as usual.
    pub fn lookup_on(self, code: i64) -> TradeError {
        match self {
            ApiError::Rejected { code: c, message } if c == code => TradeError::Lookup(message),
            other => other.into(),
        }
    }
}
