// config to load api keys with fallback urls and logging/trading defaults
use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::types::{Config, Credentials, Environment, LogSettings};

pub const DEFAULT_LOG_FILE: &str = "logs/trading_bot.log";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_QUANTITY: f64 = 0.001;
pub const DEFAULT_RECV_WINDOW: u64 = 5000;

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing credentials are left
    /// empty so the shell can ask for them.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sandbox = match get("BINANCE_TESTNET") {
            Some(value) => parse_flag(&value)
                .with_context(|| format!("BINANCE_TESTNET must be true or false, got {:?}", value))?,
            None => true,
        };
        let environment = Environment::from_sandbox_flag(sandbox);

        let recv_window = match get("BINANCE_RECV_WINDOW") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("BINANCE_RECV_WINDOW must be milliseconds, got {:?}", value))?,
            None => DEFAULT_RECV_WINDOW,
        };

        let default_quantity = match get("TRADER_DEFAULT_QUANTITY") {
            Some(value) => {
                let qty = value
                    .parse::<f64>()
                    .with_context(|| format!("TRADER_DEFAULT_QUANTITY must be a number, got {:?}", value))?;
                if !(qty > 0.0) {
                    anyhow::bail!("TRADER_DEFAULT_QUANTITY must be greater than 0");
                }
                qty
            }
            None => DEFAULT_QUANTITY,
        };

        Ok(Config {
            credentials: Credentials::new(
                get("BINANCE_API_KEY").unwrap_or_default(),
                get("BINANCE_API_SECRET").unwrap_or_default(),
            ),
            environment,
            base_url: get("BINANCE_BASE_URL")
                .unwrap_or_else(|| environment.default_base_url().to_string()),
            recv_window,
            default_symbol: get("TRADER_DEFAULT_SYMBOL")
                .map(|s| s.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            default_quantity,
            log: LogSettings {
                file: get("TRADER_LOG_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
                level: get("TRADER_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            },
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
