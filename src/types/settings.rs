use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Testnet,
    Production,
}

impl Environment {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox { Environment::Testnet } else { Environment::Production }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Environment::Testnet => "https://testnet.binancefuture.com",
            Environment::Production => "https://fapi.binance.com",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Testnet => f.write_str("testnet"),
            Environment::Production => f.write_str("production"),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }
}

// never print the secret
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***")
            .finish()
    }
}

fn mask(key: &str) -> String {
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", key.chars().take(6).collect::<String>())
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub file: PathBuf,
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub environment: Environment,
    pub base_url: String,
    pub recv_window: u64,
    pub default_symbol: String,
    pub default_quantity: f64,
    pub log: LogSettings,
}
