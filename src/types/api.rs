use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub environment: String,
}

// exchange error body: {"code": -2011, "msg": "Unknown order sent."}
#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(deserialize_with = "f64_from_str")]
    pub price: f64,
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(deserialize_with = "f64_from_str")]
    pub total_wallet_balance: f64,
    #[serde(deserialize_with = "f64_from_str")]
    pub available_balance: f64,
    #[serde(default, deserialize_with = "f64_from_str_or_zero")]
    pub total_unrealized_profit: f64,
    #[serde(default, deserialize_with = "f64_from_str_or_zero")]
    pub total_margin_balance: f64,
    #[serde(default)]
    pub can_trade: Option<bool>,
    #[serde(default)]
    pub assets: Vec<AssetBalance>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub asset: String,
    #[serde(deserialize_with = "f64_from_str")]
    pub wallet_balance: f64,
    #[serde(default, deserialize_with = "f64_from_str_or_zero")]
    pub available_balance: f64,
    #[serde(default, deserialize_with = "f64_from_str_or_zero")]
    pub unrealized_profit: f64,
}

impl AccountInfo {
    /// Assets holding a non-zero wallet balance.
    pub fn funded_assets(&self) -> impl Iterator<Item = &AssetBalance> {
        self.assets.iter().filter(|a| a.wallet_balance.abs() > 0.0)
    }
}

// the exchange sends decimals as strings ("15000.00000000")
fn f64_from_str<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(f64),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Decimal::Number(n) => Ok(n),
    }
}

fn f64_from_str_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().map_err(serde::de::Error::custom),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a decimal, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_decodes_string_decimals() {
        let body = r#"{
            "totalWalletBalance": "15000.00000000",
            "availableBalance": "14250.50000000",
            "totalUnrealizedProfit": "-12.25000000",
            "totalMarginBalance": "14987.75000000",
            "canTrade": true,
            "assets": [
                {"asset": "USDT", "walletBalance": "15000.0", "availableBalance": "14250.5", "unrealizedProfit": "-12.25"},
                {"asset": "BNB", "walletBalance": "0.00000000"}
            ],
            "positions": []
        }"#;

        let account: AccountInfo = serde_json::from_str(body).unwrap();
        assert_eq!(account.total_wallet_balance, 15000.0);
        assert_eq!(account.available_balance, 14250.5);
        assert_eq!(account.total_unrealized_profit, -12.25);
        assert_eq!(account.can_trade, Some(true));

        let funded: Vec<_> = account.funded_assets().map(|a| a.asset.as_str()).collect();
        assert_eq!(funded, vec!["USDT"]);
    }

    #[test]
    fn test_account_missing_pnl_defaults_to_zero() {
        let body = r#"{"totalWalletBalance": "10", "availableBalance": "10"}"#;
        let account: AccountInfo = serde_json::from_str(body).unwrap();
        assert_eq!(account.total_unrealized_profit, 0.0);
        assert!(account.assets.is_empty());
    }

    #[test]
    fn test_ticker_rejects_garbage_price() {
        let body = r#"{"symbol": "BTCUSDT", "price": "not-a-number"}"#;
        assert!(serde_json::from_str::<TickerPrice>(body).is_err());
    }
}
