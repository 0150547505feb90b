use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use thiserror::Error;

use crate::{
    errors::TradeError,
    services::{validate_order, FuturesApi, TradingClient},
    types::{AccountInfo, Credentials, OrderRequest, OrderResult},
};

const QUICK_SYMBOLS: [(&str, &str); 4] = [
    ("1", "BTCUSDT"),
    ("2", "ETHUSDT"),
    ("3", "ADAUSDT"),
    ("4", "SOLUSDT"),
];

#[derive(Error, Debug)]
enum ShellError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0}")]
    Trade(#[from] TradeError),
}

type Step = Result<(), ShellError>;

/// Numbered-menu front end. Reads answers from `input`, writes everything
/// the operator sees to `out`.
pub struct Shell<R, W> {
    input: R,
    out: W,
    default_symbol: String,
    default_quantity: f64,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, out: W, default_symbol: &str, default_quantity: f64) -> Self {
        Self {
            input,
            out,
            default_symbol: default_symbol.to_string(),
            default_quantity,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn print_banner(&mut self, environment: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "╔══════════════════════════════════════════════╗")?;
        writeln!(self.out, "║            FUTURES TRADING CLIENT            ║")?;
        writeln!(self.out, "╠══════════════════════════════════════════════╣")?;
        writeln!(self.out, "║ Environment: {:<31} ║", environment)?;
        writeln!(self.out, "║ Orders: market, limit, stop-loss limit       ║")?;
        writeln!(self.out, "╚══════════════════════════════════════════════╝")?;
        Ok(())
    }

    /// Fills in whatever the environment did not provide.
    pub fn prompt_credentials(&mut self, mut credentials: Credentials) -> io::Result<Credentials> {
        if credentials.api_key.trim().is_empty() {
            writeln!(self.out, "Enter your exchange API credentials:")?;
            credentials.api_key = self.ask_text("API Key", None)?;
        }
        if credentials.api_secret.trim().is_empty() {
            credentials.api_secret = self.ask_text("API Secret", None)?;
        }
        Ok(credentials)
    }

    /// Runs the menu until the operator exits or input ends. Recoverable
    /// trading errors are shown and the menu comes back.
    pub async fn run<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> io::Result<()> {
        loop {
            self.print_menu()?;

            let choice = match self.ask_text("Select an option", None) {
                Ok(choice) => choice,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            };

            let step = match choice.as_str() {
                "1" => self.show_account(client).await,
                "2" => self.show_price(client).await,
                "3" => self.market_order(client).await,
                "4" => self.limit_order(client).await,
                "5" => self.stop_loss_order(client).await,
                "6" => self.open_orders(client).await,
                "7" => self.cancel_order(client).await,
                "8" => self.order_status(client).await,
                "9" => self.quick_trade(client).await,
                "0" => break,
                _ => writeln!(self.out, "Invalid option. Please try again.").map_err(Into::into),
            };

            match step {
                Ok(()) => {}
                Err(ShellError::Trade(e)) if e.is_recoverable() => self.report(&e)?,
                Err(ShellError::Trade(e)) => {
                    return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
                }
                Err(ShellError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(ShellError::Io(e)) => return Err(e),
            }

            if !self.pause()? {
                break;
            }
        }

        self.farewell(client).await
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "┌─────────────────────────────────┐")?;
        writeln!(self.out, "│          TRADING MENU           │")?;
        writeln!(self.out, "├─────────────────────────────────┤")?;
        writeln!(self.out, "│  1. View Account Info           │")?;
        writeln!(self.out, "│  2. Get Symbol Price            │")?;
        writeln!(self.out, "│  3. Place Market Order          │")?;
        writeln!(self.out, "│  4. Place Limit Order           │")?;
        writeln!(self.out, "│  5. Place Stop-Loss Limit Order │")?;
        writeln!(self.out, "│  6. View Open Orders            │")?;
        writeln!(self.out, "│  7. Cancel Order                │")?;
        writeln!(self.out, "│  8. Check Order Status          │")?;
        writeln!(self.out, "│  9. Quick Trade (Market)        │")?;
        writeln!(self.out, "│  0. Exit                        │")?;
        writeln!(self.out, "└─────────────────────────────────┘")?;
        Ok(())
    }

    fn report(&mut self, err: &TradeError) -> io::Result<()> {
        match err {
            TradeError::Validation(reason) => writeln!(self.out, "Invalid order: {}", reason),
            other => writeln!(self.out, "Error: {}", other),
        }
    }

    // false once input has ended
    fn pause(&mut self) -> io::Result<bool> {
        write!(self.out, "\nPress Enter to continue...")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        writeln!(self.out, "\n{}", "=".repeat(60))?;
        Ok(true)
    }

    async fn farewell<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> io::Result<()> {
        writeln!(self.out, "Thank you for using the futures trading client!")?;
        writeln!(self.out, "Session Summary:")?;
        if let Ok(account) = client.get_account_snapshot().await {
            writeln!(self.out, "   Final Balance: {} USDT", account.total_wallet_balance)?;
        }
        Ok(())
    }

    async fn show_account<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        writeln!(self.out, "\nAccount Information:")?;
        let account = client.get_account_snapshot().await?;
        write!(self.out, "{}", format_account(&account))?;
        Ok(())
    }

    async fn show_price<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        let symbol = self.ask_symbol()?;
        let price = client.get_price(&symbol).await?;
        writeln!(self.out, "{} Price: {} USDT", symbol, price)?;
        Ok(())
    }

    async fn market_order<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        writeln!(self.out, "\nMarket Order Setup")?;
        let symbol = self.ask_symbol()?;
        let side = self.ask_text("Side (BUY/SELL)", None)?.to_ascii_uppercase();
        let quantity = self.ask_quantity()?;

        let request = OrderRequest::market(&symbol, &side, quantity);
        validate_order(&request).map_err(TradeError::from)?;

        if let Ok(price) = client.get_price(&symbol).await {
            writeln!(self.out, "Current price: {}", price)?;
        }

        let question = format!("Confirm {} {} {} at market price?", side, quantity, symbol);
        self.submit(client, &request, &question, "Market order placed successfully!")
            .await
    }

    async fn limit_order<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        writeln!(self.out, "\nLimit Order Setup")?;
        let symbol = self.ask_symbol()?;
        let side = self.ask_text("Side (BUY/SELL)", None)?.to_ascii_uppercase();
        let quantity = self.ask_quantity()?;
        let price: f64 = self.ask("Price", None)?;

        let request = OrderRequest::limit(&symbol, &side, quantity, price);
        validate_order(&request).map_err(TradeError::from)?;

        let question = format!("Confirm {} {} {} at {}?", side, quantity, symbol, price);
        self.submit(client, &request, &question, "Limit order placed successfully!")
            .await
    }

    async fn stop_loss_order<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        writeln!(self.out, "\nStop-Loss Limit Order Setup")?;
        let symbol = self.ask_symbol()?;
        let side = self.ask_text("Side (BUY/SELL)", None)?.to_ascii_uppercase();
        let quantity = self.ask_quantity()?;
        let stop_price: f64 = self.ask("Stop Price (trigger)", None)?;
        let limit_price: f64 = self.ask("Limit Price (execution)", None)?;

        let request = OrderRequest::stop_loss_limit(&symbol, &side, quantity, limit_price, stop_price);
        validate_order(&request).map_err(TradeError::from)?;

        writeln!(self.out, "\nStop-Loss Order Summary:")?;
        writeln!(
            self.out,
            "   When {} hits {}, place {} order at {}",
            symbol, stop_price, side, limit_price
        )?;

        self.submit(client, &request, "Confirm stop-loss order?", "Stop-loss order placed successfully!")
            .await
    }

    async fn quick_trade<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        writeln!(self.out, "\nQuick Trade Menu")?;
        writeln!(self.out, "Popular trading pairs:")?;
        let listing: Vec<String> = QUICK_SYMBOLS
            .iter()
            .map(|(key, symbol)| format!("{}. {}", key, symbol))
            .collect();
        writeln!(self.out, "{}", listing.join("  "))?;

        let choice = self.ask_text("Select symbol (1-4) or enter custom", Some("1"))?;
        let symbol = QUICK_SYMBOLS
            .iter()
            .find(|(key, _)| *key == choice)
            .map(|(_, symbol)| symbol.to_string())
            .unwrap_or_else(|| choice.to_ascii_uppercase());

        let current_price = client.get_price(&symbol).await?;
        writeln!(self.out, "Current {} price: {}", symbol, current_price)?;

        let side = self.ask_text("Side (BUY/SELL)", None)?.to_ascii_uppercase();
        let quantity = self.ask_quantity()?;

        let request = OrderRequest::market(&symbol, &side, quantity);
        validate_order(&request).map_err(TradeError::from)?;

        writeln!(self.out, "\nTrade Summary:")?;
        writeln!(self.out, "   Symbol: {}", symbol)?;
        writeln!(self.out, "   Side: {}", side)?;
        writeln!(self.out, "   Quantity: {}", quantity)?;
        writeln!(self.out, "   Current Price: {}", current_price)?;
        if side == "BUY" {
            writeln!(self.out, "   Estimated Cost: ~{:.2} USDT", current_price * quantity)?;
        }

        self.submit(client, &request, "Execute trade?", "Trade executed successfully!")
            .await
    }

    async fn open_orders<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        let symbol = self
            .ask_text("Symbol (press Enter for all)", None)?
            .to_ascii_uppercase();
        let filter = (!symbol.is_empty()).then_some(symbol.as_str());

        let orders = client.list_open_orders(filter).await?;
        if orders.is_empty() {
            writeln!(self.out, "No open orders found")?;
            return Ok(());
        }

        writeln!(self.out, "\nOpen Orders ({}):", orders.len())?;
        for order in &orders {
            writeln!(
                self.out,
                "   ID: {} | {} | {} | {} | Status: {}",
                order.order_id,
                order.symbol,
                order.side.as_deref().unwrap_or("-"),
                order.order_type.as_deref().unwrap_or("-"),
                order.status_or_pending()
            )?;
        }
        Ok(())
    }

    async fn cancel_order<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        let symbol = self.ask_symbol()?;
        let order_id: u64 = self.ask("Order ID", None)?;

        if !self.confirm(&format!("Cancel order {} for {}?", order_id, symbol))? {
            writeln!(self.out, "Cancellation aborted")?;
            return Ok(());
        }

        match client.cancel_order(&symbol, order_id).await {
            Ok(_) => writeln!(self.out, "Order cancelled successfully!")?,
            Err(e) if e.is_recoverable() => writeln!(self.out, "Cancellation failed: {}", e)?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn order_status<A: FuturesApi>(&mut self, client: &TradingClient<A>) -> Step {
        let symbol = self.ask_symbol()?;
        let order_id: u64 = self.ask("Order ID", None)?;

        let order = client.get_order_status(&symbol, order_id).await?;
        writeln!(self.out, "\nOrder Status:")?;
        write!(self.out, "{}", format_order(&order))?;
        Ok(())
    }

    async fn submit<A: FuturesApi>(
        &mut self,
        client: &TradingClient<A>,
        request: &OrderRequest,
        question: &str,
        success: &str,
    ) -> Step {
        if !self.confirm(question)? {
            writeln!(self.out, "Order cancelled")?;
            return Ok(());
        }

        match client.place_order(request).await {
            Ok(order) => {
                writeln!(self.out, "{}", success)?;
                writeln!(self.out, "   Order ID: {}", order.order_id)?;
                writeln!(self.out, "   Status: {}", order.status_or_pending())?;
            }
            Err(e) if e.is_recoverable() => writeln!(self.out, "Order failed: {}", e)?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn ask_symbol(&mut self) -> io::Result<String> {
        let default = self.default_symbol.clone();
        Ok(self.ask_text("Symbol", Some(&default))?.to_ascii_uppercase())
    }

    fn ask_quantity(&mut self) -> io::Result<f64> {
        let default = self.default_quantity.to_string();
        self.ask("Quantity", Some(&default))
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask_text(&format!("{} (y/n)", question), Some("n"))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }

    /// Re-asks until the answer parses.
    fn ask<T: FromStr>(&mut self, label: &str, default: Option<&str>) -> io::Result<T> {
        loop {
            let answer = self.ask_text(label, default)?;
            match answer.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.out, "Invalid input. Please enter a valid number")?,
            }
        }
    }

    fn ask_text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(d) if !d.is_empty() => write!(self.out, "{} (default: {}): ", label, d)?,
            _ => write!(self.out, "{}: ", label)?,
        }
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        let answer = line.trim();
        Ok(match default {
            Some(d) if answer.is_empty() => d.to_string(),
            _ => answer.to_string(),
        })
    }
}

pub fn format_account(account: &AccountInfo) -> String {
    let mut text = format!(
        "   Total Balance: {} USDT\n   Available Balance: {} USDT\n   Unrealized PnL: {} USDT\n",
        account.total_wallet_balance, account.available_balance, account.total_unrealized_profit
    );
    for asset in account.funded_assets() {
        text.push_str(&format!(
            "   {:<6} wallet {} | available {}\n",
            asset.asset, asset.wallet_balance, asset.available_balance
        ));
    }
    text
}

pub fn format_order(order: &OrderResult) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());

    let mut text = format!(
        "   Order ID: {}\n   Symbol: {}\n   Status: {}\n   Side: {}\n   Type: {}\n   Quantity: {}\n   Price: {}\n",
        order.order_id,
        order.symbol,
        order.status_or_pending(),
        field(&order.side),
        field(&order.order_type),
        field(&order.orig_qty),
        field(&order.price),
    );
    if let Some(stop) = order.stop_price.as_deref().filter(|s| s.parse::<f64>().unwrap_or(0.0) > 0.0) {
        text.push_str(&format!("   Stop Price: {}\n", stop));
    }
    if let Some(executed) = &order.executed_qty {
        text.push_str(&format!("   Executed: {}\n", executed));
    }
    if let Some(ts) = order.timestamp() {
        text.push_str(&format!("   Time: {}\n", ts.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    text
}
