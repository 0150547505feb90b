use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use futures_trader::{
    cli::Shell,
    handlers::{self, AppState},
    types::Config,
    TradeLog, TradingClient,
};

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Futures Testnet Trader")]
struct Args {
    #[arg(long, help = "Serve read-only HTTP endpoints instead of the interactive menu")]
    server: bool,

    #[arg(long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    let log = TradeLog::open(&config.log);

    if args.server {
        start_server(config, log, args.port).await
    } else {
        run_shell(config, log).await
    }
}

async fn run_shell(config: Config, log: TradeLog) -> Result<()> {
    let mut shell = Shell::new(
        io::stdin().lock(),
        io::stdout(),
        &config.default_symbol,
        config.default_quantity,
    );
    shell.print_banner(&config.environment.to_string())?;

    let credentials = shell.prompt_credentials(config.credentials.clone())?;
    if !credentials.is_complete() {
        eprintln!("API credentials are required!");
        std::process::exit(1);
    }
    let config = config.with_credentials(credentials);

    println!("Initializing trading client...");
    let client = match TradingClient::connect(&config, log).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to initialize client: {}", e);
            std::process::exit(1);
        }
    };
    println!("Client ready for trading operations!");

    shell.run(&client).await?;
    Ok(())
}

async fn start_server(config: Config, log: TradeLog, port: u16) -> Result<()> {
    if !config.credentials.is_complete() {
        anyhow::bail!("BINANCE_API_KEY and BINANCE_API_SECRET must be set in server mode");
    }

    let client = TradingClient::connect(&config, log)
        .await
        .context("Failed to connect to the exchange")?;
    let environment = client.environment();
    let app = handlers::router(AppState::new(client));

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;

    println!("Futures trader ({}) running on http://localhost:{}", environment, port);
    println!("Available endpoints:");
    println!("   GET  /health                      - Health check");
    println!("   GET  /account                     - Wallet and available balance");
    println!("   GET  /price/:symbol               - Current price");
    println!("   GET  /orders/open?symbol=         - Open orders");
    println!("   GET  /orders/:symbol/:order_id    - Order status");
    println!();
    println!("Press Ctrl+C to stop the server");

    axum::serve(listener, app).await?;

    Ok(())
}
