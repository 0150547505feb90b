pub mod types;
pub mod errors;
pub mod logging;
pub mod services;
pub mod handlers;
pub mod config;
pub mod cli;

pub use errors::*;
pub use logging::TradeLog;
pub use services::*;
pub use config::*;
