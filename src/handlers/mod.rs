// export modules
pub mod exchange_api;

pub use exchange_api::*;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::services::FuturesApi;

/// Read-only routes over the shared session.
pub fn router<A: FuturesApi + 'static>(state: AppState<A>) -> Router {
    Router::new()
        .route("/health", get(health::<A>))
        .route("/account", get(get_account::<A>))
        .route("/price/:symbol", get(get_price::<A>))
        .route("/orders/open", get(get_open_orders::<A>))
        .route("/orders/:symbol/:order_id", get(get_order::<A>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
