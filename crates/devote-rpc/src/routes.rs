use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use devote_state::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{get_confirmed, get_payment_winner, get_witness, AppState};

/// Create the HTTP router
pub fn create_router<S: Storage + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/consensus/confirmed", get(get_confirmed::<S>))
        .route("/consensus/witness/{timestamp}", get(get_witness::<S>))
        .route("/payments/winner/{height}", get(get_payment_winner::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
