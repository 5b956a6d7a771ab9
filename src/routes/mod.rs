use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::checkout::paths;
use crate::config::{create_no_store_layer, hsts_from_env, with_security_headers};
use crate::handlers::{
    canceled, confirm, do_checkout, health_check, payment_error, payment_success,
    set_cart_checkout, set_checkout, AppState,
};

pub fn create_routes(state: AppState) -> Router {
    build_routes(state, hsts_from_env())
}

pub fn build_routes(state: AppState, include_hsts: bool) -> Router {
    let checkout = Router::new()
        .route(paths::CHECKOUT, post(set_checkout))
        .route(paths::CART_CHECKOUT, post(set_cart_checkout))
        .route(paths::CONFIRM, get(confirm).post(do_checkout))
        .layer(create_no_store_layer());

    let app = Router::new()
        .route("/health", get(health_check))
        .route(paths::SUCCESS, get(payment_success))
        .route(paths::ERROR, get(payment_error))
        .route(paths::CANCELED, get(canceled))
        .merge(checkout)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    with_security_headers(app, include_hsts)
}
