use axum::{response::IntoResponse, response::Response};
use serde::Serialize;

use crate::checkout::Checkout;
use crate::utils::response::success;

pub mod auth;
pub mod paypal;

pub use paypal::{
    canceled, confirm, do_checkout, payment_error, payment_success, set_cart_checkout,
    set_checkout,
};

#[derive(Clone)]
pub struct AppState {
    pub checkout: Checkout,
}

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "express-checkout",
    };

    success(payload, "Health check successful").into_response()
}
