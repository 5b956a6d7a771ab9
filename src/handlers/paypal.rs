use axum::extract::{Form, Json, Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::checkout::{paths, CartCheckout, DetailsOutcome, ItemCheckout};
use crate::gateway::GatewayResponse;
use crate::models::{AuthenticatedUser, Item};
use crate::utils::response::{empty_success, redirect, success};
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct ItemCheckoutForm {
    pub item: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CartLine {
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CartCheckoutPayload {
    pub items: Vec<CartLine>,
}

/// Query string the gateway appends to the return URL.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub token: String,
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DoCheckoutForm {
    #[serde(default)]
    pub token: String,
    #[serde(rename = "payerID", default)]
    pub payer_id: String,
}

#[derive(Serialize)]
struct ConfirmPayload {
    token: String,
    payer_id: Option<String>,
    details: GatewayResponse,
}

fn require_field<'a>(name: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::ValidationError(format!("{} is required", name)))
    } else {
        Ok(value)
    }
}

async fn load_item(state: &AppState, id: Uuid) -> Result<Item, AppError> {
    state
        .checkout
        .store()
        .find_item(id)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Item '{}' does not exist", id)))
}

/// Starts a checkout for one catalog item.
pub async fn set_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<ItemCheckoutForm>,
) -> Result<Response, AppError> {
    let request = ItemCheckout {
        item: load_item(&state, form.item).await?,
        quantity: form.quantity,
    };

    let target = state.checkout.set_checkout(&user, &request).await?;
    Ok(redirect(&target))
}

/// Starts a checkout for a list of catalog items.
pub async fn set_cart_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CartCheckoutPayload>,
) -> Result<Response, AppError> {
    if payload.items.iter().all(|line| line.quantity == 0) {
        return Err(AppError::ValidationError(
            "At least one item needs a quantity".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(payload.items.len());
    for line in payload.items {
        lines.push((load_item(&state, line.item_id).await?, line.quantity));
    }

    let target = state
        .checkout
        .set_checkout(&user, &CartCheckout { lines })
        .await?;
    Ok(redirect(&target))
}

/// Return URL of the gateway: shows what the buyer approved.
pub async fn confirm(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ConfirmQuery>,
) -> Result<Response, AppError> {
    let token = require_field("token", &query.token)?;

    match state.checkout.get_details(&user, token).await? {
        DetailsOutcome::Confirmed(details) => {
            let payload = ConfirmPayload {
                token: token.to_string(),
                payer_id: query.payer_id,
                details,
            };
            Ok(success(payload, "Please confirm your payment").into_response())
        }
        DetailsOutcome::Failed(_) => Ok(redirect(paths::ERROR)),
    }
}

/// Executes the payment the buyer confirmed.
pub async fn do_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(form): Form<DoCheckoutForm>,
) -> Result<Response, AppError> {
    let token = require_field("token", &form.token)?;
    let payer_id = require_field("payerID", &form.payer_id)?;

    let outcome = state.checkout.do_checkout(&user, token, payer_id).await?;
    Ok(redirect(outcome.redirect_target()))
}

pub async fn payment_success() -> Response {
    empty_success("Thank you, your payment is being processed").into_response()
}

pub async fn payment_error() -> Response {
    empty_success("Your payment could not be completed").into_response()
}

pub async fn canceled() -> Response {
    empty_success("Your payment was canceled").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_trims_and_rejects_blank() {
        assert_eq!(require_field("token", " EC-1 ").unwrap(), "EC-1");
        assert!(matches!(
            require_field("token", "   "),
            Err(AppError::ValidationError(_))
        ));
    }
}
