//! The three Express Checkout steps.
//!
//! [`Checkout`] bundles the gateway, the store and the gateway configuration;
//! each step lives in its own module as an `impl Checkout` block.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, warn};

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, GatewayError, PostData};
use crate::models::{AuthenticatedUser, NewPaymentTransactionError, PaymentTransaction};
use crate::store::PaymentStore;
use crate::utils::AppError;

pub mod details;
pub mod do_checkout;
pub mod set_checkout;

pub use details::DetailsOutcome;
pub use do_checkout::PaymentOutcome;
pub use set_checkout::{CartCheckout, CheckoutRequest, ItemCheckout, SetCheckoutOutcome};

/// Paths of the service's own pages, relative to the configured hostname.
pub mod paths {
    pub const CHECKOUT: &str = "/paypal/checkout/";
    pub const CART_CHECKOUT: &str = "/paypal/checkout/cart/";
    pub const CONFIRM: &str = "/paypal/confirm/";
    pub const CANCELED: &str = "/paypal/canceled/";
    pub const SUCCESS: &str = "/paypal/success/";
    pub const ERROR: &str = "/paypal/error/";
    pub const IPN: &str = "/paypal/ipn/";
}

/// Largest order total the `NUMERIC(8, 2)` value column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Amounts go over the wire with two decimal places.
pub fn format_amount(value: Decimal) -> String {
    let mut amount = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    amount.to_string()
}

#[derive(Clone)]
pub struct Checkout {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn PaymentStore>,
    config: Arc<GatewayConfig>,
}

impl Checkout {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn PaymentStore>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
        }
    }

    pub fn store(&self) -> &dyn PaymentStore {
        self.store.as_ref()
    }

    /// Configured defaults plus `METHOD`.
    fn base_post_data(&self, method: &str) -> PostData {
        let mut post_data = self.config.defaults.clone();
        post_data.insert("METHOD".to_string(), method.to_string());
        post_data
    }

    /// Owner-scoped lookup used by the callback steps. A miss never reaches the gateway.
    async fn find_transaction(
        &self,
        user: &AuthenticatedUser,
        token: &str,
    ) -> Result<PaymentTransaction, AppError> {
        self.store
            .find_transaction(user.id, token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No transaction for token '{}'", token)))
    }

    /// Records a failed gateway call. A store failure here is only logged so
    /// the caller still takes its failure branch.
    async fn log_gateway_error(
        &self,
        user: &AuthenticatedUser,
        failure: &GatewayError,
        transaction: Option<&PaymentTransaction>,
    ) {
        warn!(
            user_id = %user.id,
            transaction = ?transaction.map(|tx| tx.id),
            error = %failure,
            "Gateway call failed"
        );
        let logged = self
            .store
            .log_error(NewPaymentTransactionError {
                user_id: user.id,
                response: failure.log_payload(),
                payment_transaction_id: transaction.map(|tx| tx.id),
            })
            .await;
        if let Err(e) = logged {
            error!(error = ?e, user_id = %user.id, "Could not record gateway error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_uses_two_places() {
        assert_eq!(format_amount(Decimal::new(5, 0)), "5.00");
        assert_eq!(format_amount(Decimal::new(1999, 2)), "19.99");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "12.35");
    }
}
