use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::{format_amount, paths, Checkout, MAX_AMOUNT};
use crate::config::GatewayConfig;
use crate::gateway::{GatewayError, PostData};
use crate::models::{AuthenticatedUser, ContentRef, Identify, Item, NewPaymentTransaction, PaymentTransaction};
use crate::utils::AppError;

/// What a `SetExpressCheckout` call is made for.
///
/// Only [`items_and_quantities`](CheckoutRequest::items_and_quantities) is
/// required; the remaining methods are hooks with sensible defaults.
#[async_trait]
pub trait CheckoutRequest: Send + Sync {
    fn items_and_quantities(&self) -> Vec<(Item, u32)>;

    /// Entity attached to the stored transaction. Defaults to the user.
    fn content_object(&self, user: &AuthenticatedUser) -> Option<ContentRef> {
        Some(user.identify())
    }

    /// Extra query parameters for the return and cancel URLs.
    fn url_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Runs once the transaction and its items are stored.
    async fn post_transaction_save(
        &self,
        _transaction: &PaymentTransaction,
        _items: &[(Item, u32)],
    ) -> Result<(), AppError> {
        Ok(())
    }
}

/// One catalog item in some quantity.
#[derive(Debug, Clone)]
pub struct ItemCheckout {
    pub item: Item,
    pub quantity: u32,
}

impl CheckoutRequest for ItemCheckout {
    fn items_and_quantities(&self) -> Vec<(Item, u32)> {
        vec![(self.item.clone(), self.quantity)]
    }
}

/// Several items at once.
#[derive(Debug, Clone, Default)]
pub struct CartCheckout {
    pub lines: Vec<(Item, u32)>,
}

impl CheckoutRequest for CartCheckout {
    fn items_and_quantities(&self) -> Vec<(Item, u32)> {
        self.lines.clone()
    }
}

#[derive(Debug)]
pub enum SetCheckoutOutcome {
    /// The gateway issued a token and the transaction is stored.
    Started(PaymentTransaction),
    Failed(GatewayError),
}

impl SetCheckoutOutcome {
    /// Gateway login page for a started checkout, the error page otherwise.
    pub fn redirect_target(&self, config: &GatewayConfig) -> String {
        match self {
            SetCheckoutOutcome::Started(transaction) => {
                config.login_redirect(&transaction.transaction_id)
            }
            SetCheckoutOutcome::Failed(_) => paths::ERROR.to_string(),
        }
    }
}

fn total_too_large() -> AppError {
    AppError::ValidationError(format!("Order total exceeds {}", MAX_AMOUNT))
}

impl Checkout {
    /// Builds the `SetExpressCheckout` fields and the order total.
    ///
    /// Entries with quantity 0 are left out and do not use up a line index.
    /// Quantities and totals the store cannot hold are rejected here, before
    /// anything is sent.
    pub fn set_checkout_post_data(
        &self,
        items: &[(Item, u32)],
        url_params: &[(String, String)],
    ) -> Result<(PostData, Decimal), AppError> {
        let mut post_data = self.base_post_data("SetExpressCheckout");
        let mut total = Decimal::ZERO;

        for (index, (item, quantity)) in items.iter().filter(|(_, qty)| *qty > 0).enumerate() {
            if i32::try_from(*quantity).is_err() {
                return Err(AppError::ValidationError(format!(
                    "Quantity {} of '{}' is too large",
                    quantity, item.name
                )));
            }
            total = item
                .value
                .checked_mul(Decimal::from(*quantity))
                .and_then(|line| total.checked_add(line))
                .filter(|sum| *sum <= MAX_AMOUNT)
                .ok_or_else(total_too_large)?;
            post_data.insert(format!("L_PAYMENTREQUEST_0_NAME{}", index), item.name.clone());
            post_data.insert(
                format!("L_PAYMENTREQUEST_0_DESC{}", index),
                item.description.clone(),
            );
            post_data.insert(
                format!("L_PAYMENTREQUEST_0_AMT{}", index),
                format_amount(item.value),
            );
            post_data.insert(format!("L_PAYMENTREQUEST_0_QTY{}", index), quantity.to_string());
        }

        post_data.insert("PAYMENTREQUEST_0_AMT".to_string(), format_amount(total));
        post_data.insert("PAYMENTREQUEST_0_ITEMAMT".to_string(), format_amount(total));
        post_data.insert(
            "RETURNURL".to_string(),
            self.callback_url(paths::CONFIRM, url_params)?,
        );
        post_data.insert(
            "CANCELURL".to_string(),
            self.callback_url(paths::CANCELED, url_params)?,
        );
        Ok((post_data, total))
    }

    fn callback_url(&self, path: &str, params: &[(String, String)]) -> Result<String, AppError> {
        let mut url = self.config.absolute_url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }

    /// Calls `SetExpressCheckout` and stores the transaction on success.
    ///
    /// Gateway failures are logged and returned as
    /// [`SetCheckoutOutcome::Failed`]; oversized orders, storage and
    /// configuration problems are errors.
    #[instrument(name = "checkout::set_checkout", skip(self, request), fields(user_id = %user.id))]
    pub async fn process_set_checkout(
        &self,
        user: &AuthenticatedUser,
        request: &dyn CheckoutRequest,
    ) -> Result<SetCheckoutOutcome, AppError> {
        let items: Vec<(Item, u32)> = request
            .items_and_quantities()
            .into_iter()
            .filter(|(_, quantity)| *quantity > 0)
            .collect();
        let (post_data, total) = self.set_checkout_post_data(&items, &request.url_params())?;

        let token = match self
            .gateway
            .call(&post_data)
            .await
            .and_then(|response| response.require("TOKEN"))
        {
            Ok(token) => token,
            Err(err) => {
                self.log_gateway_error(user, &err, None).await;
                return Ok(SetCheckoutOutcome::Failed(err));
            }
        };

        let (transaction, purchased) = self
            .store
            .create_checkout(
                NewPaymentTransaction {
                    user_id: user.id,
                    transaction_id: token,
                    value: total,
                    content_object: request.content_object(user),
                },
                &items,
            )
            .await?;
        request.post_transaction_save(&transaction, &items).await?;

        info!(
            transaction = %transaction.id,
            items = purchased.len(),
            value = %transaction.value,
            "Checkout started"
        );
        Ok(SetCheckoutOutcome::Started(transaction))
    }

    /// Runs [`process_set_checkout`](Self::process_set_checkout) and picks the redirect target.
    pub async fn set_checkout(
        &self,
        user: &AuthenticatedUser,
        request: &dyn CheckoutRequest,
    ) -> Result<String, AppError> {
        let outcome = self.process_set_checkout(user, request).await?;
        Ok(outcome.redirect_target(&self.config))
    }
}
