use tracing::{info, instrument};

use super::{format_amount, paths, Checkout};
use crate::gateway::GatewayError;
use crate::models::{AuthenticatedUser, PaymentStatus, PaymentTransaction};
use crate::utils::AppError;

#[derive(Debug)]
pub enum PaymentOutcome {
    /// Payment accepted; the transaction is `pending` and carries the payment id.
    Completed(PaymentTransaction),
    /// Payment refused; the transaction is `canceled` and keeps its token.
    Canceled {
        transaction: PaymentTransaction,
        error: GatewayError,
    },
}

impl PaymentOutcome {
    pub fn transaction(&self) -> &PaymentTransaction {
        match self {
            PaymentOutcome::Completed(transaction)
            | PaymentOutcome::Canceled { transaction, .. } => transaction,
        }
    }

    pub fn redirect_target(&self) -> &'static str {
        match self {
            PaymentOutcome::Completed(_) => paths::SUCCESS,
            PaymentOutcome::Canceled { .. } => paths::ERROR,
        }
    }
}

impl Checkout {
    /// Executes the payment for the caller's transaction identified by `token`.
    ///
    /// Only a transaction still in `checkout` can be finalized; anything else is
    /// rejected without contacting the gateway.
    #[instrument(name = "checkout::do_checkout", skip(self), fields(user_id = %user.id))]
    pub async fn do_checkout(
        &self,
        user: &AuthenticatedUser,
        token: &str,
        payer_id: &str,
    ) -> Result<PaymentOutcome, AppError> {
        let mut transaction = self.find_transaction(user, token).await?;
        if transaction.status != PaymentStatus::Checkout {
            return Err(AppError::ValidationError(format!(
                "Transaction for token '{}' is already {:?}",
                token, transaction.status
            )));
        }

        let mut post_data = self.base_post_data("DoExpressCheckoutPayment");
        post_data.insert("TOKEN".to_string(), transaction.transaction_id.clone());
        post_data.insert("PAYERID".to_string(), payer_id.to_string());
        post_data.insert(
            "PAYMENTREQUEST_0_AMT".to_string(),
            format_amount(transaction.value),
        );
        post_data.insert(
            "PAYMENTREQUEST_0_NOTIFYURL".to_string(),
            self.config.absolute_url(paths::IPN)?.into(),
        );

        let result = self
            .gateway
            .call(&post_data)
            .await
            .and_then(|response| response.require("PAYMENTINFO_0_TRANSACTIONID"));

        match result {
            Ok(payment_id) => {
                transaction.transaction_id = payment_id;
                transaction.status = PaymentStatus::Pending;
                self.store.update_transaction(&transaction).await?;
                info!(transaction = %transaction.id, "Payment accepted");
                Ok(PaymentOutcome::Completed(transaction))
            }
            Err(error) => {
                transaction.status = PaymentStatus::Canceled;
                self.store.update_transaction(&transaction).await?;
                self.log_gateway_error(user, &error, Some(&transaction)).await;
                Ok(PaymentOutcome::Canceled { transaction, error })
            }
        }
    }
}
