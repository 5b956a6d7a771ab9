use tracing::instrument;

use super::Checkout;
use crate::gateway::{GatewayError, GatewayResponse};
use crate::models::AuthenticatedUser;
use crate::utils::AppError;

#[derive(Debug)]
pub enum DetailsOutcome {
    /// Buyer details as returned by the gateway.
    Confirmed(GatewayResponse),
    Failed(GatewayError),
}

impl Checkout {
    /// Fetches the buyer-confirmed details of the caller's transaction for `token`.
    ///
    /// An unknown token is [`AppError::NotFound`]. Gateway failures are logged
    /// against the transaction; choosing what to show is left to the caller.
    #[instrument(name = "checkout::get_details", skip(self), fields(user_id = %user.id))]
    pub async fn get_details(
        &self,
        user: &AuthenticatedUser,
        token: &str,
    ) -> Result<DetailsOutcome, AppError> {
        let transaction = self.find_transaction(user, token).await?;

        let mut post_data = self.base_post_data("GetExpressCheckoutDetails");
        post_data.insert("TOKEN".to_string(), transaction.transaction_id.clone());

        match self.gateway.call(&post_data).await {
            Ok(response) => Ok(DetailsOutcome::Confirmed(response)),
            Err(err) => {
                self.log_gateway_error(user, &err, Some(&transaction)).await;
                Ok(DetailsOutcome::Failed(err))
            }
        }
    }
}
