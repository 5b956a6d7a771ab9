use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of a failed gateway call.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransactionError {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub response: String,
    pub payment_transaction_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentTransactionError {
    pub user_id: Uuid,
    pub response: String,
    pub payment_transaction_id: Option<Uuid>,
}

impl NewPaymentTransactionError {
    pub fn into_error(self) -> PaymentTransactionError {
        PaymentTransactionError {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            date: Utc::now(),
            response: self.response,
            payment_transaction_id: self.payment_transaction_id,
        }
    }
}
