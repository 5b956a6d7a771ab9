//! Persistence seam for the checkout steps.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Item, NewPaymentTransaction, NewPaymentTransactionError, PaymentTransaction,
    PaymentTransactionError, PurchasedItem,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, sqlx::Error>;

    /// Stores the transaction and one purchased item per entry, atomically.
    /// Callers pass only entries with a non-zero quantity.
    async fn create_checkout(
        &self,
        transaction: NewPaymentTransaction,
        items: &[(Item, u32)],
    ) -> Result<(PaymentTransaction, Vec<PurchasedItem>), sqlx::Error>;

    /// Looks a transaction up by owner and gateway token.
    async fn find_transaction(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error>;

    /// Persists `transaction_id` and `status` of an existing transaction.
    async fn update_transaction(&self, transaction: &PaymentTransaction) -> Result<(), sqlx::Error>;

    async fn log_error(
        &self,
        error: NewPaymentTransactionError,
    ) -> Result<PaymentTransactionError, sqlx::Error>;
}

pub(crate) fn purchased_item(
    transaction: &PaymentTransaction,
    item: &Item,
    quantity: u32,
) -> Result<PurchasedItem, sqlx::Error> {
    let quantity = i32::try_from(quantity)
        .map_err(|_| sqlx::Error::Protocol(format!("quantity {} out of range", quantity)))?;
    Ok(PurchasedItem {
        id: Uuid::new_v4(),
        user_id: transaction.user_id,
        payment_transaction_id: transaction.id,
        item_id: item.id,
        quantity,
    })
}
