use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{purchased_item, PaymentStore};
use crate::models::{
    Item, NewPaymentTransaction, NewPaymentTransactionError, PaymentTransaction,
    PaymentTransactionError, PurchasedItem,
};

#[derive(Default)]
struct Tables {
    items: Vec<Item>,
    transactions: Vec<PaymentTransaction>,
    purchased_items: Vec<PurchasedItem>,
    errors: Vec<PaymentTransactionError>,
}

/// Process-local store, used by tests and local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a catalog item, assigning an id when it has none.
    pub fn insert_item(&self, mut item: Item) -> Item {
        item.id.get_or_insert_with(Uuid::new_v4);
        self.tables().items.push(item.clone());
        item
    }

    pub fn transactions(&self) -> Vec<PaymentTransaction> {
        self.tables().transactions.clone()
    }

    pub fn purchased_items(&self) -> Vec<PurchasedItem> {
        self.tables().purchased_items.clone()
    }

    pub fn errors(&self) -> Vec<PaymentTransactionError> {
        self.tables().errors.clone()
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, sqlx::Error> {
        Ok(self
            .tables()
            .items
            .iter()
            .find(|item| item.id == Some(id))
            .cloned())
    }

    async fn create_checkout(
        &self,
        transaction: NewPaymentTransaction,
        items: &[(Item, u32)],
    ) -> Result<(PaymentTransaction, Vec<PurchasedItem>), sqlx::Error> {
        let transaction = transaction.into_transaction();
        let purchased = items
            .iter()
            .map(|(item, quantity)| purchased_item(&transaction, item, *quantity))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.tables();
        tables.transactions.push(transaction.clone());
        tables.purchased_items.extend(purchased.iter().cloned());
        Ok((transaction, purchased))
    }

    async fn find_transaction(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error> {
        Ok(self
            .tables()
            .transactions
            .iter()
            .find(|tx| tx.user_id == user_id && tx.transaction_id == token)
            .cloned())
    }

    async fn update_transaction(&self, transaction: &PaymentTransaction) -> Result<(), sqlx::Error> {
        let mut tables = self.tables();
        let stored = tables
            .transactions
            .iter_mut()
            .find(|tx| tx.id == transaction.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.transaction_id = transaction.transaction_id.clone();
        stored.status = transaction.status;
        Ok(())
    }

    async fn log_error(
        &self,
        error: NewPaymentTransactionError,
    ) -> Result<PaymentTransactionError, sqlx::Error> {
        let error = error.into_error();
        self.tables().errors.push(error.clone());
        Ok(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use rust_decimal::Decimal;

    fn item(name: &str, cents: i64) -> Item {
        Item {
            id: None,
            name: name.to_string(),
            description: String::new(),
            value: Decimal::new(cents, 2),
        }
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .create_checkout(
                NewPaymentTransaction {
                    user_id: owner,
                    transaction_id: "EC-1".to_string(),
                    value: Decimal::new(500, 2),
                    content_object: None,
                },
                &[(item("mug", 500), 1)],
            )
            .await
            .unwrap();

        assert!(store.find_transaction(owner, "EC-1").await.unwrap().is_some());
        assert!(store
            .find_transaction(Uuid::new_v4(), "EC-1")
            .await
            .unwrap()
            .is_none());
        assert!(store.find_transaction(owner, "EC-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_of_unknown_transaction_fails() {
        let store = MemoryStore::new();
        let tx = NewPaymentTransaction {
            user_id: Uuid::new_v4(),
            transaction_id: "EC-1".to_string(),
            value: Decimal::ZERO,
            content_object: None,
        }
        .into_transaction();

        let err = store.update_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn test_update_persists_token_and_status() {
        let store = MemoryStore::new();
        let (mut tx, purchased) = store
            .create_checkout(
                NewPaymentTransaction {
                    user_id: Uuid::new_v4(),
                    transaction_id: "EC-1".to_string(),
                    value: Decimal::new(500, 2),
                    content_object: None,
                },
                &[(store.insert_item(item("mug", 500)), 2)],
            )
            .await
            .unwrap();
        assert_eq!(purchased[0].quantity, 2);
        assert!(purchased[0].item_id.is_some());

        tx.transaction_id = "PAY-1".to_string();
        tx.status = PaymentStatus::Pending;
        store.update_transaction(&tx).await.unwrap();

        let stored = &store.transactions()[0];
        assert_eq!(stored.transaction_id, "PAY-1");
        assert_eq!(stored.status, PaymentStatus::Pending);
    }
}
