use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{purchased_item, PaymentStore};
use crate::models::{
    Item, NewPaymentTransaction, NewPaymentTransactionError, PaymentTransaction,
    PaymentTransactionError, PurchasedItem,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PgStore {
    async fn find_item(&self, id: Uuid) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            "SELECT id, name, description, value FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_checkout(
        &self,
        transaction: NewPaymentTransaction,
        items: &[(Item, u32)],
    ) -> Result<(PaymentTransaction, Vec<PurchasedItem>), sqlx::Error> {
        let transaction = transaction.into_transaction();
        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO payment_transactions \
             (id, user_id, date, transaction_id, value, status, content_type, object_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.date)
        .bind(&transaction.transaction_id)
        .bind(transaction.value)
        .bind(transaction.status)
        .bind(&transaction.content_type)
        .bind(&transaction.object_id)
        .execute(&mut *db_tx)
        .await?;

        let mut purchased = Vec::with_capacity(items.len());
        for (item, quantity) in items {
            let row = purchased_item(&transaction, item, *quantity)?;
            sqlx::query(
                "INSERT INTO purchased_items \
                 (id, user_id, payment_transaction_id, item_id, quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(row.id)
            .bind(row.user_id)
            .bind(row.payment_transaction_id)
            .bind(row.item_id)
            .bind(row.quantity)
            .execute(&mut *db_tx)
            .await?;
            purchased.push(row);
        }

        db_tx.commit().await?;
        Ok((transaction, purchased))
    }

    async fn find_transaction(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            "SELECT id, user_id, date, transaction_id, value, status, content_type, object_id \
             FROM payment_transactions WHERE user_id = $1 AND transaction_id = $2",
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_transaction(&self, transaction: &PaymentTransaction) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payment_transactions SET transaction_id = $2, status = $3 WHERE id = $1",
        )
        .bind(transaction.id)
        .bind(&transaction.transaction_id)
        .bind(transaction.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn log_error(
        &self,
        error: NewPaymentTransactionError,
    ) -> Result<PaymentTransactionError, sqlx::Error> {
        let error = error.into_error();
        sqlx::query(
            "INSERT INTO payment_transaction_errors \
             (id, user_id, date, response, payment_transaction_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(error.id)
        .bind(error.user_id)
        .bind(error.date)
        .bind(&error.response)
        .bind(error.payment_transaction_id)
        .execute(&self.pool)
        .await?;
        Ok(error)
    }
}
