use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Something that can be bought. Ad hoc items built by a checkout request
/// instead of loaded from the catalog have no `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchasedItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_transaction_id: Uuid,
    pub item_id: Option<Uuid>,
    pub quantity: i32,
}
