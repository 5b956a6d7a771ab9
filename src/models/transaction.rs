use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a checkout attempt. This service only moves `Checkout` to
/// `Pending` or `Canceled`; `Completed` is set by the notification listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Checkout,
    Pending,
    Completed,
    Canceled,
}

/// Typed pointer to an application entity attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub content_type: String,
    pub object_id: String,
}

impl ContentRef {
    pub fn new(content_type: impl Into<String>, object_id: impl ToString) -> Self {
        Self {
            content_type: content_type.into(),
            object_id: object_id.to_string(),
        }
    }
}

/// Anything that can be attached to a transaction as its content object.
pub trait Identify {
    fn identify(&self) -> ContentRef;
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    /// Gateway token while the checkout runs, final payment id afterwards.
    pub transaction_id: String,
    pub value: Decimal,
    pub status: PaymentStatus,
    pub content_type: Option<String>,
    pub object_id: Option<String>,
}

impl PaymentTransaction {
    pub fn content_object(&self) -> Option<ContentRef> {
        match (&self.content_type, &self.object_id) {
            (Some(content_type), Some(object_id)) => Some(ContentRef {
                content_type: content_type.clone(),
                object_id: object_id.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub user_id: Uuid,
    pub transaction_id: String,
    pub value: Decimal,
    pub content_object: Option<ContentRef>,
}

impl NewPaymentTransaction {
    /// A fresh row in `checkout` state, stamped now.
    pub fn into_transaction(self) -> PaymentTransaction {
        let (content_type, object_id) = match self.content_object {
            Some(content) => (Some(content.content_type), Some(content.object_id)),
            None => (None, None),
        };
        PaymentTransaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            date: Utc::now(),
            transaction_id: self.transaction_id,
            value: self.value,
            status: PaymentStatus::Checkout,
            content_type,
            object_id,
        }
    }
}
