pub mod item;
pub mod transaction;
pub mod transaction_error;
pub mod user;

pub use item::{Item, PurchasedItem};
pub use transaction::{ContentRef, Identify, NewPaymentTransaction, PaymentStatus, PaymentTransaction};
pub use transaction_error::{NewPaymentTransactionError, PaymentTransactionError};
pub use user::AuthenticatedUser;
