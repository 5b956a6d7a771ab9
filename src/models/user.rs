use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::{ContentRef, Identify};

/// The signed-in user, as vouched for by the fronting auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
}

impl Identify for AuthenticatedUser {
    fn identify(&self) -> ContentRef {
        ContentRef::new("user", self.id)
    }
}
