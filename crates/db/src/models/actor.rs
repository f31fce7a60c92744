//! Request bodies that only name the acting user.

use fleetcare_core::types::DbId;
use serde::Deserialize;

/// Body for approve/validate actions: `{ "user_id": 1 }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRequest {
    #[serde(alias = "userId")]
    pub user_id: DbId,
}
