use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// A user record as served by the upstream source.
///
/// Nested upstream objects (address, company) are not part of the graph and
/// are dropped on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: String,
}
