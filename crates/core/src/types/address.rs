//! Saved shipping addresses.

use serde::{Deserialize, Serialize};

use super::AddressId;

/// A shipping address saved against the user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub address: String,
}
