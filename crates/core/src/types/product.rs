//! Catalog products.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product available to buy.
///
/// Server-owned and read-only on the storefront.
///
/// ```json
/// {
///     "name": "iPhone XR",
///     "category": "Phones",
///     "cost": 100,
///     "rating": 4,
///     "image": "https://i.imgur.com/lulqWzW.jpg",
///     "_id": "v4sLtEcMpzabRyfx"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub cost: Price,
    /// Aggregate rating, an integer out of five.
    #[serde(default)]
    pub rating: u8,
    /// URL of the product image.
    pub image: String,
}

impl Product {
    /// Rating clamped to the 0..=5 star range.
    #[must_use]
    pub fn stars(&self) -> u8 {
        self.rating.min(5)
    }
}
