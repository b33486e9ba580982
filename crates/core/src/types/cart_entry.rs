//! Cart entries (server-side) and cart items (catalog-joined).

use serde::{Deserialize, Serialize};

use super::{Price, Product, ProductId};

/// Server-side record of a product id and desired quantity.
///
/// This is both the shape returned by `GET /cart` and the body sent to
/// `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub qty: u32,
}

impl CartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub const fn new(product_id: ProductId, qty: u32) -> Self {
        Self { product_id, qty }
    }
}

/// Display-ready cart row: the catalog product plus the entry's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub qty: u32,
}

impl CartItem {
    /// Cost of this row (unit cost times quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.cost * self.qty
    }

    /// The product id of this row.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }
}
