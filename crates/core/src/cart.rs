//! Cart reconciliation and the add-to-cart gate.
//!
//! The backend only knows `(productId, qty)` pairs. Everything the cart
//! sidebar shows comes from joining those pairs with the product catalog.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{CartEntry, CartItem, Price, Product, ProductId};

/// Why an add-to-cart request was refused before reaching the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddToCartRejection {
    /// No auth token in the session.
    #[error("Login to add an item to the Cart")]
    LoginRequired,

    /// The product is already in the cart; quantities are changed from the cart.
    #[error("Item already in cart. Use the cart sidebar to update quantity or remove item.")]
    AlreadyInCart,
}

/// Join cart entries with the catalog to produce display rows.
///
/// Rows keep the order of `entries`. Entries referencing a product id that
/// is not in `catalog` are dropped.
#[must_use]
pub fn generate_cart_items(entries: &[CartEntry], catalog: &[Product]) -> Vec<CartItem> {
    let by_id: HashMap<&ProductId, &Product> = catalog.iter().map(|p| (&p.id, p)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            by_id.get(&entry.product_id).map(|product| CartItem {
                product: (*product).clone(),
                qty: entry.qty,
            })
        })
        .collect()
}

/// Whether a product is already present among the cart entries.
#[must_use]
pub fn is_item_in_cart(entries: &[CartEntry], product_id: &ProductId) -> bool {
    entries.iter().any(|entry| &entry.product_id == product_id)
}

/// Decide whether an add-to-cart request may be sent to the backend.
///
/// # Errors
///
/// Returns [`AddToCartRejection::LoginRequired`] when the user is logged out,
/// and [`AddToCartRejection::AlreadyInCart`] when `product_id` is already in
/// `entries`.
pub fn check_add_to_cart(
    logged_in: bool,
    entries: &[CartEntry],
    product_id: &ProductId,
) -> Result<(), AddToCartRejection> {
    if !logged_in {
        return Err(AddToCartRejection::LoginRequired);
    }
    if is_item_in_cart(entries, product_id) {
        return Err(AddToCartRejection::AlreadyInCart);
    }
    Ok(())
}

/// Total cost of all rows.
#[must_use]
pub fn total_cart_value(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::line_total).sum()
}

/// Total number of units across all rows.
#[must_use]
pub fn total_items(items: &[CartItem]) -> u32 {
    items.iter().map(|item| item.qty).sum()
}
