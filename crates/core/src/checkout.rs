//! Checkout validation.

use thiserror::Error;

use crate::cart::total_cart_value;
use crate::types::{AddressId, CartItem, Price};

/// Reasons an order cannot be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("You must add items to cart first")]
    EmptyCart,

    #[error("You do not have enough balance in your wallet for this purchase")]
    InsufficientBalance,

    #[error("Please select one shipping address to proceed.")]
    NoAddressSelected,
}

/// Check that an order can be placed.
///
/// # Errors
///
/// Returns the first failing rule: empty cart, then wallet balance below the
/// order total, then missing shipping address.
pub fn validate_checkout(
    items: &[CartItem],
    balance: Price,
    address: Option<&AddressId>,
) -> Result<(), CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if balance < total_cart_value(items) {
        return Err(CheckoutError::InsufficientBalance);
    }
    if address.is_none() {
        return Err(CheckoutError::NoAddressSelected);
    }
    Ok(())
}
