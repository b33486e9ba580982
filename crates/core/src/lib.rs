//! QKart Core - Shared domain types and cart logic.
//!
//! This crate provides the types and pure rules used by the storefront:
//! - [`types`] - Products, cart entries, addresses, notifications and IDs
//! - [`cart`] - Joining cart entries with the catalog and the add-to-cart gate
//! - [`checkout`] - Order totals and checkout validation
//! - [`validation`] - Login and registration form rules
//!
//! # Architecture
//!
//! The core crate contains only types and functions - no I/O, no HTTP
//! clients, no sessions. The storefront feeds it data fetched from the
//! QKart backend and renders whatever it returns.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;
pub mod validation;

pub use cart::{
    AddToCartRejection, check_add_to_cart, generate_cart_items, is_item_in_cart,
    total_cart_value, total_items,
};
pub use checkout::{CheckoutError, validate_checkout};
pub use types::*;
pub use validation::{ValidationError, validate_login, validate_registration};
