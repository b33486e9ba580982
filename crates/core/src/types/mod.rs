//! Core types for QKart.
//!
//! This module provides type-safe wrappers for the backend's wire objects.

pub mod address;
pub mod cart_entry;
pub mod id;
pub mod notification;
pub mod price;
pub mod product;

pub use address::Address;
pub use cart_entry::{CartEntry, CartItem};
pub use id::*;
pub use notification::{Notification, Severity};
pub use price::Price;
pub use product::Product;
