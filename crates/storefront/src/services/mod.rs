//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart fetch, add-to-cart gate and quantity updates over the
//!   QKart backend, with the last known cart kept in the session

pub mod cart;

pub use cart::{CartOutcome, CartService};
