//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every response is a fragment that swaps the cart sidebar and appends
//! toasts out-of-band, so the buttons themselves use `hx-swap="none"`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use qkart_core::{CartItem, Notification, ProductId, total_cart_value, total_items};

use crate::middleware::{OptionalAuth, RequireAuth};
use crate::services::{CartOutcome, CartService};
use crate::state::AppState;

/// Cart row display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cost: String,
    pub qty: u32,
    pub line_total: String,
    /// Quantity sent by the "-" button; 0 removes the row.
    pub dec_qty: u32,
    /// Quantity sent by the "+" button.
    pub inc_qty: u32,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product.id.to_string(),
            name: item.product.name.clone(),
            image: item.product.image.clone(),
            cost: item.product.cost.to_string(),
            qty: item.qty,
            line_total: item.line_total().to_string(),
            dec_qty: item.qty.saturating_sub(1),
            inc_qty: item.qty.saturating_add(1),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
    /// Checkout shows the cart without quantity controls.
    pub read_only: bool,
}

impl CartView {
    #[must_use]
    pub fn new(items: &[CartItem], read_only: bool) -> Self {
        Self {
            items: items.iter().map(CartItemView::from).collect(),
            total: total_cart_value(items).to_string(),
            item_count: total_items(items),
            read_only,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub qty: u32,
}

/// Cart sidebar plus out-of-band toasts (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_fragment.html")]
pub struct CartFragmentTemplate {
    /// `None` when nobody is logged in: only the toasts are swapped.
    pub cart: Option<CartView>,
    pub notifications: Vec<Notification>,
}

impl CartFragmentTemplate {
    fn from_outcome(outcome: CartOutcome, logged_in: bool) -> Self {
        Self {
            cart: logged_in.then(|| CartView::new(&outcome.items, false)),
            notifications: outcome.notification.into_iter().collect(),
        }
    }
}

/// Render a cart outcome, signalling listeners when the cart changed.
fn respond(outcome: CartOutcome, logged_in: bool, changed: bool) -> Response {
    let fragment = CartFragmentTemplate::from_outcome(outcome, logged_in);
    if changed {
        (AppendHeaders([("HX-Trigger", "cart-updated")]), fragment).into_response()
    } else {
        fragment.into_response()
    }
}

fn succeeded(outcome: &CartOutcome) -> bool {
    outcome
        .notification
        .as_ref()
        .is_some_and(|n| n.severity == qkart_core::Severity::Success)
}

/// Cart sidebar fragment.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> impl IntoResponse {
    let outcome = CartService::new(state.api(), &session).fetch(&auth).await;
    CartFragmentTemplate::from_outcome(outcome, true)
}

/// Add one unit of a product to the cart (HTMX).
///
/// Logged-out users and products already in the cart get a warning toast
/// without any backend call.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let outcome = CartService::new(state.api(), &session)
        .add(auth.as_ref(), &product_id)
        .await;

    let changed = succeeded(&outcome);
    respond(outcome, auth.is_some(), changed)
}

/// Set the quantity of a cart row (HTMX). A quantity of 0 removes it.
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let outcome = CartService::new(state.api(), &session)
        .set_quantity(&auth, &product_id, form.qty)
        .await;

    let changed = succeeded(&outcome);
    respond(outcome, true, changed)
}
