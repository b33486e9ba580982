//! Checkout route handlers.
//!
//! The checkout page shows the cart read-only next to the wallet balance and
//! the saved addresses. Placing an order validates locally, then asks the
//! backend to charge the wallet and empty the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use qkart_core::{Address, AddressId, Notification, Price, total_cart_value, validate_checkout};

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{RequireAuth, update_user};
use crate::notifications;
use crate::routes::cart::CartView;
use crate::routes::{BACKEND_UNREACHABLE, PageContext};
use crate::services::CartService;
use crate::state::AppState;

/// Shown after an order is placed.
pub const ORDER_PLACED: &str = "Order placed successfully";

/// Shown after an address is saved.
pub const ADDRESS_ADDED: &str = "Address added";

/// Shown after an address is deleted.
pub const ADDRESS_DELETED: &str = "Address deleted";

/// Shown when the new-address form is blank.
pub const ADDRESS_REQUIRED: &str = "Please enter an address";

/// Saved address display data for templates.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub address: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.to_string(),
            address: address.address.clone(),
        }
    }
}

/// Place order form data.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    /// Radio selection; absent when nothing is picked.
    #[serde(default)]
    pub address_id: Option<String>,
}

/// New address form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub address: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub addresses: Vec<AddressView>,
    pub balance: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/thanks.html")]
pub struct ThanksTemplate {
    pub page: PageContext,
    pub balance: String,
}

/// Display the checkout page.
#[instrument(skip(state, session, auth), fields(username = %auth.user.username))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> impl IntoResponse {
    let mut page = PageContext::load(&session, Some(&auth)).await;

    let outcome = CartService::new(state.api(), &session).fetch(&auth).await;
    if let Some(notification) = outcome.notification {
        page.notify(notification);
    }

    let addresses = match state.api().get_addresses(&auth.token).await {
        Ok(addresses) => addresses.iter().map(AddressView::from).collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch addresses: {e}");
            page.notify(Notification::error(e.user_message(BACKEND_UNREACHABLE)));
            Vec::new()
        }
    };

    CheckoutTemplate {
        page,
        cart: CartView::new(&outcome.items, true),
        addresses,
        balance: auth.user.balance.to_string(),
    }
}

/// Place an order.
///
/// On success the session balance drops by the order total and the user
/// lands on `/thanks`; otherwise they go back to `/checkout` with a toast.
#[instrument(skip(state, session, auth, form), fields(username = %auth.user.username))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<PlaceOrderForm>,
) -> Response {
    let cart = CartService::new(state.api(), &session);
    let outcome = cart.fetch(&auth).await;
    if let Some(notification) = outcome.notification {
        notifications::push(&session, notification).await;
        return Redirect::to("/checkout").into_response();
    }

    let address_id = form
        .address_id
        .filter(|id| !id.is_empty())
        .map(AddressId::new);

    if let Err(e) = validate_checkout(&outcome.items, auth.user.balance, address_id.as_ref()) {
        notifications::push(&session, Notification::warning(e.to_string())).await;
        return Redirect::to("/checkout").into_response();
    }

    // validate_checkout rejects a missing address
    let Some(address_id) = address_id else {
        return Redirect::to("/checkout").into_response();
    };

    if let Err(e) = state.api().checkout(&auth.token, &address_id).await {
        tracing::warn!("Checkout failed: {e}");
        notifications::push(
            &session,
            Notification::error(e.user_message(BACKEND_UNREACHABLE)),
        )
        .await;
        return Redirect::to("/checkout").into_response();
    }

    let total = total_cart_value(&outcome.items);
    let mut user = auth.user;
    user.balance = remaining_balance(user.balance, total);

    if let Err(e) = update_user(&session, &user).await {
        tracing::error!("Failed to update balance in session: {e}");
    }
    cart.forget().await;

    let total = total.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("total", total.as_str())]));
    notifications::push(&session, Notification::success(ORDER_PLACED)).await;
    Redirect::to("/thanks").into_response()
}

/// Save a new shipping address.
#[instrument(skip(state, session, auth, form))]
pub async fn add_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Response {
    let address = form.address.trim();
    if address.is_empty() {
        notifications::push(&session, Notification::warning(ADDRESS_REQUIRED)).await;
        return Redirect::to("/checkout").into_response();
    }

    let notification = match state.api().add_address(&auth.token, address).await {
        Ok(_) => Notification::success(ADDRESS_ADDED),
        Err(e) => {
            tracing::warn!("Failed to add address: {e}");
            Notification::error(e.user_message(BACKEND_UNREACHABLE))
        }
    };

    notifications::push(&session, notification).await;
    Redirect::to("/checkout").into_response()
}

/// Delete a saved shipping address.
#[instrument(skip(state, session, auth))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let notification = match state
        .api()
        .delete_address(&auth.token, &AddressId::new(id))
        .await
    {
        Ok(_) => Notification::success(ADDRESS_DELETED),
        Err(e) => {
            tracing::warn!("Failed to delete address: {e}");
            Notification::error(e.user_message(BACKEND_UNREACHABLE))
        }
    };

    notifications::push(&session, notification).await;
    Redirect::to("/checkout").into_response()
}

/// Order confirmation page.
pub async fn thanks(session: Session, RequireAuth(auth): RequireAuth) -> impl IntoResponse {
    ThanksTemplate {
        balance: auth.user.balance.to_string(),
        page: PageContext::load(&session, Some(&auth)).await,
    }
}

/// Balance left after paying `total`. Never negative.
fn remaining_balance(balance: Price, total: Price) -> Price {
    Price::new((balance.amount() - total.amount()).max(rust_decimal::Decimal::ZERO))
}
