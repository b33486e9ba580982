//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use qkart_core::{Notification, Product};

use crate::filters;
use crate::middleware::{Authenticated, OptionalAuth};
use crate::models::session_keys;
use crate::routes::{BACKEND_UNREACHABLE, PageContext};
use crate::routes::cart::CartView;
use crate::services::CartService;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub cost: String,
    pub rating: u8,
    pub image: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            cost: product.cost.to_string(),
            rating: product.stars(),
            image: product.image.clone(),
        }
    }
}

/// Product grid state shared by the full page and the live-search fragment.
#[derive(Debug, Clone, Default)]
pub struct GridView {
    pub products: Vec<ProductView>,
    /// The last fetch or search failed; show the empty state instead of the grid.
    pub error: bool,
}

impl GridView {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        Self {
            products: products.iter().map(ProductView::from).collect(),
            error: false,
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self {
            products: Vec::new(),
            error: true,
        }
    }
}

/// Products page template (also used for the no-JS search page).
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub page: PageContext,
    pub query: String,
    pub grid: GridView,
    pub cart: Option<CartView>,
    pub debounce_ms: u128,
}

/// Display the products page.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> impl IntoResponse {
    let mut page = PageContext::load(&session, auth.as_ref()).await;

    let grid = match state.api().get_products().await {
        Ok(catalog) => GridView::from_products(&catalog),
        Err(e) => {
            tracing::warn!("Failed to fetch products: {e}");
            page.notify(Notification::error(e.user_message(BACKEND_UNREACHABLE)));
            GridView::failed()
        }
    };

    render(&state, &session, auth.as_ref(), page, String::new(), grid).await
}

/// Render the products page with the cart sidebar for logged-in users.
pub(crate) async fn render(
    state: &AppState,
    session: &Session,
    auth: Option<&Authenticated>,
    mut page: PageContext,
    query: String,
    grid: GridView,
) -> ProductsTemplate {
    ensure_search_key(session).await;

    let cart = match auth {
        Some(auth) => {
            let outcome = CartService::new(state.api(), session).fetch(auth).await;
            if let Some(notification) = outcome.notification {
                page.notify(notification);
            }
            Some(CartView::new(&outcome.items, false))
        }
        None => None,
    };

    ProductsTemplate {
        page,
        query,
        grid,
        cart,
        debounce_ms: state.search().delay().as_millis(),
    }
}

/// Give the session a stable key for search debouncing.
///
/// Assigned when the page is rendered so the cookie exists before the
/// first keystroke.
pub(crate) async fn ensure_search_key(session: &Session) -> String {
    if let Ok(Some(key)) = session.get::<String>(session_keys::SEARCH_KEY).await {
        return key;
    }

    let key = Uuid::new_v4().to_string();
    if let Err(e) = session.insert(session_keys::SEARCH_KEY, &key).await {
        tracing::warn!("Failed to store search key: {e}");
    }
    key
}

#[cfg(test)]
mod tests {
    use qkart_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_product_view_formats_cost_and_rating() {
        let product = Product {
            id: ProductId::new("v4sLtEcMpzabRyfx"),
            name: "iPhone XR".to_string(),
            category: "Phones".to_string(),
            cost: Price::from_units(100),
            rating: 7,
            image: "https://i.imgur.com/lulqWzW.jpg".to_string(),
        };

        let view = ProductView::from(&product);
        assert_eq!(view.id, "v4sLtEcMpzabRyfx");
        assert_eq!(view.cost, "$100");
        assert_eq!(view.rating, 5);
    }

    #[test]
    fn test_failed_grid_is_empty() {
        let grid = GridView::failed();
        assert!(grid.error);
        assert!(grid.products.is_empty());
    }
}
