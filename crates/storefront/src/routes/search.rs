//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::PageContext;
use crate::routes::products::{GridView, ensure_search_key, render};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Product grid (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub grid: GridView,
}

/// Run a search and build the grid.
///
/// An empty query shows the whole catalog. Any backend error, including the
/// 404 the backend sends when nothing matches, shows the empty state.
async fn search_grid(state: &AppState, text: &str) -> GridView {
    let result = if text.is_empty() {
        state
            .api()
            .get_products()
            .await
            .map(|catalog| GridView::from_products(&catalog))
    } else {
        state
            .api()
            .search_products(text)
            .await
            .map(|products| GridView::from_products(&products))
    };

    result.unwrap_or_else(|e| {
        tracing::debug!("Search for {text:?} failed: {e}");
        GridView::failed()
    })
}

/// Full search results page (works without JavaScript).
#[instrument(skip(state, session, auth))]
pub async fn search_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let page = PageContext::load(&session, auth.as_ref()).await;
    let grid = search_grid(&state, &query.q).await;

    render(&state, &session, auth.as_ref(), page, query.q, grid).await
}

/// Debounced live search (HTMX).
///
/// Waits for the session's input to go idle. A keystroke superseded by a
/// newer one answers `204 No Content`, which HTMX leaves unswapped.
#[instrument(skip(state, session))]
pub async fn live(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Response {
    let key = ensure_search_key(&session).await;

    let Some(text) = state.search().settle(&key, query.q).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let grid = search_grid(&state, &text).await;
    ProductGridTemplate { grid }.into_response()
}
