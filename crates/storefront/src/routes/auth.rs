//! Authentication route handlers.
//!
//! Handles login, registration and logout against the QKart backend. Form
//! rules are checked locally first so a bad form never reaches the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use qkart_core::{Notification, validate_login, validate_registration};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_login, set_login};
use crate::models::CurrentUser;
use crate::notifications;
use crate::routes::{BACKEND_UNREACHABLE, PageContext};
use crate::state::AppState;

/// Shown after a successful login.
pub const LOGGED_IN: &str = "Logged in successfully";

/// Shown after a successful registration.
pub const REGISTERED: &str = "Registered successfully";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session, OptionalAuth(auth): OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        page: PageContext::load(&session, auth.as_ref()).await,
    }
}

/// Handle login form submission.
///
/// Stores the token, username and balance in the session on success.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if let Err(e) = validate_login(&form.username, &form.password) {
        notifications::push(&session, Notification::warning(e.to_string())).await;
        return Ok(Redirect::to("/login").into_response());
    }

    let response = match state.api().login(&form.username, &form.password).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            notifications::push(
                &session,
                Notification::error(e.user_message(BACKEND_UNREACHABLE)),
            )
            .await;
            return Ok(Redirect::to("/login").into_response());
        }
    };

    let user = CurrentUser {
        username: response.username,
        balance: response.balance,
    };

    set_login(&session, &response.token, &user).await?;

    set_sentry_user(&user.username);
    notifications::push(&session, Notification::success(LOGGED_IN)).await;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::load(&session, auth.as_ref()).await,
    }
}

/// Handle registration form submission.
///
/// Does not log the user in; a successful registration lands on the login page.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(e) = validate_registration(&form.username, &form.password, &form.confirm_password)
    {
        notifications::push(&session, Notification::warning(e.to_string())).await;
        return Redirect::to("/register").into_response();
    }

    match state.api().register(&form.username, &form.password).await {
        Ok(()) => {
            notifications::push(&session, Notification::success(REGISTERED)).await;
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            notifications::push(
                &session,
                Notification::error(e.user_message(BACKEND_UNREACHABLE)),
            )
            .await;
            Redirect::to("/register").into_response()
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Clears the login state and the rest of the session.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_login(&session).await?;
    session.flush().await?;

    clear_sentry_user();
    Ok(Redirect::to("/"))
}
