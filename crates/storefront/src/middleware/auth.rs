//! Authentication extractors.
//!
//! A user is logged in when the session holds a backend bearer token. The
//! token, username and wallet balance are written by the login route.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{AuthToken, CurrentUser, session_keys};

/// A logged-in user and their backend token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: AuthToken,
    pub user: CurrentUser,
}

/// Extractor that requires a logged-in user.
///
/// If the user is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.username)
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        load(session)
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the logged-in user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<Authenticated>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => load(session).await,
            None => None,
        };

        Ok(Self(auth))
    }
}

async fn load(session: &Session) -> Option<Authenticated> {
    let token = session
        .get::<String>(session_keys::TOKEN)
        .await
        .ok()
        .flatten()?;
    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;

    Some(Authenticated {
        token: AuthToken::new(token),
        user,
    })
}

/// Store a successful login in the session.
///
/// The session id is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_login(
    session: &Session,
    token: &str,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::TOKEN, token).await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Update the stored user (e.g., after the balance changes).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear all login state (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_login(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::TOKEN).await?;
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::CART_ENTRIES)
        .await?;
    Ok(())
}
