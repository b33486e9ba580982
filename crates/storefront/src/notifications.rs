//! Session-backed notification queue (toasts).
//!
//! Handlers push notifications while handling a request; the next full page
//! render (or the HTMX fragment returned by the same request) drains them.
//! Session write failures are logged and otherwise ignored: losing a toast
//! never fails a request.

use tower_sessions::Session;

use qkart_core::Notification;

use crate::models::session_keys;

/// Queue a notification for the next render.
pub async fn push(session: &Session, notification: Notification) {
    let mut queued = peek(session).await;
    queued.push(notification);

    if let Err(e) = session.insert(session_keys::NOTIFICATIONS, &queued).await {
        tracing::warn!("Failed to queue notification: {e}");
    }
}

/// Remove and return every queued notification.
pub async fn take(session: &Session) -> Vec<Notification> {
    match session
        .remove::<Vec<Notification>>(session_keys::NOTIFICATIONS)
        .await
    {
        Ok(queued) => queued.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read notifications: {e}");
            Vec::new()
        }
    }
}

async fn peek(session: &Session) -> Vec<Notification> {
    session
        .get::<Vec<Notification>>(session_keys::NOTIFICATIONS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
