//! Session middleware configuration.
//!
//! Sessions live in memory, in a bounded `moka` cache. The backend owns all
//! durable data; the session only carries the token and UI state, so a
//! restart simply logs everyone out.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "qkart_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on stored sessions; the least valuable are evicted past it.
const MAX_SESSIONS: u64 = 100_000;

/// In-memory session store that evicts idle and excess sessions.
///
/// Every page render stores a session, including anonymous ones, so the
/// store has to forget them on its own. Records idle past the session
/// expiry are dropped by the cache, and `load` also refuses records whose
/// cookie expiry has passed.
#[derive(Clone)]
pub struct MokaSessionStore {
    records: Cache<Id, Record>,
}

impl MokaSessionStore {
    /// Create a store holding at most `max_sessions` records, each dropped
    /// after `idle` without a load or save.
    #[must_use]
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let records = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .build();

        Self { records }
    }

    #[cfg(test)]
    async fn len(&self) -> u64 {
        self.records.run_pending_tasks().await;
        self.records.entry_count()
    }
}

impl Default for MokaSessionStore {
    fn default() -> Self {
        Self::new(
            MAX_SESSIONS,
            Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()),
        )
    }
}

impl std::fmt::Debug for MokaSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaSessionStore")
            .field("sessions", &self.records.entry_count())
            .finish()
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(session_id).await else {
            return Ok(None);
        };

        if record.expiry_date <= OffsetDateTime::now_utc() {
            self.records.invalidate(session_id).await;
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer over a [`MokaSessionStore`].
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaSessionStore> {
    SessionManagerLayer::new(MokaSessionStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record(expires_in: tower_sessions::cookie::time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    fn live_record() -> Record {
        record(tower_sessions::cookie::time::Duration::hours(1))
    }

    #[tokio::test]
    async fn test_saved_session_loads_back() {
        let store = MokaSessionStore::default();
        let mut saved = live_record();
        saved
            .data
            .insert("search_key".to_string(), serde_json::json!("abc"));

        store.create(&mut saved).await.unwrap();
        let loaded = store.load(&saved.id).await.unwrap().unwrap();

        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.data.get("search_key"), Some(&serde_json::json!("abc")));
    }

    #[tokio::test]
    async fn test_expired_session_is_not_loaded_and_is_dropped() {
        let store = MokaSessionStore::default();
        let expired = record(tower_sessions::cookie::time::Duration::seconds(-1));
        store.save(&expired).await.unwrap();

        assert!(store.load(&expired.id).await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_deleted_session_is_gone() {
        let store = MokaSessionStore::default();
        let mut saved = live_record();
        store.create(&mut saved).await.unwrap();

        store.delete(&saved.id).await.unwrap();

        assert!(store.load(&saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_many_anonymous_sessions_stay_bounded() {
        let store = MokaSessionStore::new(10, Duration::from_secs(60));

        for _ in 0..50 {
            let mut anonymous = live_record();
            store.create(&mut anonymous).await.unwrap();
        }

        assert!(store.len().await <= 10);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = MokaSessionStore::new(100, Duration::from_millis(50));
        for _ in 0..5 {
            let mut anonymous = live_record();
            store.create(&mut anonymous).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.len().await, 0);
    }
}
