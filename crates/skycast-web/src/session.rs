//! Cookie-keyed session store backing the per-user forecast cache.
//!
//! Sessions live in memory only. Idle sessions expire, and the store never
//! holds more than its capacity: starting a session when full evicts the
//! least recently used one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use skycast_weather::SessionCache;

pub const SESSION_COOKIE: &str = "skycast_session";

/// Sessions unused for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Upper bound on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// A resolved session for one request.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub cache: Arc<SessionCache>,
    /// The client does not hold this id yet and needs a `Set-Cookie`
    pub is_new: bool,
}

impl Session {
    /// `Set-Cookie` value for this session. No expiry, so it ends with the browser session.
    pub fn cookie(&self) -> String {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id)
    }
}

#[derive(Debug)]
struct SessionEntry {
    cache: Arc<SessionCache>,
    last_seen: Instant,
    /// Monotonic use counter, orders entries for eviction
    last_use: u64,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) >= idle_timeout
    }
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    uses: u64,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<Sessions>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a custom idle timeout and capacity (at least one session).
    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up the session named by the request cookie, or start a new one.
    ///
    /// Unknown or expired ids (e.g. from before a restart) get a fresh id
    /// rather than being adopted.
    pub fn resolve(&self, cookie: Option<&str>) -> Session {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        sessions.uses += 1;
        let tick = sessions.uses;

        if let Some(id) = cookie {
            let expired = match sessions.entries.get_mut(id) {
                Some(entry) if !entry.is_expired(now, self.idle_timeout) => {
                    entry.last_seen = now;
                    entry.last_use = tick;
                    return Session {
                        id: id.to_string(),
                        cache: Arc::clone(&entry.cache),
                        is_new: false,
                    };
                }
                Some(_) => true,
                None => false,
            };
            if expired {
                sessions.entries.remove(id);
                tracing::debug!("Session {} expired", id);
            }
        }

        self.sweep(&mut sessions, now);

        let id = uuid::Uuid::new_v4().to_string();
        let cache = Arc::new(SessionCache::new());
        sessions.entries.insert(
            id.clone(),
            SessionEntry {
                cache: Arc::clone(&cache),
                last_seen: now,
                last_use: tick,
            },
        );
        tracing::debug!("Started session {}", id);

        Session {
            id,
            cache,
            is_new: true,
        }
    }

    /// Drop expired sessions, then evict the least recently used until
    /// there is room for one more.
    fn sweep(&self, sessions: &mut Sessions, now: Instant) {
        let before = sessions.entries.len();
        sessions
            .entries
            .retain(|_, entry| !entry.is_expired(now, self.idle_timeout));

        while sessions.entries.len() >= self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_use)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.entries.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.entries.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} idle or surplus sessions", dropped);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::{ForecastCache, NormalizedForecast};

    #[test]
    fn test_new_session_without_cookie() {
        let store = SessionStore::new();
        let session = store.resolve(None);
        assert!(session.is_new);
        assert_eq!(store.len(), 1);
        assert!(session.cookie().starts_with("skycast_session="));
        assert!(session.cookie().contains("HttpOnly"));
    }

    #[test]
    fn test_known_cookie_shares_cache() {
        let store = SessionStore::new();
        let first = store.resolve(None);
        first.cache.set("Oslo", NormalizedForecast::default());

        let again = store.resolve(Some(&first.id));
        assert!(!again.is_new);
        assert_eq!(again.id, first.id);
        assert!(again.cache.get("Oslo").is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_cookie_gets_fresh_session() {
        let store = SessionStore::new();
        let session = store.resolve(Some("forged-id"));
        assert!(session.is_new);
        assert_ne!(session.id, "forged-id");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.resolve(None);
        let b = store.resolve(None);
        a.cache.set("Rome", NormalizedForecast::default());
        assert!(b.cache.get("Rome").is_none());
    }

    #[test]
    fn test_store_stays_within_capacity() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 3);
        for _ in 0..1000 {
            store.resolve(None);
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 2);
        let a = store.resolve(None);
        let b = store.resolve(None);

        // Touch `a` so `b` is the oldest
        assert!(!store.resolve(Some(&a.id)).is_new);
        store.resolve(None);

        assert!(!store.resolve(Some(&a.id)).is_new);
        assert!(store.resolve(Some(&b.id)).is_new);
    }

    #[test]
    fn test_idle_session_expires() {
        let store = SessionStore::with_limits(Duration::ZERO, 100);
        let first = store.resolve(None);

        let again = store.resolve(Some(&first.id));
        assert!(again.is_new);
        assert_ne!(again.id, first.id);
        assert_eq!(store.len(), 1);
    }
}
