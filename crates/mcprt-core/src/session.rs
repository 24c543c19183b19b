//! Transport-agnostic session store.
//!
//! HTTP and stdio server transports both need to track a handful of active
//! connections: when they were created, when they were last touched, and a
//! small bag of arbitrary data the transport or the application wants to
//! associate with them (e.g. the negotiated protocol version, a queued
//! message cursor). This module is the single place that owns that state so
//! neither transport has to reinvent it.
//!
//! Session ids are v4 UUIDs, which carry 122 bits of randomness — comfortably
//! above what's needed to make them unguessable when exposed on the wire as
//! an `Mcp-Session-Id` header.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// A single tracked session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: SystemTime,
    pub last_activity_at: SystemTime,
    pub data: HashMap<String, Value>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            created_at: now,
            last_activity_at: now,
            data: HashMap::new(),
        }
    }

    fn touch(&mut self) {
        self.last_activity_at = SystemTime::now();
    }

    pub fn is_expired(&self, timeout_secs: u64) -> bool {
        self.last_activity_at
            .elapsed()
            .map(|d| d.as_secs() > timeout_secs)
            .unwrap_or(true)
    }
}

/// Callback invoked when a session is terminated, either explicitly via
/// [`SessionStore::terminate`] or implicitly through expiry cleanup.
pub type TerminationCallback = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Clone)]
pub struct SessionStoreConfig {
    /// Whether the store actually tracks sessions at all. A stateless server
    /// never creates or accepts `Mcp-Session-Id` values; `create`/`get` on a
    /// stateless store are no-ops that always return `None`.
    pub stateful: bool,
    /// Seconds of inactivity after which a session is considered expired.
    pub timeout_secs: u64,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            stateful: true,
            timeout_secs: 3600,
        }
    }
}

/// Shared session store usable from any transport.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    config: SessionStoreConfig,
    on_terminated: Arc<RwLock<Vec<TerminationCallback>>>,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            on_terminated: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn stateless() -> Self {
        Self::new(SessionStoreConfig {
            stateful: false,
            timeout_secs: 0,
        })
    }

    pub fn is_stateful(&self) -> bool {
        self.config.stateful
    }

    /// Create a new session with a fresh, cryptographically random id.
    ///
    /// Returns `None` for a stateless store.
    pub async fn create(&self) -> Option<Session> {
        if !self.config.stateful {
            return None;
        }
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(id.clone());
        self.sessions.write().await.insert(id, session.clone());
        Some(session)
    }

    /// Look up a session by id, refreshing its last-activity timestamp.
    /// Expired sessions are evicted and treated as not found.
    pub async fn get(&self, id: &str) -> Option<Session> {
        if !self.config.stateful {
            return None;
        }
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.is_expired(self.config.timeout_secs) => {
                let removed = sessions.remove(id);
                drop(sessions);
                if let Some(session) = removed {
                    self.notify_terminated(&session).await;
                }
                None
            }
            Some(session) => {
                session.touch();
                Some(session.clone())
            }
            None => None,
        }
    }

    /// Fetch a session by id, creating one with that exact id if it doesn't
    /// exist yet. Used when a transport has already minted an id (e.g. the
    /// HTTP `Mcp-Session-Id` header) before the store gets a chance to.
    ///
    /// Returns `None` for a stateless store.
    pub async fn get_or_create(&self, id: &str) -> Option<Session> {
        if !self.config.stateful {
            return None;
        }
        if let Some(session) = self.get(id).await {
            return Some(session);
        }
        let session = Session::new(id.to_string());
        self.sessions
            .write()
            .await
            .insert(id.to_string(), session.clone());
        Some(session)
    }

    /// Read a single value out of a session's data bag.
    pub async fn get_data(&self, id: &str, key: &str) -> Option<Value> {
        self.sessions.read().await.get(id)?.data.get(key).cloned()
    }

    /// Merge a key/value pair into a session's data bag.
    pub async fn set_data(&self, id: &str, key: impl Into<String>, value: Value) -> bool {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.data.insert(key.into(), value);
            session.touch();
            true
        } else {
            false
        }
    }

    /// Terminate a session, firing registered termination callbacks.
    pub async fn terminate(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                self.notify_terminated(&session).await;
                true
            }
            None => false,
        }
    }

    /// Register a callback to run whenever a session is terminated
    /// (explicitly or via expiry).
    pub async fn on_terminated<F>(&self, callback: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.on_terminated.write().await.push(Arc::new(callback));
    }

    async fn notify_terminated(&self, session: &Session) {
        for callback in self.on_terminated.read().await.iter() {
            callback(session);
        }
    }

    /// Sweep expired sessions, firing termination callbacks for each.
    pub async fn cleanup_expired(&self) {
        let expired: Vec<Session> = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .filter(|s| s.is_expired(self.config.timeout_secs))
                .cloned()
                .collect()
        };
        if expired.is_empty() {
            return;
        }
        let mut sessions = self.sessions.write().await;
        for session in &expired {
            sessions.remove(&session.id);
        }
        drop(sessions);
        for session in &expired {
            self.notify_terminated(session).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
