//! In-memory registry of quiz sessions, keyed by id.
//!
//! Each session sits behind its own mutex, so one request at a time drives a
//! given session while different sessions proceed independently. Sessions not
//! looked up for longer than the idle TTL are discarded, on every insert and by
//! the periodic sweeper.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::quiz::session::QuizSession;

pub const DEFAULT_IDLE_TTL_SECS: i64 = 60 * 60;

pub type SessionHandle = Arc<Mutex<QuizSession>>;

struct StoredSession {
    handle: SessionHandle,
    last_touched: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::seconds(DEFAULT_IDLE_TTL_SECS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn insert(&self, session: QuizSession) -> SessionHandle {
        self.insert_at(session, Utc::now()).await
    }

    pub(crate) async fn insert_at(&self, session: QuizSession, now: DateTime<Utc>) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.write().await;
        let evicted = evict(&mut sessions, self.idle_ttl, now);
        if evicted > 0 {
            info!("Evicted {evicted} idle quiz sessions");
        }
        sessions.insert(
            id,
            StoredSession {
                handle: Arc::clone(&handle),
                last_touched: now,
            },
        );
        handle
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.get_at(id, Utc::now()).await
    }

    pub(crate) async fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get_mut(&id)?;
        stored.last_touched = now;
        Some(Arc::clone(&stored.handle))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        evict(&mut sessions, self.idle_ttl, now)
    }

    /// Runs `evict_idle` every `every` for the life of the process.
    pub fn spawn_sweeper(&self, every: std::time::Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(Utc::now()).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle quiz sessions");
                }
            }
        })
    }
}

fn evict(sessions: &mut HashMap<Uuid, StoredSession>, idle_ttl: Duration, now: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, stored| now - stored.last_touched <= idle_ttl);
    before - sessions.len()
}
