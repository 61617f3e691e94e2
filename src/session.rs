//! Chat sessions
//!
//! Each session owns one conversation. A session accepts one message at a
//! time: a send that arrives while another is in flight is rejected rather
//! than queued, so replies always come back in request order.
//!
//! The send slot and the session state are locked separately. A send holds
//! its slot for the whole upstream call but only touches the state briefly
//! at the start and end, so reads never wait on the endpoint. Sessions idle
//! past the configured limit are evicted.

use crate::conversation::{Conversation, InputCase, Turn};
use crate::fetcher::{FallbackReason, Reply, ReplyFetcher};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Idle time after which a session is evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound on the time between background eviction sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("A message is already being answered in this session")]
    Busy,
}

/// Reply to an accepted send
#[derive(Debug, Clone)]
pub struct SessionReply {
    /// Per-session request number, starting at 1
    pub seq: u64,
    pub reply: Reply,
}

/// Point-in-time view of a session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Turns as of the last completed send
    pub turns: Vec<Turn>,
    pub requests: u64,
}

struct SessionState {
    conversation: Conversation,
    last_seq: u64,
    last_active: Instant,
}

struct ChatSession {
    created_at: DateTime<Utc>,
    /// Held for the duration of a send
    slot: tokio::sync::Mutex<()>,
    state: Mutex<SessionState>,
}

impl ChatSession {
    // Every critical section leaves the state consistent, so a poisoned
    // lock still holds usable data.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle past `limit` with no send in flight
    fn is_expired(&self, now: Instant, limit: Duration) -> bool {
        self.slot.try_lock().is_ok() && now.duration_since(self.state().last_active) > limit
    }
}

/// Settings applied to every new session
#[derive(Debug, Clone)]
pub struct SessionTemplate {
    pub context: Vec<String>,
    pub input_case: InputCase,
}

impl Default for SessionTemplate {
    fn default() -> Self {
        Self {
            context: crate::system_prompt::default_context(),
            input_case: InputCase::default(),
        }
    }
}

type SessionMap = HashMap<String, Arc<ChatSession>>;

/// Registry of live sessions
pub struct SessionManager {
    sessions: RwLock<SessionMap>,
    fetcher: ReplyFetcher,
    template: SessionTemplate,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(fetcher: ReplyFetcher, template: SessionTemplate) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            fetcher,
            template,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Create a session seeded with the template context and return its id.
    /// Expired sessions are evicted first.
    pub fn create(&self) -> String {
        self.evict_idle();

        let id = Uuid::new_v4().to_string();
        let conversation =
            Conversation::new(self.template.context.clone(), self.template.input_case);
        let session = ChatSession {
            created_at: Utc::now(),
            slot: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState {
                conversation,
                last_seq: 0,
                last_active: Instant::now(),
            }),
        };
        let live = {
            let mut sessions = self.write_sessions();
            sessions.insert(id.clone(), Arc::new(session));
            sessions.len()
        };
        tracing::info!(session_id = %id, live_sessions = live, "Created chat session");
        id
    }

    /// Answer `message` in session `id`.
    ///
    /// Fails with [`SessionError::Busy`] if the session is still answering a
    /// previous message. The conversation is committed when the reply is
    /// ready; a send dropped midway leaves it unchanged.
    pub async fn send(&self, id: &str, message: &str) -> Result<SessionReply, SessionError> {
        let session = self.get(id)?;
        let _slot = session.slot.try_lock().map_err(|_| {
            tracing::info!(session_id = %id, "Rejected message while a reply is in flight");
            SessionError::Busy
        })?;

        let (mut conversation, seq) = {
            let mut state = session.state();
            state.last_seq += 1;
            state.last_active = Instant::now();
            (state.conversation.clone(), state.last_seq)
        };
        tracing::debug!(session_id = %id, seq, "Fetching reply");

        let reply = self.fetcher.fetch_reply(&mut conversation, message).await;
        tracing::info!(
            session_id = %id,
            seq,
            turns = conversation.len(),
            reply_chars = reply.text().map_or(0, str::len),
            fallback_reason = reply.fallback_reason().map_or("none", FallbackReason::as_str),
            "Reply ready"
        );

        {
            let mut state = session.state();
            state.conversation = conversation;
            state.last_active = Instant::now();
        }

        Ok(SessionReply { seq, reply })
    }

    /// Current view of session `id`. Never waits for an in-flight send.
    pub fn snapshot(&self, id: &str) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id)?;
        let mut state = session.state();
        state.last_active = Instant::now();
        Ok(SessionSnapshot {
            id: id.to_string(),
            created_at: session.created_at,
            turns: state.conversation.turns().to_vec(),
            requests: state.last_seq,
        })
    }

    /// Drop sessions idle past the timeout. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let (evicted, live) = {
            let mut sessions = self.write_sessions();
            let before = sessions.len();
            sessions.retain(|_, session| !session.is_expired(now, self.idle_timeout));
            (before - sessions.len(), sessions.len())
        };
        if evicted > 0 {
            tracing::info!(evicted, live_sessions = live, "Evicted idle chat sessions");
        }
        evicted
    }

    /// Sweep idle sessions in the background until the manager is dropped
    pub fn spawn_idle_sweep(manager: &Arc<Self>) -> JoinHandle<()> {
        let period = manager.idle_timeout.min(MAX_SWEEP_INTERVAL);
        let manager: Weak<Self> = Arc::downgrade(manager);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.evict_idle();
            }
        })
    }

    fn get(&self, id: &str) -> Result<Arc<ChatSession>, SessionError> {
        self.read_sessions()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    // The map is only touched for inserts, lookups and removals, so a
    // poisoned lock still holds a consistent map.
    fn read_sessions(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, SessionMap> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}
