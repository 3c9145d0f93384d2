//! §4.5 Session Manager: keyed map from session id to [`Session`], a
//! per-session mutex standing in for the single-holder lock flag, and a
//! background sweeper that deletes idle sessions. Grounded on
//! `conversation_manager.rs`'s `Arc<RwLock<HashMap<Uuid, Arc<...>>>>` shape,
//! swapped to `tokio::sync::Mutex` per session so the "lock" in the spec is
//! the mutex itself rather than a side flag.

use std::collections::HashMap;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;
use std::time::Duration;

use reasoning_protocol::AnalysisKind;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SessionId;
use reasoning_protocol::SessionStatus;
use reasoning_protocol::SessionStatusSnapshot;
use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;

use crate::adapter::ChatSession;
use crate::error::CoreError;
use crate::error::Result;
use crate::session::Session;
use crate::session::now_epoch_secs;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

type SessionMap = RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>;

/// An exclusive, RAII handle on a [`Session`]. Dropping it — including when
/// the holding future is cancelled mid-await — releases the lock and, unless
/// the session reached a terminal state, returns it to `active` (spec.md
/// §4.5's cancellation rule: "the lock is still released and the session is
/// marked active, not abandoned").
pub struct SessionGuard {
    inner: OwnedMutexGuard<Session>,
}

impl Deref for SessionGuard {
    type Target = Session;
    fn deref(&self) -> &Session {
        &self.inner
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.inner
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.inner.status == SessionStatus::Processing {
            self.inner.status = SessionStatus::Active;
            self.inner.touch();
        }
    }
}

pub struct SessionManager {
    sessions: Arc<SessionMap>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new() -> Arc<Self> {
        let sessions: Arc<SessionMap> = Arc::new(RwLock::new(HashMap::new()));
        let sweeper_sessions = sessions.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                sweep_idle_sessions(&sweeper_sessions).await;
            }
        });

        Arc::new(Self {
            sessions,
            sweeper: Mutex::new(Some(handle)),
        })
    }

    pub async fn create(
        &self,
        analysis_kind: AnalysisKind,
        context: RequestContext,
        chat: Box<dyn ChatSession>,
    ) -> SessionId {
        let id = SessionId::new();
        let session = Session::new(id, analysis_kind, context, chat);
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    async fn session_arc(&self, id: SessionId) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CoreError::SessionNotFound)
    }

    fn is_idle(last_activity_epoch_secs: u64) -> bool {
        now_epoch_secs().saturating_sub(last_activity_epoch_secs) > IDLE_TIMEOUT.as_secs()
    }

    /// §4.5's `get`: a read-only snapshot. A session idle past the timeout
    /// is marked abandoned in place and reported as not-found, same as if it
    /// were absent.
    pub async fn snapshot(&self, id: SessionId) -> Result<SessionStatusSnapshot> {
        let arc = self.session_arc(id).await?;
        let mut session = arc.lock().await;
        if Self::is_idle(session.last_activity_epoch_secs) {
            session.status = SessionStatus::Abandoned;
            return Err(CoreError::SessionNotFound);
        }
        let can_finalize = session.should_complete();
        Ok(session.snapshot(can_finalize))
    }

    /// §4.5's `acquireLock`: atomically moves `active` to `processing`.
    /// Returns `SessionLocked` if another call currently holds the session,
    /// `SessionTimeout` if it had gone idle, `SessionCompleted` if it was
    /// already finalized. `addTurn`'s contract (spec.md §4.5) only permits
    /// appending turns while status is `active` or `processing`, so
    /// `continueConversation` passes `allow_completing = false` and is
    /// rejected once the turn cap or confidence threshold has pushed the
    /// session into `completing`; `finalizeConversation` passes `true`
    /// since completing is exactly the state finalize is meant to close out
    /// (spec.md §4.6: "acquireLock identically").
    pub async fn acquire_lock(&self, id: SessionId, allow_completing: bool) -> Result<SessionGuard> {
        let arc = self.session_arc(id).await?;
        let mut inner = arc
            .try_lock_owned()
            .map_err(|_| CoreError::SessionLocked)?;

        if Self::is_idle(inner.last_activity_epoch_secs) {
            inner.status = SessionStatus::Abandoned;
            return Err(CoreError::SessionTimeout);
        }
        match inner.status {
            SessionStatus::Completed => return Err(CoreError::SessionCompleted),
            SessionStatus::Abandoned => return Err(CoreError::SessionTimeout),
            SessionStatus::Completing if !allow_completing => {
                return Err(CoreError::SessionCompleted);
            }
            _ => {}
        }

        inner.status = SessionStatus::Processing;
        inner.touch();
        Ok(SessionGuard { inner })
    }

    /// §4.5's `destroy`: stop the sweeper and drop every session. Test hook.
    pub async fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
        }
        self.sessions.write().await.clear();
    }
}

async fn sweep_idle_sessions(sessions: &SessionMap) {
    let idle_ids: Vec<SessionId> = {
        let map = sessions.read().await;
        let mut idle = Vec::new();
        for (id, arc) in map.iter() {
            if let Ok(session) = arc.try_lock() {
                if SessionManager::is_idle(session.last_activity_epoch_secs) {
                    idle.push(*id);
                }
            }
        }
        idle
    };
    if idle_ids.is_empty() {
        return;
    }
    let mut map = sessions.write().await;
    for id in &idle_ids {
        map.remove(id);
    }
    info!(count = idle_ids.len(), "sweeper deleted idle sessions");
    debug!(?idle_ids, "sweeper deleted these session ids");
}
