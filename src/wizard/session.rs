//! Registry of open wizard sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{Wizard, WizardKind};

/// One open wizard plus the token that abandons its in-flight saves.
pub struct Session {
    pub id: Uuid,
    pub wizard: Mutex<Wizard>,
    pub cancel: CancellationToken,
    last_seen: std::sync::Mutex<Instant>,
}

impl Session {
    fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.lock() {
            *last_seen = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}

/// Open sessions keyed by session id.
pub struct WizardSessions {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    idle_ttl: Duration,
}

impl WizardSessions {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Start a fresh wizard at step 0 with a blank form and no record.
    pub async fn open(&self, kind: WizardKind) -> Arc<Session> {
        self.evict_idle().await;

        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            wizard: Mutex::new(Wizard::new(kind)),
            cancel: CancellationToken::new(),
            last_seen: std::sync::Mutex::new(Instant::now()),
        });
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());

        tracing::info!(session_id = %session.id, wizard = kind.as_str(), "Wizard opened");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Abandon a session. Any save still in flight is cancelled and its outcome discarded;
    /// a record it already created stays `partial`.
    pub async fn close(&self, id: Uuid) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(session) => {
                session.cancel.cancel();
                tracing::info!(session_id = %id, "Wizard closed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn evict_idle(&self) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.idle_for() < self.idle_ttl;
            if !keep {
                session.cancel.cancel();
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle wizard sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_cancels_and_reopen_starts_over() {
        let sessions = WizardSessions::new(Duration::from_secs(60));
        let first = sessions.open(WizardKind::Creator).await;

        assert!(sessions.close(first.id).await);
        assert!(first.cancel.is_cancelled());
        assert!(sessions.get(first.id).await.is_none());
        assert!(!sessions.close(first.id).await);

        let second = sessions.open(WizardKind::Creator).await;
        assert_ne!(second.id, first.id);
        let wizard = second.wizard.lock().await;
        assert_eq!(wizard.current_step(), 0);
        assert!(wizard.record_id().is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted_on_open() {
        let sessions = WizardSessions::new(Duration::ZERO);
        let stale = sessions.open(WizardKind::Therapist).await;

        sessions.open(WizardKind::Therapist).await;

        assert!(stale.cancel.is_cancelled());
        assert_eq!(sessions.len().await, 1);
    }
}
