//! Per-user working state for the web flow: the uploaded texts, the latest
//! analysis and the latest enhanced resume. Held in memory only.

pub mod handlers;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::analysis::AnalysisReport;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub resume_text: String,
    pub jd_text: String,
    pub analysis: Option<AnalysisReport>,
    pub enhanced: Option<EnhancedResume>,
}

#[derive(Debug, Clone)]
pub struct EnhancedResume {
    pub text: String,
    pub docx: Bytes,
    pub export_path: PathBuf,
}

/// Cheaply cloneable handle to the in-memory session map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts a session for a freshly uploaded resume and job description.
    /// Expired sessions are dropped on the way in.
    pub async fn create(&self, resume_text: String, jd_text: String) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            created_at: now,
            resume_text,
            jd_text,
            analysis: None,
            enhanced: None,
        };

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !self.is_expired(s, now));
        if sessions.len() < before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }
        sessions.insert(session.id, session.clone());
        session
    }

    /// A snapshot of the session, if it exists and has not expired.
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        let sessions = self.inner.read().await;
        sessions
            .get(&id)
            .filter(|s| !self.is_expired(s, Utc::now()))
            .cloned()
    }

    /// Applies `update` to a live session. Returns `None` if the session is gone.
    pub async fn update<R>(&self, id: Uuid, update: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.inner.write().await;
        let now = Utc::now();
        sessions
            .get_mut(&id)
            .filter(|s| !self.is_expired(s, now))
            .map(update)
    }

    /// Sessions held, including expired ones not yet pruned.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.created_at) > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get_returns_texts() {
        let store = SessionStore::new(3600);
        let created = store.create("resume".to_string(), "jd".to_string()).await;

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched.resume_text, "resume");
        assert_eq!(fetched.jd_text, "jd");
        assert!(fetched.analysis.is_none());
    }

    #[tokio::test]
    async fn test_update_mutates_stored_session() {
        let store = SessionStore::new(3600);
        let created = store.create("resume".to_string(), "jd".to_string()).await;

        let len = store
            .update(created.id, |s| {
                s.jd_text.push_str(" updated");
                s.jd_text.len()
            })
            .await;

        assert_eq!(len, Some("jd updated".len()));
        assert_eq!(store.get(created.id).await.unwrap().jd_text, "jd updated");
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = SessionStore::new(3600);
        assert!(store.get(Uuid::new_v4()).await.is_none());
        assert!(store.update(Uuid::new_v4(), |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_hidden_and_pruned() {
        let store = SessionStore::new(60);
        let old = store.create("old".to_string(), "jd".to_string()).await;
        store
            .inner
            .write()
            .await
            .get_mut(&old.id)
            .unwrap()
            .created_at -= Duration::seconds(120);

        assert!(store.get(old.id).await.is_none());

        store.create("new".to_string(), "jd".to_string()).await;
        assert_eq!(store.count().await, 1);
    }
}
