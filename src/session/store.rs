//! In-process session store keyed by session id.
//!
//! One `RwLock`ed map for the whole process. The lock is only ever held for
//! the duration of a map operation; callers that need to interleave an
//! external call between a read and a write (the ask flow) acquire the lock
//! twice, which is what makes the pre-check a soft gate.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::impact::ImpactFactors;
use crate::session::state::{AskReport, Exchange, ResetReport, SessionState, StatsSnapshot};

/// Sessions idle longer than this are dropped on the next write.
const IDLE_EXPIRY_SECS: i64 = 24 * 60 * 60;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed session if the id is not present. Write paths call
    /// this; read-only endpoints never insert.
    pub async fn ensure(&self, id: Uuid) {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions);
        sessions.entry(id).or_default();
    }

    /// Current token total for the pre-check; 0 for an unknown session.
    pub async fn total_tokens(&self, id: Uuid) -> u64 {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(|s| s.total_tokens).unwrap_or(0)
    }

    /// Folds a completed exchange into the session, creating it if needed.
    pub async fn record_exchange(
        &self,
        id: Uuid,
        question: String,
        response: String,
        tokens_used: u64,
        factors: ImpactFactors,
        capacity: u64,
    ) -> AskReport {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions);
        sessions
            .entry(id)
            .or_default()
            .record_exchange(question, response, tokens_used, factors, capacity)
    }

    /// Zeroes the session. Works on unknown ids too, leaving a fresh empty
    /// session behind, which matches what a reset of nothing should mean.
    pub async fn reset(&self, id: Uuid) -> ResetReport {
        let mut sessions = self.sessions.write().await;
        purge_idle(&mut sessions);
        sessions.entry(id).or_default().reset();
        ResetReport::zeroed()
    }

    /// Totals snapshot without side effects; zeroed for unknown sessions.
    pub async fn snapshot(&self, id: Uuid, capacity: u64) -> StatsSnapshot {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(state) => state.snapshot(capacity),
            None => SessionState::new().snapshot(capacity),
        }
    }

    /// Exchange history in insertion order; empty for unknown sessions.
    pub async fn history(&self, id: Uuid) -> Vec<Exchange> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(|s| s.history.clone()).unwrap_or_default()
    }
}

fn purge_idle(sessions: &mut HashMap<Uuid, SessionState>) {
    let now = Utc::now();
    sessions.retain(|_, s| (now - s.updated_at).num_seconds() < IDLE_EXPIRY_SECS);
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: u64 = 10_000;

    #[tokio::test]
    async fn unknown_sessions_read_as_zeroed() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        assert_eq!(store.total_tokens(id).await, 0);
        let snapshot = store.snapshot(id, CAPACITY).await;
        assert_eq!(snapshot.total_tokens, 0);
        assert_eq!(snapshot.bathtub_capacity, CAPACITY);
        assert!(store.history(id).await.is_empty());
    }

    #[tokio::test]
    async fn read_paths_do_not_create_sessions() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        store.snapshot(id, CAPACITY).await;
        store.history(id).await;
        assert!(store.sessions.read().await.is_empty());

        store.ensure(id).await;
        assert_eq!(store.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn exchanges_accumulate_per_session() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let factors = ImpactFactors::default();

        store
            .record_exchange(a, "q1".into(), "r1".into(), 13, factors, CAPACITY)
            .await;
        store
            .record_exchange(a, "q2".into(), "r2".into(), 7, factors, CAPACITY)
            .await;
        store
            .record_exchange(b, "other".into(), "tub".into(), 5, factors, CAPACITY)
            .await;

        assert_eq!(store.total_tokens(a).await, 20);
        assert_eq!(store.total_tokens(b).await, 5);
        assert_eq!(store.history(a).await.len(), 2);
    }

    #[tokio::test]
    async fn reset_leaves_a_fresh_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store
            .record_exchange(id, "q".into(), "r".into(), 999, ImpactFactors::default(), CAPACITY)
            .await;

        let report = store.reset(id).await;
        assert_eq!(report.message, "Bathtub reset!");
        assert_eq!(report.total_tokens, 0);
        assert_eq!(store.total_tokens(id).await, 0);
        assert!(store.history(id).await.is_empty());
    }

    #[tokio::test]
    async fn idle_sessions_are_purged_on_write() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();
        store.ensure(stale).await;
        {
            let mut sessions = store.sessions.write().await;
            let state = sessions.get_mut(&stale).unwrap();
            state.updated_at = Utc::now() - chrono::Duration::seconds(IDLE_EXPIRY_SECS + 1);
        }

        store.ensure(Uuid::new_v4()).await;
        assert!(!store.sessions.read().await.contains_key(&stale));
    }
}
