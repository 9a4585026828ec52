//! Bounded per-session conversation history.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Default number of turns kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

type History = Arc<AsyncMutex<VecDeque<Turn>>>;

/// In-process session store keyed by a client-supplied id.
///
/// Each session sits behind its own async lock. Holding a [`SessionGuard`]
/// serializes read-modify-write sequences for that id while other sessions
/// proceed independently. Nothing is persisted.
#[derive(Debug)]
pub struct SessionStore {
    limit: usize,
    sessions: Mutex<HashMap<String, History>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn entry(&self, session_id: &str) -> History {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(session_id.to_owned()).or_default())
    }

    /// Acquire exclusive access to one session, creating it on first use.
    pub async fn lock(&self, session_id: &str) -> SessionGuard {
        SessionGuard {
            history: self.entry(session_id).lock_owned().await,
            limit: self.limit,
        }
    }

    /// Snapshot of the session's turns, oldest first.
    pub async fn get(&self, session_id: &str) -> Vec<Turn> {
        self.lock(session_id).await.history()
    }

    /// Append one turn, evicting the oldest beyond the limit.
    pub async fn append(&self, session_id: &str, question: String, answer: String) {
        self.lock(session_id).await.push(question, answer);
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// Exclusive handle on one session's history.
pub struct SessionGuard {
    history: OwnedMutexGuard<VecDeque<Turn>>,
    limit: usize,
}

impl SessionGuard {
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.history.iter().cloned().collect()
    }

    pub fn push(&mut self, question: String, answer: String) {
        self.history.push_back(Turn { question, answer });
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let store = SessionStore::default();
        assert!(store.get("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn append_then_get() {
        let store = SessionStore::default();
        store.append("s1", "q1".into(), "a1".into()).await;
        let history = store.get("s1").await;
        assert_eq!(
            history,
            vec![Turn {
                question: "q1".into(),
                answer: "a1".into()
            }]
        );
    }

    #[tokio::test]
    async fn sixth_turn_evicts_first() {
        let store = SessionStore::default();
        for i in 1..=6 {
            store.append("s1", format!("q{i}"), format!("a{i}")).await;
        }
        let history = store.get("s1").await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].question, "q2");
        assert_eq!(history[4].question, "q6");
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_key() {
        let store = SessionStore::default();
        store.append("s1", "q".into(), "a".into()).await;
        assert!(store.get("s2").await.is_empty());
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_lose_turns() {
        let store = Arc::new(SessionStore::new(64));
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut guard = store.lock("shared").await;
                let seen = guard.history().len();
                tokio::task::yield_now().await;
                guard.push(format!("q{i}"), format!("seen {seen}"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let history = store.get("shared").await;
        assert_eq!(history.len(), 32);
        for (i, turn) in history.iter().enumerate() {
            assert_eq!(turn.answer, format!("seen {i}"));
        }
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(SessionStore::new(0).limit(), 1);
    }

    mod proptest_session {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn keeps_most_recent_within_limit(n in 0usize..40, limit in 1usize..10) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let store = SessionStore::new(limit);
                    for i in 0..n {
                        store.append("s", format!("q{i}"), format!("a{i}")).await;
                    }
                    let history = store.get("s").await;
                    prop_assert_eq!(history.len(), n.min(limit));
                    let expected: Vec<String> =
                        (n.saturating_sub(limit)..n).map(|i| format!("q{i}")).collect();
                    let actual: Vec<String> = history.into_iter().map(|t| t.question).collect();
                    prop_assert_eq!(actual, expected);
                    Ok(())
                })?;
            }
        }
    }
}
