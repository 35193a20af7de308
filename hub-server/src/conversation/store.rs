//! In-memory conversation store.

use super::sanitize::sanitize_history;
use super::types::{ContentBlock, Role, SessionSummary, Turn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default number of turns kept per session (10 exchanges).
pub const DEFAULT_MAX_TURNS: usize = 20;

/// One lifetime of a session, from first append until `clear`.
///
/// A session recreated under the same id gets a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEpoch(u64);

#[derive(Debug)]
struct Session {
    epoch: SessionEpoch,
    turns: Vec<Turn>,
}

/// Session-keyed turn histories with a bounded length.
///
/// A single lock guards the whole map; writers are serialized, readers share.
/// Nothing is persisted.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    next_epoch: Arc<AtomicU64>,
    max_turns: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationStore {
    /// Create a store keeping at most `max_turns` turns per session.
    ///
    /// A bound of zero is raised to one.
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_epoch: Arc::new(AtomicU64::new(0)),
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    fn push_bounded(&self, session_id: &str, session: &mut Session, turn: Turn) -> usize {
        session.turns.push(turn);

        if session.turns.len() > self.max_turns {
            let excess = session.turns.len() - self.max_turns;
            session.turns.drain(..excess);
            tracing::debug!(session_id, evicted = excess, "Trimmed conversation history");
        }

        session.turns.len()
    }

    fn session_entry<'a>(
        &self,
        sessions: &'a mut HashMap<String, Session>,
        session_id: &str,
    ) -> &'a mut Session {
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                epoch: SessionEpoch(self.next_epoch.fetch_add(1, Ordering::Relaxed)),
                turns: Vec::new(),
            })
    }

    /// Append a turn, creating the session on first use.
    ///
    /// Returns the history length after eviction.
    pub async fn append(&self, session_id: &str, role: Role, content: Vec<ContentBlock>) -> usize {
        let mut sessions = self.sessions.write().await;
        let session = self.session_entry(&mut sessions, session_id);
        self.push_bounded(session_id, session, Turn::new(role, content))
    }

    /// Append a turn and take the model view of the result under one lock.
    ///
    /// The returned history ends with the turn just appended, whatever other
    /// writers do to the session afterwards.
    pub async fn append_and_sanitize(
        &self,
        session_id: &str,
        role: Role,
        content: Vec<ContentBlock>,
    ) -> (SessionEpoch, Vec<Turn>) {
        let mut sessions = self.sessions.write().await;
        let session = self.session_entry(&mut sessions, session_id);
        self.push_bounded(session_id, session, Turn::new(role, content));
        (session.epoch, sanitize_history(&session.turns))
    }

    /// Append a turn only if the session still has the given epoch.
    ///
    /// Returns `None` when the session was cleared (or cleared and recreated)
    /// since the epoch was handed out.
    pub async fn append_to_epoch(
        &self,
        session_id: &str,
        epoch: SessionEpoch,
        role: Role,
        content: Vec<ContentBlock>,
    ) -> Option<usize> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| s.epoch == epoch)?;
        Some(self.push_bounded(session_id, session, Turn::new(role, content)))
    }

    /// Stored turns for a session, oldest first. Empty if unknown.
    pub async fn get_history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// History as handed to the chat model.
    pub async fn sanitize_for_model(&self, session_id: &str) -> Vec<Turn> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|s| sanitize_history(&s.turns))
            .unwrap_or_default()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Turn count and last activity for every session.
    pub async fn list_sessions(&self) -> HashMap<String, SessionSummary> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, session)| {
                (
                    id.clone(),
                    SessionSummary {
                        message_count: session.turns.len(),
                        last_activity: session.turns.last().map(|t| t.timestamp),
                    },
                )
            })
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
