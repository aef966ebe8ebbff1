//! Conversation sessions with bounded history.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Sessions kept when no limit is configured.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

#[derive(Default)]
struct Session {
    turns: Vec<Exchange>,
    /// Value of the use counter when the session was last touched.
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    counter: u64,
    uses: u64,
    history: HashMap<String, Session>,
}

impl Sessions {
    fn touch(&mut self, session_id: &str) -> &mut Session {
        self.uses += 1;
        let uses = self.uses;
        let session = self.history.entry(session_id.to_string()).or_default();
        session.last_used = uses;
        session
    }

    fn evict(&mut self, max_sessions: usize) {
        while self.history.len() > max_sessions {
            let oldest = self
                .history
                .iter()
                .min_by_key(|(_, session)| session.last_used)
                .map(|(id, _)| id.clone());

            match oldest {
                Some(id) => {
                    debug!("Dropping idle session {}", id);
                    self.history.remove(&id);
                }
                None => break,
            }
        }
    }
}

/// In-memory session store.
///
/// Appends are atomic; two queries finishing on the same session are
/// recorded in completion order. At most `max_sessions` sessions are kept;
/// beyond that the least recently used one is forgotten.
pub struct SessionManager {
    max_history: usize,
    max_sessions: usize,
    inner: Mutex<Sessions>,
}

impl SessionManager {
    /// Keep at most `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            max_sessions: DEFAULT_MAX_SESSIONS,
            inner: Mutex::new(Sessions::default()),
        }
    }

    /// Limit the number of sessions kept (at least one).
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> String {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.counter += 1;
        let id = format!("session_{}", inner.counter);
        inner.touch(&id);
        inner.evict(self.max_sessions);
        id
    }

    /// Record an exchange, creating the session if it does not exist.
    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let turns = &mut inner.touch(session_id).turns;
        turns.push(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });

        if turns.len() > self.max_history {
            let excess = turns.len() - self.max_history;
            turns.drain(..excess);
        }

        inner.evict(self.max_sessions);
    }

    /// Recent exchanges formatted for the system instruction.
    pub fn conversation_history(&self, session_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let turns = &inner.history.get(session_id)?.turns;
        if turns.is_empty() {
            return None;
        }

        Some(
            turns
                .iter()
                .map(|t| format!("User: {}\nAssistant: {}", t.query, t.answer))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn clear_session(&self, session_id: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = inner.history.get_mut(session_id) {
            session.turns.clear();
        }
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_session_ids_increase() {
        let sessions = SessionManager::new(2);
        assert_eq!(sessions.create_session(), "session_1");
        assert_eq!(sessions.create_session(), "session_2");
        assert!(sessions.conversation_history("session_1").is_none());
    }

    #[test]
    fn test_history_is_bounded_and_formatted() {
        let sessions = SessionManager::new(2);
        let id = sessions.create_session();

        sessions.add_exchange(&id, "q1", "a1");
        sessions.add_exchange(&id, "q2", "a2");
        sessions.add_exchange(&id, "q3", "a3");

        assert_eq!(
            sessions.conversation_history(&id).as_deref(),
            Some("User: q2\nAssistant: a2\nUser: q3\nAssistant: a3")
        );

        sessions.clear_session(&id);
        assert!(sessions.conversation_history(&id).is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let sessions = SessionManager::new(2);
        sessions.add_exchange("a", "qa", "aa");
        sessions.add_exchange("b", "qb", "ab");

        assert_eq!(
            sessions.conversation_history("a").as_deref(),
            Some("User: qa\nAssistant: aa")
        );
        assert!(sessions.conversation_history("missing").is_none());
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let sessions = Arc::new(SessionManager::new(100));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sessions = sessions.clone();
                std::thread::spawn(move || {
                    sessions.add_exchange("shared", &format!("q{}", i), "a");
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = sessions.conversation_history("shared").unwrap();
        assert_eq!(history.matches("User: ").count(), 8);
    }

    #[test]
    fn test_least_recently_used_session_is_dropped() {
        let sessions = SessionManager::new(2).with_max_sessions(2);
        let first = sessions.create_session();
        let second = sessions.create_session();

        sessions.add_exchange(&first, "still here?", "yes");
        let third = sessions.create_session();

        assert_eq!(sessions.session_count(), 2);
        assert!(sessions.conversation_history(&first).is_some());
        assert_eq!(third, "session_3");

        sessions.add_exchange(&second, "back again", "new history");
        assert_eq!(sessions.session_count(), 2);
        assert_eq!(
            sessions.conversation_history(&second).as_deref(),
            Some("User: back again\nAssistant: new history")
        );
        assert!(sessions.conversation_history(&first).is_none());
    }
}
