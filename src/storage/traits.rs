//! Where finished teaching sessions are kept.
//!
//! A stored session holds the dialogue transcript and the outline of the
//! tree it produced. The tree itself is never persisted.

use std::sync::Arc;

use crate::core::TeachingSession;
use crate::error::Result;

/// Keeps transcripts of teaching sessions, keyed by session ID.
///
/// Sessions are written once when teaching ends, whether or not the root
/// was learned, and read back by `sapling sessions` and `sapling show`.
pub trait TranscriptStore: Send + Sync {
    /// Load the transcript saved under `id`, or `None` if nothing was saved.
    fn get(&self, id: &str) -> Result<Option<TeachingSession>>;

    /// Save a transcript. A second save under the same ID overwrites the first.
    fn put(&self, session: &TeachingSession) -> Result<()>;

    /// Up to `limit` transcripts, last touched first.
    fn list(&self, limit: usize) -> Result<Vec<TeachingSession>>;

    /// Forget a transcript. Unknown IDs are not an error.
    fn delete(&self, id: &str) -> Result<()>;

    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }
}

impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    fn get(&self, id: &str) -> Result<Option<TeachingSession>> {
        (**self).get(id)
    }

    fn put(&self, session: &TeachingSession) -> Result<()> {
        (**self).put(session)
    }

    fn list(&self, limit: usize) -> Result<Vec<TeachingSession>> {
        (**self).list(limit)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}

/// Order for listing: latest `updated_at` first, ties broken by ID so the
/// listing is stable across stores.
pub(crate) fn most_recent(mut sessions: Vec<TeachingSession>, limit: usize) -> Vec<TeachingSession> {
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sessions.truncate(limit);
    sessions
}

/// Checks every store must pass.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{Prompt, Response};

    /// Save a one-exchange transcript, read it back, list it, then delete it twice.
    pub fn test_transcript_store_crud<S: TranscriptStore>(store: &S) {
        let mut session = TeachingSession::with_id("teach-20260101120000000");
        session.record_prompt(&Prompt::question("What should I do after approaching the person?"));
        session.record_response(&Response::done("that's it"));
        session.finish("[x] root: Root\n", true);

        assert!(!store.exists(&session.id).unwrap());
        assert!(store.get(&session.id).unwrap().is_none());

        store.put(&session).unwrap();

        assert!(store.exists(&session.id).unwrap());
        let retrieved = store.get(&session.id).unwrap().unwrap();
        assert_eq!(retrieved, session);

        let sessions = store.list(10).unwrap();
        assert!(sessions.iter().any(|s| s.id == session.id));

        store.delete(&session.id).unwrap();
        assert!(!store.exists(&session.id).unwrap());

        // Deleting twice is fine
        store.delete(&session.id).unwrap();
    }

    #[test]
    fn test_most_recent_orders_and_limits() {
        let old = TeachingSession::with_id("teach-1");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let new = TeachingSession::with_id("teach-2");

        let sessions = most_recent(vec![old, new], 1);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "teach-2");
    }

    #[test]
    fn test_most_recent_breaks_ties_by_id() {
        let a = TeachingSession::with_id("teach-a");
        let mut b = TeachingSession::with_id("teach-b");
        b.updated_at = a.updated_at;

        let sessions = most_recent(vec![a, b], 10);
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["teach-b", "teach-a"]);
    }
}
