//! In-memory transcript storage.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::core::TeachingSession;
use crate::error::Result;
use crate::storage::traits::most_recent;
use crate::storage::TranscriptStore;

/// In-memory transcript store, used by tests and `teach --no-save`.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    sessions: RwLock<HashMap<String, TeachingSession>>,
}

impl MemoryTranscriptStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn get(&self, id: &str) -> Result<Option<TeachingSession>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(id).cloned())
    }

    fn put(&self, session: &TeachingSession) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<TeachingSession>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(most_recent(sessions.values().cloned().collect(), limit))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_transcript_store_crud;
    use std::sync::Arc;

    #[test]
    fn test_memory_transcript_store_crud() {
        let store = MemoryTranscriptStore::new();
        test_transcript_store_crud(&store);
    }

    #[test]
    fn test_shared_through_arc() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let handle = Arc::clone(&store);

        handle.put(&TeachingSession::with_id("teach-1")).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.exists("teach-1").unwrap());
        test_transcript_store_crud(&handle);
    }

    #[test]
    fn test_len_and_is_empty() {
        let store = MemoryTranscriptStore::new();
        assert!(store.is_empty());
        store.put(&TeachingSession::with_id("teach-1")).unwrap();
        store.put(&TeachingSession::with_id("teach-1")).unwrap();
        assert_eq!(store.len(), 1);
    }
}
