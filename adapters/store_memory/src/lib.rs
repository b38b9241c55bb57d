#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory session document store.
//!
//! Documents are held as serialized JSON, one payload per session, so every
//! read hands the caller a freshly deserialized copy and no live state is
//! ever aliased across requests. Writes validate the full snapshot before
//! it lands and support optimistic concurrency keyed on the document
//! revision. A production deployment would put a remote document database
//! behind the same trait; this adapter exists for tests, tooling, and the
//! demo binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use maze_chase_core::{
    CounterField, PutMode, SessionDocument, SessionStore, StoreError,
};

/// Thread-safe in-memory implementation of [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing or regaining the backing service; while offline
    /// every operation reports [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .map(|documents| documents.len())
            .unwrap_or(0)
    }

    /// Reports whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_owned()));
        }
        self.documents
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_owned()))
    }
}

fn decode(payload: &str) -> Result<SessionDocument, StoreError> {
    serde_json::from_str(payload).map_err(|error| StoreError::Corrupt(error.to_string()))
}

fn encode(document: &SessionDocument) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|error| StoreError::Corrupt(error.to_string()))
}

impl SessionStore for InMemoryStore {
    fn get(&self, session_id: &str) -> Result<SessionDocument, StoreError> {
        let documents = self.guard()?;
        let payload = documents.get(session_id).ok_or(StoreError::NotFound)?;
        decode(payload)
    }

    fn put(
        &self,
        session_id: &str,
        document: &SessionDocument,
        mode: PutMode,
    ) -> Result<(), StoreError> {
        document.validate()?;

        let mut documents = self.guard()?;

        if let PutMode::ReplaceIfRevision(expected) = mode {
            let current = documents.get(session_id).ok_or(StoreError::NotFound)?;
            let found = decode(current)?.revision;
            if found != expected {
                return Err(StoreError::Conflict { expected, found });
            }
        }

        // Full snapshots make Replace and MergeExisting equivalent here;
        // field-merging backends distinguish them.
        let payload = encode(document)?;
        let _ = documents.insert(session_id.to_owned(), payload);
        Ok(())
    }

    fn increment(
        &self,
        session_id: &str,
        field: CounterField,
        delta: i32,
    ) -> Result<u32, StoreError> {
        let mut documents = self.guard()?;
        let payload = documents.get(session_id).ok_or(StoreError::NotFound)?;
        let mut document = decode(payload)?;

        let updated = match field {
            CounterField::Viewers => {
                let next = i64::from(document.viewers) + i64::from(delta);
                let clamped = u32::try_from(next.max(0)).unwrap_or(u32::MAX);
                document.viewers = clamped;
                clamped
            }
        };

        let encoded = encode(&document)?;
        let _ = documents.insert(session_id.to_owned(), encoded);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::{
        CellCoord, CellKind, Difficulty, MazeGrid, PlayerState, SessionStatus,
    };

    fn sample_document(revision: u64) -> SessionDocument {
        let mut maze = MazeGrid::filled(7, 5, CellKind::Wall);
        for y in 1..4 {
            for x in 1..6 {
                maze.set(CellCoord::new(x, y), CellKind::Open);
            }
        }
        let goal = maze.goal_cell();
        SessionDocument {
            player: PlayerState {
                x: 1,
                y: 1,
                health: 100,
                speed: 1.0,
                score: 0,
            },
            enemies: Vec::new(),
            obstacles: Vec::new(),
            goal,
            maze,
            status: SessionStatus::Playing,
            viewers: 0,
            time_remaining_seconds: 120,
            last_tick_timestamp: 0,
            last_move: None,
            difficulty: Difficulty::Medium,
            difficulty_settings: Difficulty::Medium.profile(),
            seed: 1,
            next_entity_id: 0,
            revision,
        }
    }

    #[test]
    fn get_returns_an_owned_copy() {
        let store = InMemoryStore::new();
        store
            .put("room", &sample_document(0), PutMode::Replace)
            .expect("put");

        let mut first = store.get("room").expect("get");
        first.player.x = 4;

        let second = store.get("room").expect("get");
        assert_eq!(second.player.x, 1);
    }

    #[test]
    fn missing_documents_are_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("nowhere"), Err(StoreError::NotFound));
    }

    #[test]
    fn conditional_put_detects_stale_revisions() {
        let store = InMemoryStore::new();
        store
            .put("room", &sample_document(3), PutMode::Replace)
            .expect("put");

        let mut stale = sample_document(3);
        stale.bump_revision();
        assert_eq!(
            store.put("room", &stale, PutMode::ReplaceIfRevision(2)),
            Err(StoreError::Conflict {
                expected: 2,
                found: 3
            })
        );

        assert_eq!(
            store.put("room", &stale, PutMode::ReplaceIfRevision(3)),
            Ok(())
        );
        assert_eq!(store.get("room").expect("get").revision, 4);
    }

    #[test]
    fn conditional_put_on_a_missing_document_is_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.put("room", &sample_document(0), PutMode::ReplaceIfRevision(0)),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn put_rejects_invalid_documents() {
        let store = InMemoryStore::new();
        let mut document = sample_document(0);
        document.player.x = 0;
        assert!(matches!(
            store.put("room", &document, PutMode::Replace),
            Err(StoreError::InvalidDocument(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn viewer_counter_clamps_at_zero() {
        let store = InMemoryStore::new();
        store
            .put("room", &sample_document(0), PutMode::Replace)
            .expect("put");

        assert_eq!(store.increment("room", CounterField::Viewers, 1), Ok(1));
        assert_eq!(store.increment("room", CounterField::Viewers, 1), Ok(2));
        assert_eq!(store.increment("room", CounterField::Viewers, -5), Ok(0));
        assert_eq!(store.get("room").expect("get").viewers, 0);
    }

    #[test]
    fn offline_store_reports_unavailable() {
        let store = InMemoryStore::new();
        store
            .put("room", &sample_document(0), PutMode::Replace)
            .expect("put");
        store.set_offline(true);

        assert!(matches!(
            store.get("room"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.increment("room", CounterField::Viewers, 1),
            Err(StoreError::Unavailable(_))
        ));

        store.set_offline(false);
        assert!(store.get("room").is_ok());
    }

    #[test]
    fn merge_mode_still_replaces_full_snapshots() {
        let store = InMemoryStore::new();
        store
            .put("room", &sample_document(0), PutMode::Replace)
            .expect("put");

        let mut updated = sample_document(1);
        updated.viewers = 7;
        store
            .put("room", &updated, PutMode::MergeExisting)
            .expect("merge put");
        assert_eq!(store.get("room").expect("get").viewers, 7);
    }
}
