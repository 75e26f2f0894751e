use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::io::store::{ChangeFeed, NoteStore, StoreChange, StoreError, check_quota};
use crate::model::note::Notes;

/// In-process shared store. Clones are handles onto the same collection, so
/// several instances built from clones behave like tabs sharing one browser
/// profile.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    notes: Notes,
    quota: usize,
    subscribers: Vec<Sender<StoreChange>>,
    failure: Option<String>,
    reads: usize,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection
    pub fn with_notes(notes: Notes) -> Self {
        let store = Self::new();
        store.lock().notes = notes;
        store
    }

    /// Limit the serialized collection to `bytes`
    pub fn with_quota(self, bytes: usize) -> Self {
        self.lock().quota = bytes;
        self
    }

    /// Make every write fail with `reason` until cleared with `None`.
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.lock().failure = reason.map(str::to_string);
    }

    /// Current committed collection
    pub fn snapshot(&self) -> Notes {
        self.lock().notes.clone()
    }

    /// Number of `get_all` calls served
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Number of committed writes
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NoteStore for MemoryStore {
    fn get_all(&self) -> Result<Notes, StoreError> {
        let mut inner = self.lock();
        inner.reads += 1;
        Ok(inner.notes.clone())
    }

    fn set_all(&self, notes: &Notes) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.failure {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        check_quota(notes, inner.quota)?;

        let old = std::mem::replace(&mut inner.notes, notes.clone());
        inner.writes += 1;
        let change = StoreChange {
            old,
            new: notes.clone(),
        };
        // Feeds that were dropped fall out here
        inner
            .subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let (tx, rx) = mpsc::channel();
        self.lock().subscribers.push(tx);
        Ok(Box::new(MemoryFeed { rx }))
    }
}

struct MemoryFeed {
    rx: Receiver<StoreChange>,
}

impl ChangeFeed for MemoryFeed {
    fn poll(&mut self) -> Vec<StoreChange> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::note::Note;

    fn one_note(id: &str) -> Notes {
        let mut notes = Notes::new();
        notes.insert(id.to_string(), Note::at(100, 100));
        notes
    }

    #[test]
    fn writes_fan_out_to_every_feed_including_writer() {
        let store = MemoryStore::new();
        let mut a = store.subscribe().unwrap();
        let mut b = store.clone().subscribe().unwrap();

        store.set_all(&one_note("1")).unwrap();

        for feed in [&mut a, &mut b] {
            let changes = feed.poll();
            assert_eq!(changes.len(), 1);
            assert!(changes[0].old.is_empty());
            assert!(changes[0].new.contains_key("1"));
        }
        assert!(a.poll().is_empty());
    }

    #[test]
    fn changes_arrive_in_commit_order() {
        let store = MemoryStore::new();
        let mut feed = store.subscribe().unwrap();
        store.set_all(&one_note("1")).unwrap();
        store.set_all(&one_note("2")).unwrap();

        let changes = feed.poll();
        assert_eq!(changes.len(), 2);
        assert!(changes[1].old.contains_key("1"));
        assert!(changes[1].new.contains_key("2"));
    }

    #[test]
    fn failed_writes_leave_store_untouched() {
        let store = MemoryStore::with_notes(one_note("1"));
        let mut feed = store.subscribe().unwrap();

        store.fail_writes(Some("offline"));
        let err = store.set_all(&Notes::new()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(ref r) if r == "offline"));
        assert!(store.snapshot().contains_key("1"));
        assert!(feed.poll().is_empty());

        store.fail_writes(None);
        store.set_all(&Notes::new()).unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn quota_is_enforced() {
        let store = MemoryStore::new().with_quota(40);
        let mut notes = one_note("1");
        notes["1"].content = "far too long for forty bytes of quota".into();
        assert!(matches!(
            store.set_all(&notes),
            Err(StoreError::QuotaExceeded { .. })
        ));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn dropped_feeds_are_pruned() {
        let store = MemoryStore::new();
        let feed = store.subscribe().unwrap();
        drop(feed);
        store.set_all(&one_note("1")).unwrap();
        assert!(store.lock().subscribers.is_empty());
    }
}
