use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io::{CONFIG_FILE, CONFIG_TEMPLATE};
use crate::io::lock::StoreLock;
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry, atomic_write};
use crate::io::store::{
    ChangeFeed, NoteStore, StoreChange, StoreError, check_quota, decode_document, encode_document,
};
use crate::io::watcher::StoreWatcher;
use crate::model::note::Notes;

/// Directory holding the shared store
pub const STORE_DIR: &str = ".stickies";
pub const NOTES_FILE: &str = "notes.json";

/// Shared store backed by `.stickies/notes.json`.
///
/// Every process pointed at the same directory is one instance; writes are
/// whole-document atomic replaces, and changes reach other processes through
/// a file watcher.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: usize,
}

/// Walk up from `start` looking for a directory containing `.stickies/notes.json`.
pub fn discover_root(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(STORE_DIR).join(NOTES_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotInitialized);
        }
    }
}

impl FileStore {
    /// Create `.stickies/` under `root` with an empty collection and a
    /// commented config file. Refuses to touch an existing store unless `force`.
    pub fn init(root: &Path, force: bool) -> Result<Self, StoreError> {
        let dir = root.join(STORE_DIR);
        let notes_path = dir.join(NOTES_FILE);
        if notes_path.exists() && !force {
            return Err(StoreError::AlreadyInitialized(dir));
        }

        fs::create_dir_all(&dir).map_err(|source| StoreError::WriteError {
            path: dir.clone(),
            source,
        })?;
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, CONFIG_TEMPLATE).map_err(|source| StoreError::WriteError {
                path: config_path,
                source,
            })?;
        }

        let store = FileStore { dir, quota: 0 };
        if !notes_path.exists() {
            store.write_document(&Notes::new())?;
        }
        tracing::info!(dir = %store.dir.display(), "initialized note store");
        Ok(store)
    }

    /// Open the store under `root`
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let dir = root.join(STORE_DIR);
        if !dir.join(NOTES_FILE).is_file() {
            return Err(StoreError::NotInitialized);
        }
        Ok(FileStore { dir, quota: 0 })
    }

    /// Reject writes larger than `bytes` (0 disables the check)
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = bytes;
        self
    }

    /// The `.stickies/` directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn notes_path(&self) -> PathBuf {
        self.dir.join(NOTES_FILE)
    }

    fn write_document(&self, notes: &Notes) -> Result<(), StoreError> {
        let text = encode_document(notes)?;
        let _lock = StoreLock::acquire_default(&self.dir)?;
        let path = self.notes_path();
        atomic_write(&path, text.as_bytes()).map_err(|source| StoreError::WriteError { path, source })
    }
}

impl NoteStore for FileStore {
    fn get_all(&self) -> Result<Notes, StoreError> {
        let path = self.notes_path();
        let text = fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotInitialized,
            _ => StoreError::ReadError { path, source },
        })?;
        let parsed = decode_document(&text)?;
        if !parsed.dropped.is_empty() {
            tracing::warn!(ids = ?parsed.dropped, "skipped malformed note records");
        }
        Ok(parsed.notes)
    }

    fn set_all(&self, notes: &Notes) -> Result<(), StoreError> {
        let result = check_quota(notes, self.quota).and_then(|()| self.write_document(notes));
        if let Err(e) = &result {
            // Keep what the user typed somewhere they can find it
            let body = serde_json::to_string_pretty(notes).unwrap_or_default();
            recovery::log_recovery(
                &self.dir,
                RecoveryEntry::now(RecoveryCategory::Write, e.to_string(), body),
            );
        }
        result
    }

    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let watcher = StoreWatcher::start(&self.dir, NOTES_FILE)?;
        let last_seen = self.get_all()?;
        Ok(Box::new(FileFeed {
            store: self.clone(),
            watcher,
            last_seen,
        }))
    }
}

/// Turns file-touched signals into old/new snapshots by diffing against the
/// last collection this feed saw.
struct FileFeed {
    store: FileStore,
    watcher: StoreWatcher,
    last_seen: Notes,
}

impl ChangeFeed for FileFeed {
    fn poll(&mut self) -> Vec<StoreChange> {
        if !self.watcher.poll() {
            return Vec::new();
        }
        match self.store.get_all() {
            Ok(current) if current != self.last_seen => {
                let old = std::mem::replace(&mut self.last_seen, current.clone());
                vec![StoreChange { old, new: current }]
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not re-read notes after change");
                Vec::new()
            }
        }
    }
}
