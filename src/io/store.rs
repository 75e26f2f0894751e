use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::io::lock::LockError;
use crate::model::note::{Notes, ParsedNotes, notes_from_value};

/// Key holding the note collection inside the persisted document
pub const NOTES_KEY: &str = "notes";

/// Error type for shared-store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a stickies directory: no .stickies/ found (run `stk init`)")]
    NotInitialized,
    #[error("already initialized: {} exists", .0.display())]
    AlreadyInitialized(PathBuf),
    #[error("quota exceeded: notes take {size} bytes, limit is {quota}")]
    QuotaExceeded { size: usize, quota: usize },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("could not watch store: {0}")]
    Watch(#[from] notify::Error),
    #[error("malformed notes document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Old and new snapshots of the whole collection around one committed write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreChange {
    pub old: Notes,
    pub new: Notes,
}

/// Stream of committed writes, from every instance including this one.
pub trait ChangeFeed {
    /// Drain the changes committed since the last poll, oldest first. Never blocks.
    fn poll(&mut self) -> Vec<StoreChange>;
}

/// The shared key-value store that owns durable note state.
pub trait NoteStore {
    fn get_all(&self) -> Result<Notes, StoreError>;
    /// Replace the whole collection. Subscribers, the writer's included, see the change.
    fn set_all(&self, notes: &Notes) -> Result<(), StoreError>;
    fn subscribe(&self) -> Result<Box<dyn ChangeFeed>, StoreError>;
}

#[derive(Serialize)]
struct Document<'a> {
    notes: &'a Notes,
}

/// Serialize the collection as the persisted `{"notes": {...}}` document.
pub fn encode_document(notes: &Notes) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(&Document { notes })?;
    text.push('\n');
    Ok(text)
}

/// Read a persisted document. An empty file or missing key is an empty
/// collection; individual malformed records are reported in `dropped`.
pub fn decode_document(text: &str) -> Result<ParsedNotes, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(ParsedNotes::default());
    }
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(mut root) => notes_from_value(root.remove(NOTES_KEY).unwrap_or(Value::Null)),
        Value::Null => Ok(ParsedNotes::default()),
        _ => Err(serde::de::Error::custom("expected a JSON object at the top level")),
    }
}

/// Size of the collection as the store bills it: the key plus the compact JSON value.
pub fn stored_size(notes: &Notes) -> Result<usize, serde_json::Error> {
    Ok(NOTES_KEY.len() + serde_json::to_vec(notes)?.len())
}

/// Reject a write that would exceed `quota` bytes. A quota of 0 disables the check.
pub fn check_quota(notes: &Notes, quota: usize) -> Result<(), StoreError> {
    if quota == 0 {
        return Ok(());
    }
    let size = stored_size(notes)?;
    if size > quota {
        return Err(StoreError::QuotaExceeded { size, quota });
    }
    Ok(())
}
