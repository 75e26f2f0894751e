//! Backup and restore of the whole note collection.

use chrono::{DateTime, Utc};

use crate::model::note::{Notes, notes_from_value};

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid backup: {0}")]
    InvalidFormat(String),
    #[error("could not parse backup: {0}")]
    Json(#[from] serde_json::Error),
    #[error("there are no notes to {0}")]
    Empty(&'static str),
}

/// `sticky-notes-backup-2025-06-01_14-03-59.json`
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("sticky-notes-backup-{}.json", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Pretty-printed JSON of the collection, as written to a backup file.
pub fn export_notes(notes: &Notes) -> Result<String, TransferError> {
    if notes.is_empty() {
        return Err(TransferError::Empty("export"));
    }
    Ok(serde_json::to_string_pretty(notes)?)
}

/// Parse a backup file. Only a JSON object is accepted; individual records
/// that aren't notes are skipped and their ids returned alongside.
pub fn import_notes(text: &str) -> Result<(Notes, Vec<String>), TransferError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(TransferError::InvalidFormat(
            "expected a JSON object of notes keyed by id".to_string(),
        ));
    }
    let parsed = notes_from_value(value)?;
    Ok((parsed.notes, parsed.dropped))
}
