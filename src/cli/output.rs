use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::note::{Edge, Note};
use crate::ops::preview::{collapse_newlines, header_preview};
use crate::sync::WidgetEvent;
use crate::util::unicode::fit_to_width;

const PREVIEW_COLUMN: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct NoteJson<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub note: &'a Note,
}

#[derive(Serialize)]
pub struct CountJson {
    pub count: usize,
    pub badge: String,
    pub badge_color: &'static str,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub id: String,
    pub left: i64,
    pub top: i64,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EventJson<'a> {
    Materialize { id: &'a str },
    Update { id: &'a str, content_changed: bool },
    Remove { id: &'a str },
}

#[derive(Serialize)]
pub struct RecoveryEntryJson {
    pub timestamp: String,
    pub category: String,
    pub description: String,
    pub body: String,
}

pub fn event_to_json(event: &WidgetEvent) -> EventJson<'_> {
    match event {
        WidgetEvent::Materialize(id) => EventJson::Materialize { id },
        WidgetEvent::Update {
            id,
            content_changed,
        } => EventJson::Update {
            id,
            content_changed: *content_changed,
        },
        WidgetEvent::Remove(id) => EventJson::Remove { id },
    }
}

pub fn recovery_entry_to_json(entry: &RecoveryEntry) -> RecoveryEntryJson {
    RecoveryEntryJson {
        timestamp: entry.timestamp.to_rfc3339(),
        category: entry.category.to_string(),
        description: entry.description.clone(),
        body: entry.body.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Where the note is anchored, as the user would place it
fn format_offset(note: &Note) -> String {
    match (note.edge(), note.right.as_deref()) {
        (Edge::Right, Some(right)) => format!("right {} top {}", right, note.top_px()),
        _ => format!(
            "left {} top {}",
            note.left.as_deref().unwrap_or("0px"),
            note.top_px()
        ),
    }
}

/// One line per note: id, color, position, header preview
pub fn format_note_line(id: &str, note: &Note) -> String {
    let marker = if note.minimized { "_" } else { " " };
    let preview = header_preview(&note.content);
    let preview = if preview.is_empty() {
        "(empty)".to_string()
    } else {
        preview
    };
    format!(
        "{} {} {:<6} {:<22} {}",
        id,
        marker,
        note.color(),
        format_offset(note),
        fit_to_width(&preview, PREVIEW_COLUMN).trim_end()
    )
}

/// Full view of a note
pub fn format_note_detail(id: &str, note: &Note) -> Vec<String> {
    let mut lines = vec![
        format!("id: {}", id),
        format!("color: {} ({})", note.color(), note.color().hex()),
        format!("position: {}", format_offset(note)),
        format!("size: {}x{}", note.width_px(), note.height_px()),
        format!("z: {}", note.z()),
    ];
    if note.minimized {
        lines.push("minimized: yes".to_string());
    }
    if let Some(edited) = note.last_edit_timestamp.and_then(DateTime::<Utc>::from_timestamp_millis) {
        lines.push(format!(
            "edited: {}",
            edited.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
    }
    if !note.content.is_empty() {
        lines.push(String::new());
        lines.extend(collapse_newlines(&note.content).lines().map(str::to_string));
    }
    lines
}

pub fn format_event(event: &WidgetEvent) -> String {
    match event {
        WidgetEvent::Materialize(id) => format!("+ {}", id),
        WidgetEvent::Update {
            id,
            content_changed: true,
        } => format!("~ {} (text)", id),
        WidgetEvent::Update { id, .. } => format!("~ {}", id),
        WidgetEvent::Remove(id) => format!("- {}", id),
    }
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} | {}: {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    )];
    lines.extend(entry.body.lines().map(|l| format!("  {}", l)));
    lines
}
