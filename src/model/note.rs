use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::geometry::{Rect, de_px, parse_px, px};

pub const DEFAULT_NOTE_WIDTH: i64 = 200;
pub const DEFAULT_NOTE_HEIGHT: i64 = 200;

/// The persisted note collection, keyed by note id in insertion order.
pub type Notes = IndexMap<String, Note>;

/// Background color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Red,
    Gray,
}

impl NoteColor {
    pub const ALL: [NoteColor; 5] = [
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Blue,
        NoteColor::Red,
        NoteColor::Gray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteColor::Yellow => "yellow",
            NoteColor::Green => "green",
            NoteColor::Blue => "blue",
            NoteColor::Red => "red",
            NoteColor::Gray => "gray",
        }
    }

    /// Swatch color used by the note header
    pub fn hex(self) -> &'static str {
        match self {
            NoteColor::Yellow => "#ffff99",
            NoteColor::Green => "#90ee90",
            NoteColor::Blue => "#99ccff",
            NoteColor::Red => "#ff9999",
            NoteColor::Gray => "#cccccc",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteColor::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown color '{}' (expected yellow, green, blue, red or gray)",
                    s
                )
            })
    }
}

/// Which viewport edge the horizontal offset is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    #[default]
    Left,
    Right,
}

/// A single sticky note as stored in the shared collection.
///
/// Offsets are CSS pixel strings (`"100px"`). A left-aligned note stores
/// `left`; a right-aligned one stores `right` and leaves `left` null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "de_px")]
    pub left: Option<String>,
    #[serde(default, deserialize_with = "de_px")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_px")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_px")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_px")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_color")]
    pub background_color: Option<NoteColor>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub minimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_millis")]
    pub last_edit_timestamp: Option<i64>,
}

impl Note {
    /// An empty left-anchored note at the given page offset
    pub fn at(left: i64, top: i64) -> Self {
        Note {
            left: Some(px(left)),
            top: Some(px(top)),
            ..Default::default()
        }
    }

    pub fn width_px(&self) -> i64 {
        match self.width.as_deref() {
            Some(w) if !w.is_empty() => parse_px(w),
            _ => DEFAULT_NOTE_WIDTH,
        }
    }

    pub fn height_px(&self) -> i64 {
        match self.height.as_deref() {
            Some(h) if !h.is_empty() => parse_px(h),
            _ => DEFAULT_NOTE_HEIGHT,
        }
    }

    pub fn top_px(&self) -> i64 {
        self.top.as_deref().map_or(0, parse_px)
    }

    pub fn edge(&self) -> Edge {
        self.edge.unwrap_or_default()
    }

    /// Absolute left offset, resolving right-anchored notes against the viewport.
    pub fn left_px(&self, viewport_width: i64) -> i64 {
        match (self.edge(), self.right.as_deref()) {
            (Edge::Right, Some(right)) => viewport_width
                .saturating_sub(parse_px(right))
                .saturating_sub(self.width_px()),
            _ => self.left.as_deref().map_or(0, parse_px),
        }
    }

    pub fn rect(&self, viewport_width: i64) -> Rect {
        Rect::new(
            self.left_px(viewport_width),
            self.top_px(),
            self.width_px(),
            self.height_px(),
        )
    }

    pub fn color(&self) -> NoteColor {
        self.background_color.unwrap_or_default()
    }

    /// Stacking order as rendered (unset notes sit at 1)
    pub fn z(&self) -> i64 {
        self.z_index.unwrap_or(1)
    }

    /// Copy every non-content field from `other`.
    /// Returns true when anything actually changed.
    pub fn take_layout(&mut self, other: &Note) -> bool {
        let before = (
            self.left.clone(),
            self.top.clone(),
            self.right.clone(),
            self.edge,
            self.width.clone(),
            self.height.clone(),
            self.z_index,
            self.background_color,
            self.minimized,
        );
        self.left = other.left.clone();
        self.top = other.top.clone();
        self.right = other.right.clone();
        self.edge = other.edge;
        self.width = other.width.clone();
        self.height = other.height.clone();
        self.z_index = other.z_index;
        self.background_color = other.background_color;
        self.minimized = other.minimized;
        before
            != (
                self.left.clone(),
                self.top.clone(),
                self.right.clone(),
                self.edge,
                self.width.clone(),
                self.height.clone(),
                self.z_index,
                self.background_color,
                self.minimized,
            )
    }
}

/// Unknown palette names fall back to the default color rather than
/// rejecting the whole record.
fn de_color<'de, D>(deserializer: D) -> Result<Option<NoteColor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

fn de_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

/// Result of leniently reading a stored collection
#[derive(Debug, Default)]
pub struct ParsedNotes {
    pub notes: Notes,
    /// Ids whose records could not be read as notes
    pub dropped: Vec<String>,
}

/// Read a collection value entry by entry. Records that are not note-shaped
/// are dropped and reported, so one bad entry never poisons the rest.
pub fn notes_from_value(value: Value) -> Result<ParsedNotes, serde_json::Error> {
    let map = match value {
        Value::Null => return Ok(ParsedNotes::default()),
        Value::Object(map) => map,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a note collection object, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut parsed = ParsedNotes::default();
    for (id, record) in map {
        match serde_json::from_value::<Note>(record) {
            Ok(note) => {
                parsed.notes.insert(id, note);
            }
            Err(_) => parsed.dropped.push(id),
        }
    }
    Ok(parsed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
