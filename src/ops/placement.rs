//! First-fit placement for newly created notes.
//!
//! Candidates are scanned left to right in fixed steps from the default
//! origin, wrapping to a new row before a candidate would cross the right
//! margin. The first candidate that overlaps no existing note wins.

use crate::model::geometry::{Rect, px};
use crate::model::note::{DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH, Notes};

pub const ORIGIN_LEFT: i64 = 100;
pub const ORIGIN_TOP: i64 = 100;
pub const HORIZONTAL_SPACING: i64 = 20;
pub const VERTICAL_SPACING: i64 = 20;
pub const RIGHT_MARGIN: i64 = 50;
/// Candidate tests plus row wraps before giving up on a free slot
pub const MAX_ATTEMPTS: usize = 50;

/// Where a new note should go, in whole page pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub left: i64,
    pub top: i64,
}

impl Position {
    pub fn left_px(&self) -> String {
        px(self.left)
    }

    pub fn top_px(&self) -> String {
        px(self.top)
    }
}

const ORIGIN: Position = Position {
    left: ORIGIN_LEFT,
    top: ORIGIN_TOP,
};

/// Find a spot for a new default-sized note that overlaps none of `existing`.
///
/// Always returns a position: when the attempt budget runs out the note goes
/// one row below the last row reached, without further overlap checks.
pub fn find_position(existing: &Notes, viewport_width: i64) -> Position {
    if existing.is_empty() {
        return ORIGIN;
    }

    let rects: Vec<Rect> = existing
        .values()
        .map(|note| note.rect(viewport_width))
        .collect();

    let step_x = DEFAULT_NOTE_WIDTH + HORIZONTAL_SPACING;
    let step_y = DEFAULT_NOTE_HEIGHT + VERTICAL_SPACING;

    let mut candidate = ORIGIN;
    let mut row = 0;
    let mut attempts = 0;

    while attempts < MAX_ATTEMPTS {
        if candidate.left + DEFAULT_NOTE_WIDTH > viewport_width - RIGHT_MARGIN {
            row += 1;
            candidate.left = ORIGIN_LEFT;
            candidate.top = ORIGIN_TOP + row * step_y;
            attempts += 1;
            continue;
        }

        let rect = Rect::new(
            candidate.left,
            candidate.top,
            DEFAULT_NOTE_WIDTH,
            DEFAULT_NOTE_HEIGHT,
        );
        if !rects.iter().any(|r| rect.overlaps(r)) {
            return candidate;
        }

        candidate.left += step_x;
        attempts += 1;
    }

    Position {
        left: ORIGIN_LEFT,
        top: ORIGIN_TOP + (row + 1) * step_y,
    }
}
