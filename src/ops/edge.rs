use crate::model::geometry::{parse_px, px};
use crate::model::note::{Edge, Note, Notes};

/// The viewport edge nearer to a note spanning `[x, x + width)`.
/// Ties go to the left edge.
pub fn determine_edge(x: i64, width: i64, viewport_width: i64) -> Edge {
    let to_left = x;
    let to_right = viewport_width.saturating_sub(x.saturating_add(width));
    if to_left <= to_right {
        Edge::Left
    } else {
        Edge::Right
    }
}

/// Record an absolute left offset on `note`, measured from whichever edge is nearer.
pub fn anchor(note: &mut Note, left: i64, viewport_width: i64) {
    let width = note.width_px();
    match determine_edge(left, width, viewport_width) {
        Edge::Left => {
            note.left = Some(px(left));
            note.right = None;
            note.edge = Some(Edge::Left);
        }
        Edge::Right => {
            note.left = None;
            note.right = Some(px(viewport_width.saturating_sub(left).saturating_sub(width)));
            note.edge = Some(Edge::Right);
        }
    }
}

/// Give legacy records an edge, and re-anchor left-aligned notes that now sit
/// nearer the right edge. Returns true if any note changed.
pub fn migrate_to_edge_positioning(notes: &mut Notes, viewport_width: i64) -> bool {
    let mut changed = false;
    for note in notes.values_mut() {
        let Some(left) = note.left.as_deref().map(parse_px) else {
            continue;
        };
        match note.edge {
            None => {
                anchor(note, left, viewport_width);
                changed = true;
            }
            Some(Edge::Left)
                if note.right.is_none()
                    && determine_edge(left, note.width_px(), viewport_width) == Edge::Right =>
            {
                anchor(note, left, viewport_width);
                changed = true;
            }
            _ => {}
        }
    }
    changed
}

/// Pull every note back inside a `viewport_width` x `viewport_height` viewport.
/// Returns true if any note moved.
pub fn constrain_to_viewport(notes: &mut Notes, viewport_width: i64, viewport_height: i64) -> bool {
    let mut changed = false;
    for note in notes.values_mut() {
        let width = note.width_px();
        let height = note.height_px();

        let top = note.top_px();
        let clamped_top = top.min(viewport_height.saturating_sub(height)).max(0);
        if clamped_top != top {
            note.top = Some(px(clamped_top));
            changed = true;
        }

        let max_offset = viewport_width.saturating_sub(width);
        let right_anchored =
            note.edge() == Edge::Right && note.right.as_deref().is_some_and(|r| !r.is_empty());
        let horizontal = if right_anchored {
            note.right.as_mut()
        } else {
            note.left.as_mut()
        };
        if let Some(offset) = horizontal.filter(|o| !o.is_empty()) {
            let value = parse_px(offset);
            let clamped = value.min(max_offset).max(0);
            if clamped != value {
                *offset = px(clamped);
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearer_edge_wins_ties_go_left() {
        assert_eq!(determine_edge(100, 200, 1400), Edge::Left);
        assert_eq!(determine_edge(1100, 200, 1400), Edge::Right);
        assert_eq!(determine_edge(600, 200, 1400), Edge::Left);
        assert_eq!(determine_edge(601, 200, 1400), Edge::Right);
    }

    #[test]
    fn anchor_right_stores_distance_from_right_edge() {
        let mut note = Note::at(0, 40);
        anchor(&mut note, 1150, 1400);
        assert_eq!(note.edge, Some(Edge::Right));
        assert_eq!(note.left, None);
        assert_eq!(note.right.as_deref(), Some("50px"));
        assert_eq!(note.left_px(1400), 1150);

        anchor(&mut note, 20, 1400);
        assert_eq!(note.edge, Some(Edge::Left));
        assert_eq!(note.left.as_deref(), Some("20px"));
        assert_eq!(note.right, None);
    }

    #[test]
    fn migration_assigns_edges_once() {
        let mut notes = Notes::new();
        notes.insert("a".into(), Note::at(100, 100));
        notes.insert("b".into(), Note::at(1150, 100));

        assert!(migrate_to_edge_positioning(&mut notes, 1400));
        assert_eq!(notes["a"].edge, Some(Edge::Left));
        assert_eq!(notes["b"].edge, Some(Edge::Right));
        assert_eq!(notes["b"].right.as_deref(), Some("50px"));

        assert!(!migrate_to_edge_positioning(&mut notes, 1400));
    }

    #[test]
    fn migration_fixes_misaligned_left_notes() {
        let mut notes = Notes::new();
        let mut note = Note::at(1100, 100);
        note.edge = Some(Edge::Left);
        notes.insert("a".into(), note);

        assert!(migrate_to_edge_positioning(&mut notes, 1400));
        assert_eq!(notes["a"].edge, Some(Edge::Right));
        assert_eq!(notes["a"].right.as_deref(), Some("100px"));
    }

    #[test]
    fn constrain_clamps_both_axes() {
        let mut notes = Notes::new();
        notes.insert("low".into(), Note::at(1300, 850));
        let mut right = Note::at(0, -20);
        right.left = None;
        right.edge = Some(Edge::Right);
        right.right = Some("1500px".into());
        notes.insert("right".into(), right);

        assert!(constrain_to_viewport(&mut notes, 1400, 900));
        assert_eq!(notes["low"].left.as_deref(), Some("1200px"));
        assert_eq!(notes["low"].top.as_deref(), Some("700px"));
        assert_eq!(notes["right"].right.as_deref(), Some("1200px"));
        assert_eq!(notes["right"].top.as_deref(), Some("0px"));

        assert!(!constrain_to_viewport(&mut notes, 1400, 900));
    }

    #[test]
    fn extreme_offsets_are_clamped_without_overflow() {
        let mut notes = Notes::new();
        notes.insert("far".into(), Note::at(i64::MAX, i64::MIN + 1));
        let mut right = Note::default();
        right.edge = Some(Edge::Right);
        right.right = Some(px(i64::MIN + 1));
        notes.insert("right".into(), right);
        assert_eq!(notes["right"].left_px(1400), i64::MAX - 200);

        assert!(migrate_to_edge_positioning(&mut notes, 1400));
        assert_eq!(notes["far"].edge, Some(Edge::Right));

        assert!(constrain_to_viewport(&mut notes, 1400, 900));
        assert_eq!(notes["far"].right.as_deref(), Some("0px"));
        assert_eq!(notes["far"].top.as_deref(), Some("0px"));
        assert_eq!(notes["right"].right.as_deref(), Some("0px"));
        assert_eq!(notes["right"].left_px(1400), 1200);
    }

    #[test]
    fn tiny_viewport_pins_to_origin() {
        let mut notes = Notes::new();
        notes.insert("a".into(), Note::at(50, 50));
        assert!(constrain_to_viewport(&mut notes, 100, 100));
        assert_eq!(notes["a"].left.as_deref(), Some("0px"));
        assert_eq!(notes["a"].top.as_deref(), Some("0px"));
    }
}
