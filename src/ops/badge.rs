/// Badge background color
pub const BADGE_COLOR: &str = "#4285f4";

/// Text for the note-count badge: the count when enabled and non-zero, else empty.
pub fn badge_text(note_count: usize, show_badge_count: bool) -> String {
    if show_badge_count && note_count > 0 {
        note_count.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_count_only_when_enabled_and_non_zero() {
        assert_eq!(badge_text(3, true), "3");
        assert_eq!(badge_text(0, true), "");
        assert_eq!(badge_text(3, false), "");
    }
}
