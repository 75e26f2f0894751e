use serde::{Deserialize, Deserializer};

/// Parse a CSS pixel offset like `"100px"` into whole pixels.
///
/// Only the leading integer is read, so `"12.7px"` is 12. Anything without a
/// leading integer (empty, `"auto"`, junk) is 0.
pub fn parse_px(s: &str) -> i64 {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    digits[..end].parse::<i64>().map_or(0, |n| sign * n)
}

/// Format whole pixels as a CSS offset string.
pub fn px(value: i64) -> String {
    format!("{}px", value)
}

/// Axis-aligned rectangle in page pixels. Edges saturate at the `i64`
/// range, so absurd stored offsets still yield a usable rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rect {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Rect {
            left,
            top,
            right: left.saturating_add(width),
            bottom: top.saturating_add(height),
        }
    }

    pub fn width(&self) -> i64 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i64 {
        self.bottom.saturating_sub(self.top)
    }

    /// True unless the two rectangles are separated along some axis.
    /// Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right <= other.left
            || other.right <= self.left
            || self.bottom <= other.top
            || other.bottom <= self.top)
    }
}

/// Accept a stored offset as `"NNpx"`, a bare number, or null.
pub(crate) fn de_px<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(px),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_px_reads_integer_prefix() {
        assert_eq!(parse_px("100px"), 100);
        assert_eq!(parse_px("12.7px"), 12);
        assert_eq!(parse_px(" 40 "), 40);
        assert_eq!(parse_px("-15px"), -15);
        assert_eq!(parse_px("auto"), 0);
        assert_eq!(parse_px(""), 0);
    }

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let a = Rect::new(100, 100, 200, 200);
        let b = Rect::new(300, 100, 200, 200);
        let c = Rect::new(100, 300, 200, 200);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn intersecting_rectangles_overlap() {
        let a = Rect::new(100, 100, 200, 200);
        let b = Rect::new(299, 299, 10, 10);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // containment counts
        let inner = Rect::new(150, 150, 10, 10);
        assert!(a.overlaps(&inner));
    }

    #[test]
    fn extreme_offsets_saturate() {
        let far = Rect::new(i64::MAX, i64::MAX - 10, 200, 200);
        assert_eq!(far.right, i64::MAX);
        assert_eq!(far.bottom, i64::MAX);
        assert_eq!(far.width(), 0);
        assert!(!far.overlaps(&Rect::new(100, 100, 200, 200)));

        let wide = Rect::new(i64::MIN, 0, 10, 10);
        assert_eq!(wide.width(), 10);
        assert_eq!(Rect::new(-10, 0, i64::MAX, 0).width(), i64::MAX);
    }
}
