use serde::{Deserialize, Serialize};

/// Configuration from `.stickies/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StickiesConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Trailing debounce for content writes
    #[serde(default = "default_debounce_ms")]
    pub content_debounce_ms: u64,
    /// Trailing debounce for position, size, color and stacking writes
    #[serde(default = "default_debounce_ms")]
    pub layout_debounce_ms: u64,
    /// How long after the last keystroke a note still counts as being edited
    #[serde(default = "default_editing_timeout_ms")]
    pub editing_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            content_debounce_ms: default_debounce_ms(),
            layout_debounce_ms: default_debounce_ms(),
            editing_timeout_ms: default_editing_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound on the serialized collection, in bytes
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            quota_bytes: default_quota_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_badge_count: bool,
    /// Viewport assumed when the caller doesn't report one
    #[serde(default = "default_viewport_width")]
    pub viewport_width: i64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            show_badge_count: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_editing_timeout_ms() -> u64 {
    1000
}

/// Total quota of browser synced storage
fn default_quota_bytes() -> usize {
    102_400
}

fn default_viewport_width() -> i64 {
    1400
}

fn default_viewport_height() -> i64 {
    900
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config: StickiesConfig = toml::from_str("").unwrap();
        assert_eq!(config, StickiesConfig::default());
        assert_eq!(config.sync.content_debounce_ms, 300);
        assert_eq!(config.sync.editing_timeout_ms, 1000);
        assert_eq!(config.store.quota_bytes, 102_400);
        assert!(config.display.show_badge_count);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: StickiesConfig = toml::from_str(
            "[sync]\nediting_timeout_ms = 2500\n\n[display]\nshow_badge_count = false\n",
        )
        .unwrap();
        assert_eq!(config.sync.editing_timeout_ms, 2500);
        assert_eq!(config.sync.layout_debounce_ms, 300);
        assert!(!config.display.show_badge_count);
        assert_eq!(config.display.viewport_width, 1400);
    }
}
