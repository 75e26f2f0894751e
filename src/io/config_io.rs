use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::StickiesConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Written by `stk init`. Every key is optional.
pub const CONFIG_TEMPLATE: &str = r##"# stickies configuration. Every key is optional; defaults are shown.

[sync]
# Trailing debounce before typed content is written to the store
content_debounce_ms = 300
# Trailing debounce for moves, resizes, colors and stacking
layout_debounce_ms = 300
# A note counts as "being edited" this long after the last keystroke,
# during which changes from other instances don't replace its text
editing_timeout_ms = 1000

[store]
# Synced storage quota for the whole collection
quota_bytes = 102400

[display]
show_badge_count = true
viewport_width = 1400
viewport_height = 900
"##;

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
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
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key '{0}' (expected <section>.<key>, e.g. sync.editing_timeout_ms)")]
    UnknownKey(String),
}

fn config_path(store_dir: &Path) -> PathBuf {
    store_dir.join(CONFIG_FILE)
}

fn read_text(store_dir: &Path) -> Result<Option<String>, ConfigError> {
    let path = config_path(store_dir);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::ReadError { path, source }),
    }
}

/// Read the config. A missing file means all defaults.
pub fn read_config(store_dir: &Path) -> Result<StickiesConfig, ConfigError> {
    match read_text(store_dir)? {
        Some(text) => Ok(toml::from_str(&text)?),
        None => Ok(StickiesConfig::default()),
    }
}

/// Read the config as an editable document that keeps comments and layout.
pub fn read_config_doc(store_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let text = read_text(store_dir)?.unwrap_or_default();
    Ok(text.parse()?)
}

pub fn write_config(store_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(store_dir);
    fs::write(&path, doc.to_string()).map_err(|source| ConfigError::WriteError { path, source })
}

/// Look up a dotted key (`display.show_badge_count`) in the effective config,
/// defaults included.
pub fn get_value(config: &StickiesConfig, key: &str) -> Result<String, ConfigError> {
    let (section, field) = split_key(key)?;
    let value =
        toml::Value::try_from(config).map_err(|_| ConfigError::UnknownKey(key.to_string()))?;
    value
        .get(section)
        .and_then(|s| s.get(field))
        .map(|v| v.to_string())
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Set a dotted key in the document. The raw value is parsed as a TOML value
/// (`false`, `250`), falling back to a string. The edited document must still
/// deserialize, so typos and wrong types are rejected before anything is written.
pub fn set_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    raw: &str,
) -> Result<StickiesConfig, ConfigError> {
    let (section, field) = split_key(key)?;
    if get_value(&StickiesConfig::default(), key).is_err() {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }

    let value = raw
        .parse::<toml_edit::Value>()
        .unwrap_or_else(|_| toml_edit::Value::from(raw));

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = toml_edit::Item::Value(value);

    Ok(toml::from_str(&doc.to_string())?)
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    key.split_once('.')
        .filter(|(s, f)| !s.is_empty() && !f.is_empty())
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_parses_to_defaults() {
        let config: StickiesConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, StickiesConfig::default());
    }

    #[test]
    fn missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_config(tmp.path()).unwrap(), StickiesConfig::default());
    }

    #[test]
    fn set_value_keeps_comments() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), CONFIG_TEMPLATE).unwrap();

        let mut doc = read_config_doc(tmp.path()).unwrap();
        let config = set_value(&mut doc, "display.show_badge_count", "false").unwrap();
        assert!(!config.display.show_badge_count);
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        assert!(written.contains("show_badge_count = false"));
        assert!(written.contains("# Synced storage quota"));
        assert!(!read_config(tmp.path()).unwrap().display.show_badge_count);
    }

    #[test]
    fn set_value_creates_missing_section() {
        let mut doc = toml_edit::DocumentMut::new();
        let config = set_value(&mut doc, "sync.editing_timeout_ms", "2000").unwrap();
        assert_eq!(config.sync.editing_timeout_ms, 2000);
        assert!(doc.to_string().contains("[sync]"));
    }

    #[test]
    fn bad_keys_and_types_are_rejected() {
        let mut doc = toml_edit::DocumentMut::new();
        assert!(matches!(
            set_value(&mut doc, "sync.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set_value(&mut doc, "nodot", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set_value(&mut doc, "sync.editing_timeout_ms", "soon"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn get_value_includes_defaults() {
        let config = StickiesConfig::default();
        assert_eq!(get_value(&config, "store.quota_bytes").unwrap(), "102400");
        assert_eq!(get_value(&config, "display.show_badge_count").unwrap(), "true");
        assert!(get_value(&config, "display.nope").is_err());
    }
}
