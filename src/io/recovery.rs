use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Past this size the log is rotated to `.recovery.log.old` before appending.
const MAX_LOG_SIZE: u64 = 1_048_576;

const FILE_HEADER: &str = "\
<!-- stickies recovery log: note data that could not be saved.
     View with: stk recovery
     Clear with: stk recovery --clear -->

---
";

/// What kind of save failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A whole-collection write was rejected (quota, I/O, lock)
    Write,
    /// An imported backup replaced the collection
    Import,
    /// Every note was deleted at once
    Clear,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Import => write!(f, "import"),
            RecoveryCategory::Clear => write!(f, "clear"),
        }
    }
}

impl RecoveryCategory {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "write" => Some(RecoveryCategory::Write),
            "import" => Some(RecoveryCategory::Import),
            "clear" => Some(RecoveryCategory::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    /// The data that would otherwise be lost
    pub body: String,
}

impl RecoveryEntry {
    pub fn now(category: RecoveryCategory, description: impl Into<String>, body: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            body: body.into(),
        }
    }

    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} | {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        if !self.body.is_empty() {
            out.push_str("```json\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        out.push_str("---\n");
        out
    }
}

pub fn recovery_log_path(store_dir: &Path) -> PathBuf {
    store_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append an entry. Failures are logged and otherwise ignored.
pub fn log_recovery(store_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(store_dir, &entry) {
        tracing::warn!(error = %e, "could not write to recovery log");
    }
}

fn append_entry(store_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(store_dir);

    if std::fs::metadata(&path).is_ok_and(|m| m.len() > MAX_LOG_SIZE) {
        std::fs::rename(&path, path.with_extension("log.old"))?;
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Entries in the log, most recent first.
pub fn read_recovery_entries(store_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(store_dir)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Remove the log. Returns how many entries it held.
pub fn clear_recovery(store_dir: &Path) -> io::Result<usize> {
    let path = recovery_log_path(store_dir);
    let count = match std::fs::read_to_string(&path) {
        Ok(content) => parse_entries(&content).len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    std::fs::remove_file(&path)?;
    Ok(count)
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_header)
        else {
            continue;
        };

        let mut body = String::new();
        let mut in_block = false;
        for line in lines.by_ref() {
            if in_block {
                if line == "```" {
                    in_block = false;
                } else {
                    body.push_str(line);
                    body.push('\n');
                }
            } else if line.starts_with("```") {
                in_block = true;
            } else if line == "---" {
                break;
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            body,
        });
    }
    entries
}

fn parse_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(" | ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    Some((
        timestamp,
        RecoveryCategory::parse(category)?,
        description.to_string(),
    ))
}
