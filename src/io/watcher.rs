use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Signal that the watched notes file was touched on disk.
/// Carries no content; the reader re-reads the file and diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTouched;

/// Watches one file inside a directory for creates, writes, renames and removes.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileTouched>,
}

impl StoreWatcher {
    /// Watch `dir` for activity on `file_name`.
    ///
    /// The directory is watched rather than the file, since atomic saves
    /// replace the file's inode on every write.
    pub fn start(dir: &Path, file_name: &str) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target = OsString::from(file_name);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let touched = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(target.as_os_str()));
                if touched {
                    let _ = tx.send(FileTouched);
                }
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// True if the file was touched since the last call. Never blocks;
    /// bursts of events collapse into one.
    pub fn poll(&self) -> bool {
        self.rx.try_iter().count() > 0
    }
}
