use std::collections::{HashMap, HashSet, VecDeque};

use crate::io::store::{ChangeFeed, NoteStore, StoreChange, StoreError};
use crate::model::config::SyncConfig;
use crate::model::geometry::px;
use crate::model::note::{Note, NoteColor, Notes};
use crate::ops::edge::{anchor, constrain_to_viewport, migrate_to_edge_positioning};
use crate::ops::placement::find_position;

use super::clock::Clock;
use super::debounce::Debouncer;
use super::editing::EditingTracker;
use super::hints::{Hint, HintBus};

pub const MIN_NOTE_WIDTH: i64 = 150;
pub const MIN_NOTE_HEIGHT: i64 = 100;

/// Own writes remembered for echo detection
const MAX_PENDING_ECHOES: usize = 16;

/// Error type for sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("note not found: {0}")]
    NoteNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the UI layer should do with its widgets after a sync step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// A note with no widget yet
    Materialize(String),
    /// Redraw; `content_changed` when the text itself was replaced
    Update { id: String, content_changed: bool },
    /// The note is gone
    Remove(String),
}

/// One instance's view of the shared collection.
///
/// Owns the local cache plus all per-note bookkeeping (known edit
/// timestamps, editing flags, in-progress drags) and the pending debounced
/// writes. Local mutations land in the cache immediately; remote changes
/// arrive through the store's change feed and are merged by `tick`.
pub struct SyncInstance<S: NoteStore, C: Clock> {
    store: S,
    clock: C,
    feed: Option<Box<dyn ChangeFeed>>,
    notes: Notes,
    last_edit: HashMap<String, i64>,
    editing: EditingTracker,
    interacting: HashSet<String>,
    content_save: Debouncer,
    layout_save: Debouncer,
    hints: Option<HintBus>,
    viewport: (i64, i64),
    /// Collections this instance committed whose change events haven't come back yet
    pending_echoes: VecDeque<Notes>,
}

impl<S: NoteStore, C: Clock> SyncInstance<S, C> {
    pub fn new(store: S, clock: C, config: &SyncConfig) -> Self {
        SyncInstance {
            store,
            clock,
            feed: None,
            notes: Notes::new(),
            last_edit: HashMap::new(),
            editing: EditingTracker::new(config.editing_timeout_ms),
            interacting: HashSet::new(),
            content_save: Debouncer::new(config.content_debounce_ms),
            layout_save: Debouncer::new(config.layout_debounce_ms),
            hints: None,
            viewport: (1400, 900),
            pending_echoes: VecDeque::new(),
        }
    }

    /// Send focus hints for created notes over `bus`
    pub fn with_hints(mut self, bus: HintBus) -> Self {
        self.hints = Some(bus);
        self
    }

    pub fn with_viewport(mut self, width: i64, height: i64) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notes(&self) -> &Notes {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn viewport(&self) -> (i64, i64) {
        self.viewport
    }

    /// Last content timestamp this instance has seen or produced for `id`
    pub fn known_edit_timestamp(&self, id: &str) -> Option<i64> {
        self.last_edit.get(id).copied()
    }

    pub fn is_actively_editing(&self, id: &str) -> bool {
        self.editing.is_editing(id, self.clock.now_ms())
    }

    pub fn is_interacting(&self, id: &str) -> bool {
        self.interacting.contains(id)
    }

    pub fn has_pending_writes(&self) -> bool {
        self.content_save.is_pending() || self.layout_save.is_pending()
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Subscribe to the store and replace the cache with its contents.
    /// Returns one `Materialize` per note.
    pub fn load(&mut self) -> Result<Vec<WidgetEvent>, SyncError> {
        if self.feed.is_none() {
            self.feed = Some(self.store.subscribe()?);
        }
        self.notes = self.store.get_all()?;
        self.last_edit = self
            .notes
            .iter()
            .filter_map(|(id, note)| note.last_edit_timestamp.map(|ts| (id.clone(), ts)))
            .collect();
        self.editing.clear();
        self.interacting.clear();
        tracing::info!(count = self.notes.len(), "loaded notes");
        Ok(self
            .notes
            .keys()
            .map(|id| WidgetEvent::Materialize(id.clone()))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Local writes
    // -----------------------------------------------------------------------

    /// Place and persist a new empty note. The write goes out immediately,
    /// built on a fresh read of the store; the note only enters the local
    /// cache once the write succeeded.
    pub fn create_note(&mut self, viewport_width: i64) -> Result<String, SyncError> {
        let mut current = self.store.get_all().inspect_err(|e| {
            tracing::warn!(error = %e, "could not read notes before creating one");
        })?;

        let now = self.clock.now_ms();
        let id = unique_id(now, &current, &self.notes);
        let position = find_position(&current, viewport_width);
        let mut note = Note::at(position.left, position.top);
        anchor(&mut note, position.left, viewport_width);
        note.z_index = Some(max_z(&current).saturating_add(1));
        note.last_edit_timestamp = Some(now);

        current.insert(id.clone(), note.clone());
        if let Err(e) = self.store.set_all(&current) {
            tracing::warn!(error = %e, "note creation abandoned");
            return Err(e.into());
        }
        self.expect_echo(current);

        self.notes.insert(id.clone(), note);
        self.last_edit.insert(id.clone(), now);
        tracing::debug!(id = %id, left = position.left, top = position.top, "created note");

        if let Some(bus) = &self.hints {
            bus.send(Hint::FocusNote(id.clone()));
        }
        Ok(id)
    }

    /// Delete locally and write the collection immediately.
    pub fn delete_note(&mut self, id: &str) -> Result<(), SyncError> {
        if self.notes.shift_remove(id).is_none() {
            return Err(SyncError::NoteNotFound(id.to_string()));
        }
        self.forget(id);
        tracing::debug!(id, "deleted note");
        self.persist()
    }

    /// Replace a note's text. Stamps the edit, marks the note as being
    /// edited and schedules a debounced write.
    pub fn update_content(&mut self, id: &str, text: &str) -> Result<(), SyncError> {
        let now = self.clock.now_ms();
        let note = self.note_mut(id)?;
        note.content = text.to_string();
        note.last_edit_timestamp = Some(now);
        self.last_edit.insert(id.to_string(), now);
        self.editing.touch(id, now);
        self.content_save.schedule(now);
        Ok(())
    }

    /// Move a note to an absolute page offset, anchoring it to the nearer
    /// viewport edge.
    pub fn update_position(
        &mut self,
        id: &str,
        left: i64,
        top: i64,
        viewport_width: i64,
    ) -> Result<(), SyncError> {
        let note = self.note_mut(id)?;
        anchor(note, left, viewport_width);
        note.top = Some(px(top));
        self.schedule_layout_save();
        Ok(())
    }

    /// Resize, never below 150x100.
    pub fn resize(&mut self, id: &str, width: i64, height: i64) -> Result<(), SyncError> {
        let note = self.note_mut(id)?;
        note.width = Some(px(width.max(MIN_NOTE_WIDTH)));
        note.height = Some(px(height.max(MIN_NOTE_HEIGHT)));
        self.schedule_layout_save();
        Ok(())
    }

    pub fn set_color(&mut self, id: &str, color: NoteColor) -> Result<(), SyncError> {
        self.note_mut(id)?.background_color = Some(color);
        self.schedule_layout_save();
        Ok(())
    }

    /// Flip the minimized flag. Returns the new value.
    pub fn toggle_minimize(&mut self, id: &str) -> Result<bool, SyncError> {
        let note = self.note_mut(id)?;
        note.minimized = !note.minimized;
        let minimized = note.minimized;
        self.schedule_layout_save();
        Ok(minimized)
    }

    /// Stack the note above every other. Returns its new zIndex.
    pub fn bring_to_front(&mut self, id: &str) -> Result<i64, SyncError> {
        let top_of_others = self
            .notes
            .iter()
            .filter(|(other, _)| other.as_str() != id)
            .map(|(_, n)| n.z())
            .max();
        let note = self.note_mut(id)?;
        match top_of_others {
            Some(max) if note.z() <= max => {
                note.z_index = Some(max.saturating_add(1));
            }
            _ => return Ok(note.z()),
        }
        let z = note.z();
        self.schedule_layout_save();
        Ok(z)
    }

    /// Raise or clear the editing flag without changing content.
    pub fn set_actively_editing(&mut self, id: &str, editing: bool) {
        if editing {
            self.editing.touch(id, self.clock.now_ms());
        } else {
            self.editing.stop(id);
        }
    }

    /// A drag or resize started; remote layout for this note is ignored
    /// until `end_interaction`.
    pub fn begin_interaction(&mut self, id: &str) {
        self.interacting.insert(id.to_string());
    }

    pub fn end_interaction(&mut self, id: &str) {
        self.interacting.remove(id);
    }

    /// Replace the entire collection (import, delete-all) with an immediate write.
    pub fn replace_all(&mut self, notes: Notes) -> Result<Vec<WidgetEvent>, SyncError> {
        if let Err(e) = self.store.set_all(&notes) {
            tracing::warn!(error = %e, "replacing notes abandoned");
            return Err(e.into());
        }
        self.expect_echo(notes.clone());
        let old = std::mem::take(&mut self.notes);
        let mut events: Vec<WidgetEvent> = old
            .keys()
            .filter(|id| !notes.contains_key(*id))
            .map(|id| WidgetEvent::Remove(id.clone()))
            .collect();
        for id in old.keys().filter(|id| !notes.contains_key(*id)) {
            self.forget(id);
        }
        for (id, note) in &notes {
            if let Some(ts) = note.last_edit_timestamp {
                self.last_edit.insert(id.clone(), ts);
            }
            events.push(if old.contains_key(id) {
                WidgetEvent::Update {
                    id: id.clone(),
                    content_changed: true,
                }
            } else {
                WidgetEvent::Materialize(id.clone())
            });
        }
        self.notes = notes;
        self.content_save.cancel();
        self.layout_save.cancel();
        Ok(events)
    }

    /// Adopt a new viewport: migrate legacy positions to edge anchoring and
    /// clamp every note inside. Moved notes are saved through the layout
    /// debounce.
    pub fn fit_viewport(&mut self, width: i64, height: i64) -> Vec<WidgetEvent> {
        self.viewport = (width, height);
        let before = self.notes.clone();
        let migrated = migrate_to_edge_positioning(&mut self.notes, width);
        let clamped = constrain_to_viewport(&mut self.notes, width, height);
        if !(migrated || clamped) {
            return Vec::new();
        }
        self.schedule_layout_save();
        self.notes
            .iter()
            .filter(|(id, note)| before.get(id.as_str()) != Some(*note))
            .map(|(id, _)| WidgetEvent::Update {
                id: id.clone(),
                content_changed: false,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Remote changes
    // -----------------------------------------------------------------------

    /// Merge one committed write into the cache.
    ///
    /// Ids in `old` but not in `new` are removed. Ids in `new` are created
    /// or merged: layout follows the remote unless this instance is dragging
    /// or resizing the note; content follows only a strictly newer edit
    /// timestamp and never while the note is being typed into. An echo of
    /// this instance's own write changes nothing and yields no events, as
    /// long as no other writer's change arrived since that write.
    pub fn apply_change(&mut self, change: &StoreChange) -> Vec<WidgetEvent> {
        match self.pending_echoes.iter().position(|w| *w == change.new) {
            Some(pos) => {
                // the cache already holds this write or something newer
                self.pending_echoes.drain(..=pos);
                tracing::trace!("skipped own echo");
                return Vec::new();
            }
            None => {
                // Another writer committed in between. Echoes still in
                // flight no longer describe the store and must be merged.
                self.pending_echoes.clear();
            }
        }

        let now = self.clock.now_ms();
        let mut events = Vec::new();

        for id in change.old.keys() {
            if change.new.contains_key(id) {
                continue;
            }
            self.forget(id);
            if self.notes.shift_remove(id).is_some() {
                tracing::debug!(id = %id, "note removed remotely");
                events.push(WidgetEvent::Remove(id.clone()));
            }
        }

        for (id, remote) in &change.new {
            let Some(local) = self.notes.get_mut(id) else {
                self.notes.insert(id.clone(), remote.clone());
                if let Some(ts) = remote.last_edit_timestamp {
                    self.last_edit.insert(id.clone(), ts);
                }
                tracing::debug!(id = %id, "note created remotely");
                events.push(WidgetEvent::Materialize(id.clone()));
                continue;
            };

            let layout_changed = !self.interacting.contains(id) && local.take_layout(remote);

            let known = self.last_edit.get(id).copied().unwrap_or(0);
            let content_changed = match remote.last_edit_timestamp {
                Some(ts) if ts > known && !self.editing.is_editing(id, now) => {
                    local.content = remote.content.clone();
                    local.last_edit_timestamp = Some(ts);
                    self.last_edit.insert(id.clone(), ts);
                    true
                }
                Some(ts) if ts > known => {
                    tracing::debug!(id = %id, "kept local text while editing");
                    false
                }
                _ => false,
            };

            if layout_changed || content_changed {
                events.push(WidgetEvent::Update {
                    id: id.clone(),
                    content_changed,
                });
            }
        }
        events
    }

    /// Run one step of the instance loop: merge pending remote changes,
    /// expire editing flags and perform any due debounced write. Failed
    /// debounced writes are logged and dropped.
    pub fn tick(&mut self) -> Vec<WidgetEvent> {
        let changes = match self.feed.as_mut() {
            Some(feed) => feed.poll(),
            None => Vec::new(),
        };
        let mut events = Vec::new();
        for change in &changes {
            events.extend(self.apply_change(change));
        }

        let now = self.clock.now_ms();
        for id in self.editing.expire(now) {
            tracing::trace!(id = %id, "editing flag expired");
        }

        let content_due = self.content_save.fire_if_due(now);
        let layout_due = self.layout_save.fire_if_due(now);
        if content_due || layout_due {
            // already logged; the next local change writes everything again
            let _ = self.persist();
        }
        events
    }

    /// Write now if a debounced write is pending.
    pub fn flush(&mut self) -> Result<(), SyncError> {
        if !self.has_pending_writes() {
            return Ok(());
        }
        self.persist()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn note_mut(&mut self, id: &str) -> Result<&mut Note, SyncError> {
        self.notes
            .get_mut(id)
            .ok_or_else(|| SyncError::NoteNotFound(id.to_string()))
    }

    fn schedule_layout_save(&mut self) {
        self.layout_save.schedule(self.clock.now_ms());
    }

    fn forget(&mut self, id: &str) {
        self.last_edit.remove(id);
        self.editing.stop(id);
        self.interacting.remove(id);
    }

    fn expect_echo(&mut self, written: Notes) {
        if self.pending_echoes.len() == MAX_PENDING_ECHOES {
            self.pending_echoes.pop_front();
        }
        self.pending_echoes.push_back(written);
    }

    /// Write the whole cache. Any pending debounce is satisfied by this write.
    fn persist(&mut self) -> Result<(), SyncError> {
        self.content_save.cancel();
        self.layout_save.cancel();
        if let Err(e) = self.store.set_all(&self.notes) {
            tracing::warn!(error = %e, "write abandoned");
            return Err(e.into());
        }
        self.expect_echo(self.notes.clone());
        Ok(())
    }
}

fn max_z(notes: &Notes) -> i64 {
    notes.values().map(Note::z).max().unwrap_or(0)
}

/// Creation-time id, bumped past any id already taken.
fn unique_id(now_ms: i64, stored: &Notes, local: &Notes) -> String {
    let mut candidate = now_ms;
    loop {
        let id = candidate.to_string();
        if !stored.contains_key(&id) && !local.contains_key(&id) {
            return id;
        }
        candidate += 1;
    }
}
