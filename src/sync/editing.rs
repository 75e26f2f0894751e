use std::collections::HashMap;

/// Per-note "actively editing" flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// Editing until the deadline (epoch ms) passes without another keystroke
    Editing { deadline: i64 },
}

/// Expiring editing flags for every note this instance is typing into.
#[derive(Debug, Clone)]
pub struct EditingTracker {
    timeout_ms: i64,
    states: HashMap<String, EditState>,
}

impl EditingTracker {
    pub fn new(timeout_ms: u64) -> Self {
        EditingTracker {
            timeout_ms: i64::try_from(timeout_ms).unwrap_or(i64::MAX),
            states: HashMap::new(),
        }
    }

    /// A keystroke: mark the note as being edited until `now + timeout`.
    pub fn touch(&mut self, id: &str, now_ms: i64) {
        let deadline = now_ms.saturating_add(self.timeout_ms);
        self.states
            .insert(id.to_string(), EditState::Editing { deadline });
    }

    pub fn stop(&mut self, id: &str) {
        self.states.remove(id);
    }

    pub fn state(&self, id: &str, now_ms: i64) -> EditState {
        match self.states.get(id) {
            Some(&EditState::Editing { deadline }) if now_ms < deadline => {
                EditState::Editing { deadline }
            }
            _ => EditState::Idle,
        }
    }

    pub fn is_editing(&self, id: &str, now_ms: i64) -> bool {
        matches!(self.state(id, now_ms), EditState::Editing { .. })
    }

    /// Drop flags whose deadline has passed. Returns the ids that went idle.
    pub fn expire(&mut self, now_ms: i64) -> Vec<String> {
        let expired: Vec<String> = self
            .states
            .iter()
            .filter(|(_, s)| matches!(s, EditState::Editing { deadline } if now_ms >= *deadline))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.states.remove(id);
        }
        expired
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
