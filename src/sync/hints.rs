use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Best-effort UI hints passed between instances. Never carries note state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// Put the caret in a freshly created note
    FocusNote(String),
}

/// Fan-out channel for hints. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct HintBus {
    listeners: Arc<Mutex<Vec<Sender<Hint>>>>,
}

impl HintBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&self) -> Receiver<Hint> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(tx);
        }
        rx
    }

    /// Deliver to every live listener. Returns how many received it;
    /// a poisoned bus or hung-up listeners are skipped silently.
    pub fn send(&self, hint: Hint) -> usize {
        let Ok(mut listeners) = self.listeners.lock() else {
            return 0;
        };
        listeners.retain(|tx| tx.send(hint.clone()).is_ok());
        listeners.len()
    }
}
