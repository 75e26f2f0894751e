//! Keeping one instance's note cache consistent with the shared store.

pub mod clock;
pub mod debounce;
pub mod editing;
pub mod hints;
pub mod instance;

pub use clock::{Clock, ManualClock, SystemClock};
pub use instance::{SyncError, SyncInstance, WidgetEvent};
