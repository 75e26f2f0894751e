/// Trailing-edge debounce driven by an external clock.
///
/// Each `schedule` pushes the deadline out to `now + delay`; the owner calls
/// `fire_if_due` from its loop and performs the deferred work when it returns
/// true.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: i64,
    deadline: Option<i64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Debouncer {
            delay_ms: i64::try_from(delay_ms).unwrap_or(i64::MAX),
            deadline: None,
        }
    }

    /// (Re)start the window. A pending deadline is replaced, not kept.
    pub fn schedule(&mut self, now_ms: i64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    /// True exactly once per window, when `now_ms` has reached the deadline.
    pub fn fire_if_due(&mut self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
