use once_cell::sync::Lazy;
use std::sync::Mutex;
use uuid::Uuid;

/// Registry of active recorder handles, used to detect "a recording is
/// already running" across script reinitializations.
///
/// This is a weak presence flag, never an ownership transfer: nothing
/// can reach through it to control a recorder, and it is never the sole
/// reference keeping one alive. Single writer per context is the
/// supported model; concurrent registration from multiple contexts is
/// undefined behavior (known limitation inherited from the original
/// design).
pub struct RecorderRegistry {
    entries: Mutex<Vec<Uuid>>,
}

impl RecorderRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, recorder_id: Uuid) {
        self.entries.lock().unwrap().push(recorder_id);
    }

    pub fn has_active(&self) -> bool {
        !self.entries.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Default for RecorderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: Lazy<RecorderRegistry> = Lazy::new(RecorderRegistry::new);

/// The process-wide registry shared by every session in this context.
pub fn global() -> &'static RecorderRegistry {
    &GLOBAL_REGISTRY
}
