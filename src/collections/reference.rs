use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

/// A computed `(size, align)` pair, the payload the `Reference` latches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeAlign {
    pub size: u64,
    pub align: u64,
}

#[derive(Default)]
struct Slot {
    value: Mutex<Option<SizeAlign>>,
    cond: Condvar,
}

/// Process-wide mapping from a struct identity to its computed size/align,
/// shared by every walker task. Writes are write-once (a second write to an
/// already-set key is silently ignored); reads block until the key has been
/// written, letting a struct that embeds another by value see the embedded
/// struct's post-strategy size regardless of visitation order.
#[derive(Clone, Default)]
pub struct Reference {
    inner: Arc<Mutex<HashMap<String, Arc<Slot>>>>,
}

impl Reference {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &str) -> Arc<Slot> {
        let mut map = self.inner.lock().unwrap();
        map.entry(id.to_string()).or_insert_with(|| Arc::new(Slot::default())).clone()
    }

    /// Pre-allocates a slot for `id` so concurrent readers block on it
    /// instead of falling through to "unknown" before this id's writer runs.
    pub fn reserve(&self, id: &str) {
        self.slot(id);
    }

    /// Returns whether `id` has a reserved slot at all (written or not).
    pub fn known(&self, id: &str) -> bool {
        self.inner.lock().unwrap().contains_key(id)
    }

    /// Writes `id`'s value. A second write to the same id is a no-op.
    pub fn set(&self, id: &str, value: SizeAlign) {
        let slot = self.slot(id);
        let mut guard = slot.value.lock().unwrap();
        if guard.is_none() {
            *guard = Some(value);
            slot.cond.notify_all();
        }
    }

    /// Blocks until `id` has been written, then returns its value. Returns
    /// `None` if `id` was never reserved (the struct was never visited).
    pub fn get(&self, id: &str) -> Option<SizeAlign> {
        let slot = {
            let map = self.inner.lock().unwrap();
            map.get(id)?.clone()
        };
        let guard = slot.value.lock().unwrap();
        let guard = slot.cond.wait_while(guard, |v| v.is_none()).unwrap();
        *guard
    }
}
