use std::collections::VecDeque;
use std::sync::{Arc, Weak};

pub const RESULT_ICON_BATCH: usize = 3;
pub const OVERVIEW_ICON_BATCH: usize = 2;

/// A display placeholder that can receive a resource once it is loaded.
pub trait IconSlot {
    fn assign_icon(&self, icon: &str);
}

pub struct DeferredLoadTask<S> {
    slot: Weak<S>,
    icon: String,
}

impl<S> DeferredLoadTask<S> {
    pub fn new(slot: &Arc<S>, icon: impl Into<String>) -> Self {
        Self {
            slot: Arc::downgrade(slot),
            icon: icon.into(),
        }
    }
}

/// Rate-limited queue that hands resources to placeholders a few at a time.
///
/// A paused loader keeps its queue; `discard` drops the whole pass.
pub struct DeferredLoader<S> {
    queue: VecDeque<DeferredLoadTask<S>>,
    batch_size: usize,
    paused: bool,
}

impl<S: IconSlot> DeferredLoader<S> {
    pub fn new(batch_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            batch_size: batch_size.max(1),
            paused: false,
        }
    }

    /// Starts a new display pass, dropping anything left from the previous one.
    pub fn replace(&mut self, tasks: impl IntoIterator<Item = DeferredLoadTask<S>>) {
        self.queue.clear();
        self.queue.extend(tasks);
    }

    pub fn push(&mut self, task: DeferredLoadTask<S>) {
        self.queue.push_back(task);
    }

    pub fn discard(&mut self) {
        self.queue.clear();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unpauses and drains everything queued while hidden.
    pub fn resume(&mut self) -> usize {
        self.paused = false;
        self.drain_all()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn has_pending(&self) -> bool {
        !self.paused && !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs one scheduler turn worth of assignments. Returns the number of
    /// tasks consumed, including those whose placeholder is already gone.
    pub fn drain_batch(&mut self) -> usize {
        if self.paused {
            return 0;
        }

        let mut consumed = 0;
        while consumed < self.batch_size {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            consumed += 1;
            if let Some(slot) = task.slot.upgrade() {
                slot.assign_icon(&task.icon);
            }
        }
        consumed
    }

    pub fn drain_all(&mut self) -> usize {
        let mut total = 0;
        loop {
            let consumed = self.drain_batch();
            if consumed == 0 {
                return total;
            }
            total += consumed;
        }
    }
}
