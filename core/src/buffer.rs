use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::sample::IqSample;

/// Thread-safe FIFO of whole IQ records. The single hand-off point between a
/// network endpoint and the signal-processing side: one producer appends,
/// one consumer drains, any number of callers may query the size.
///
/// The buffer owns its lock. Composite operations (size-check-then-append,
/// size-check-then-drain) hold it for their whole duration, so a consumer
/// never observes a partially written record and a drain never races an
/// append into losing or duplicating records.
pub struct SampleBuffer {
    records: Mutex<VecDeque<IqSample>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-allocates room for `capacity` records. The buffer still grows
    /// past the hint; bounding is policy (see [`append_bounded`]), not a
    /// property of the container.
    ///
    /// [`append_bounded`]: SampleBuffer::append_bounded
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends records at the tail in the order given. Never blocks beyond
    /// the lock, never fails.
    pub fn append(&self, records: &[IqSample]) {
        self.lock().extend(records.iter().copied());
    }

    /// Appends only while the buffer is at or under `high_water` records.
    /// Returns `false` when the records were shed instead; callers treat
    /// that as backpressure, not as an error.
    pub fn append_bounded(&self, records: &[IqSample], high_water: usize) -> bool {
        let mut queue = self.lock();
        if queue.len() > high_water {
            return false;
        }
        queue.extend(records.iter().copied());
        true
    }

    /// Current record count.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically copies out and removes up to the first `n` records, in
    /// FIFO order. Returns fewer when fewer are queued; callers re-check
    /// [`size`](SampleBuffer::size) rather than relying on the count.
    pub fn drain(&self, n: usize) -> Vec<IqSample> {
        let mut queue = self.lock();
        let n = n.min(queue.len());
        queue.drain(..n).collect()
    }

    /// Drains every queued record under a single lock acquisition.
    pub fn drain_all(&self) -> Vec<IqSample> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<VecDeque<IqSample>> {
        self.records.lock().unwrap()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
