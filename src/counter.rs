use crate::progress::Progress;
use crossbeam_utils::atomic::AtomicCell;
use std::sync::Arc;

/// Types that report how many bytes have moved through them.
///
/// [`Reader`](crate::Reader), [`Writer`](crate::Writer) and [`ByteCounter`] all implement this.
/// A [`Ticker`](crate::Ticker) accepts anything implementing it, so progress can also be sampled
/// from custom sources that count something other than stream I/O.
pub trait Counter {
    /// Returns the number of bytes counted so far.
    fn bytes(&self) -> u64;

    /// Returns the total number of bytes expected, if known.
    fn total(&self) -> Option<u64> {
        None
    }
}

/// A cheaply cloneable, lock-free byte counter.
///
/// Clones share the same underlying count: [`Reader`](crate::Reader) and
/// [`Writer`](crate::Writer) hand out clones of their counter so the count can be observed from
/// another thread while I/O is in progress. The counter can also be used on its own to
/// instrument a transfer that doesn't go through the wrappers, by calling [`add`](Self::add)
/// wherever bytes move.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter {
    count: Arc<AtomicCell<u64>>,
    total: Option<u64>,
}

impl ByteCounter {
    /// Returns a new counter for an operation of unknown size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new counter for an operation expected to move `total` bytes.
    pub fn with_total(total: u64) -> Self {
        ByteCounter {
            count: Arc::default(),
            total: Some(total),
        }
    }

    /// Adds `bytes` to the count.
    pub fn add(&self, bytes: u64) {
        self.count.fetch_add(bytes);
    }

    /// Returns the number of bytes counted so far.
    pub fn bytes(&self) -> u64 {
        self.count.load()
    }

    /// Returns the total number of bytes expected, if declared.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Returns a [`Progress`] snapshot of the counter as it is right now.
    ///
    /// The snapshot carries no time estimates; those come from a running
    /// [`Ticker`](crate::Ticker).
    pub fn progress(&self) -> Progress {
        Progress::new(self.bytes(), self.total)
    }
}

impl Counter for ByteCounter {
    fn bytes(&self) -> u64 {
        self.count.load()
    }

    fn total(&self) -> Option<u64> {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteCounter, Counter};

    #[test]
    fn clones_share_the_count() {
        let counter = ByteCounter::new();
        let clone = counter.clone();

        counter.add(10);
        clone.add(5);

        assert_eq!(counter.bytes(), 15);
        assert_eq!(clone.bytes(), 15);
    }

    #[test]
    fn total_is_none_by_default() {
        let counter = ByteCounter::new();
        assert_eq!(counter.total(), None);

        let counter = ByteCounter::with_total(100);
        assert_eq!(counter.total(), Some(100));
    }

    #[test]
    fn progress_snapshots_the_current_state() {
        let counter = ByteCounter::with_total(100);
        counter.add(25);

        let progress = counter.progress();
        assert_eq!(progress.bytes(), 25);
        assert_eq!(progress.total(), Some(100));
        assert!(progress.remaining().is_none());
        assert!(progress.eta().is_none());
    }
}
