use serde::Serialize;
use std::time::{Duration, SystemTime};

/// A point-in-time description of how far an operation has come.
///
/// Snapshots are immutable: each one describes the moment it was taken and is never updated
/// afterwards. They come from [`ByteCounter::progress`](crate::ByteCounter::progress) (counts
/// only) or from a running [`Ticker`](crate::Ticker) (counts plus time estimates, once the
/// ticker has seen enough to extrapolate from).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    bytes: u64,
    total: Option<u64>,
    remaining: Option<Duration>,
    eta: Option<SystemTime>,
}

impl Progress {
    pub(crate) fn new(bytes: u64, total: Option<u64>) -> Self {
        Progress {
            bytes,
            total,
            remaining: None,
            eta: None,
        }
    }

    pub(crate) fn with_estimate(
        bytes: u64,
        total: Option<u64>,
        remaining: Duration,
        eta: SystemTime,
    ) -> Self {
        Progress {
            bytes,
            total,
            remaining: Some(remaining),
            eta: Some(eta),
        }
    }

    /// Returns the number of bytes processed so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the total number of bytes expected, or `None` when the size of the operation is
    /// unknown.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Returns the estimated time left until the operation finishes.
    ///
    /// `None` when the total size is unknown, and on snapshots taken before the ticker had a
    /// baseline transfer rate to extrapolate from.
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Returns the estimated wall-clock time at which the operation finishes.
    ///
    /// Present exactly when [`remaining`](Self::remaining) is.
    pub fn eta(&self) -> Option<SystemTime> {
        self.eta
    }

    /// Returns the percentage complete, or `None` when the total size is unknown.
    ///
    /// Runs from 0 when nothing has been processed to 100 when the count has reached the total,
    /// and past 100 when the count overshoots a declared total that turned out to be too small.
    pub fn percent(&self) -> Option<f64> {
        let total = self.total?;

        if self.bytes == 0 {
            Some(0.0)
        } else if self.bytes == total || total == 0 {
            Some(100.0)
        } else {
            Some(100.0 * self.bytes as f64 / total as f64)
        }
    }

    /// Returns whether the operation has processed at least as many bytes as its total.
    ///
    /// Always `false` while the total size is unknown.
    pub fn is_complete(&self) -> bool {
        self.total.map_or(false, |total| self.bytes >= total)
    }
}
