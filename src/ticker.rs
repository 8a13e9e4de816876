use crate::{
    counter::Counter,
    error::{HeadwayError, Result},
    progress::Progress,
};
use log::*;
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender},
    thread,
    time::{Duration, Instant, SystemTime},
};

/// The interval between snapshots unless [`Ticker::interval`] says otherwise: one second.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A periodic sampler that turns a [`Counter`] into a stream of [`Progress`] snapshots.
///
/// Once [started](Self::start), a background thread polls the counter at a fixed interval and
/// emits one snapshot per tick through the returned [`Ticks`] iterator. Snapshots carry
/// remaining-time and ETA estimates extrapolated from the average rate so far, assuming the
/// operation proceeds linearly.
///
/// The ticker stops on its own once a snapshot reaches the counter's total. Operations without
/// a known total never look complete, so their tickers run until cancelled through a
/// [`CancelToken`] or until the [`Ticks`] iterator is dropped.
pub struct Ticker<C>
where
    C: Counter,
{
    counter: C,
    total: Option<u64>,
    interval: Duration,
}

impl<C> Ticker<C>
where
    C: Counter,
{
    /// Returns a new `Ticker` polling `counter` every [`DEFAULT_TICK_INTERVAL`].
    pub fn new(counter: C) -> Self {
        Ticker {
            counter,
            total: None,
            interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Pins the total size, overriding whatever the counter reports.
    ///
    /// Without this the ticker asks the counter for its total on every tick, which picks up
    /// totals that only become known mid-operation.
    #[must_use]
    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Sets the interval between snapshots.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts the ticker, spawning its sampling thread.
    ///
    /// The returned [`Ticks`] iterator blocks on each snapshot. Emission applies back-pressure:
    /// the sampling thread does not move on until the previous snapshot has been received, so a
    /// slow consumer sees fewer snapshots instead of a growing backlog.
    ///
    /// # Errors
    ///
    /// Fails with [`HeadwayError::ZeroInterval`] if the interval has been set to zero, and with
    /// [`HeadwayError::IO`] if the sampling thread cannot be spawned.
    pub fn start(self) -> Result<Ticks>
    where
        C: Send + 'static,
    {
        if self.interval.is_zero() {
            return Err(HeadwayError::ZeroInterval);
        }

        let (ticks_tx, ticks_rx) = mpsc::sync_channel(0);
        let (cancel_tx, cancel_rx) = mpsc::channel();

        let worker = Worker {
            counter: self.counter,
            total: self.total,
            interval: self.interval,
            ticks: ticks_tx,
            cancel: cancel_rx,
            started: None,
        };

        debug!(
            "Starting ticker with interval {:?} and pinned total {:?}",
            self.interval, self.total
        );
        thread::Builder::new()
            .name("headway-ticker".into())
            .spawn(move || worker.run())?;

        Ok(Ticks {
            ticks: ticks_rx,
            cancel: CancelToken { cancel: cancel_tx },
        })
    }
}

/// The snapshots emitted by a started [`Ticker`], delivered in tick order.
///
/// Each call to [`next`](Iterator::next) blocks until the next snapshot arrives and returns
/// `None` once the ticker has stopped, whether because a snapshot reached the total or because
/// the ticker was cancelled. Dropping the iterator stops the ticker by the next tick.
pub struct Ticks {
    ticks: Receiver<Progress>,
    cancel: CancelToken,
}

impl Ticks {
    /// Returns a token that stops the ticker when [cancelled](CancelToken::cancel).
    ///
    /// Tokens can be cloned and moved freely, so any thread may cancel.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Iterator for Ticks {
    type Item = Progress;

    fn next(&mut self) -> Option<Progress> {
        self.ticks.recv().ok()
    }
}

/// Stops a running [`Ticker`] from any thread.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancel: Sender<()>,
}

impl CancelToken {
    /// Stops the ticker without waiting for its next tick.
    ///
    /// At most one more snapshot can still be delivered, if the sampler had already handed it
    /// off when the cancellation arrived. Cancelling a ticker that has already stopped does
    /// nothing.
    pub fn cancel(&self) {
        // an error here means the worker is already gone, which is what was asked for
        let _ = self.cancel.send(());
    }
}

struct Worker<C>
where
    C: Counter,
{
    counter: C,
    total: Option<u64>,
    interval: Duration,
    ticks: SyncSender<Progress>,
    cancel: Receiver<()>,
    started: Option<Instant>,
}

impl<C> Worker<C>
where
    C: Counter,
{
    fn run(mut self) {
        loop {
            if self.wait() {
                debug!("Ticker cancelled");
                return;
            }

            let progress = self.observe();
            trace!("Emitting {:?}", progress);

            if self.ticks.send(progress).is_err() {
                debug!("Ticks receiver dropped, stopping the ticker");
                return;
            }

            if progress.is_complete() {
                debug!("Operation complete at {} bytes", progress.bytes());
                return;
            }
        }
    }

    /// Waits one interval. Returns whether the ticker was cancelled during the wait.
    fn wait(&self) -> bool {
        match self.cancel.recv_timeout(self.interval) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                // every cancel token is gone, so only a plain wait is left
                thread::sleep(self.interval);
                false
            }
        }
    }

    fn observe(&mut self) -> Progress {
        let bytes = self.counter.bytes();
        let total = self.total.or_else(|| self.counter.total());

        match self.started {
            None => {
                if bytes > 0 {
                    // first observed movement; estimates start from the next tick
                    self.started = Some(Instant::now());
                }
                Progress::new(bytes, total)
            }
            Some(started) => match extrapolate(started, bytes, total) {
                Some((remaining, eta)) => Progress::with_estimate(bytes, total, remaining, eta),
                None => Progress::new(bytes, total),
            },
        }
    }
}

/// Projects the time left from the bytes moved since `started`, assuming the average rate so far
/// holds. Returns `None` when no meaningful estimate exists: the total is unknown or zero, no
/// bytes have been counted, or the projection does not fit a [`Duration`].
fn extrapolate(started: Instant, bytes: u64, total: Option<u64>) -> Option<(Duration, SystemTime)> {
    let total = total.filter(|&total| total > 0)?;
    if bytes == 0 {
        return None;
    }

    let ratio = bytes as f64 / total as f64;
    let elapsed = started.elapsed();
    let projected = Duration::try_from_secs_f64(elapsed.as_secs_f64() / ratio).ok()?;
    let remaining = projected.saturating_sub(elapsed);
    let eta = SystemTime::now().checked_add(remaining)?;

    Some((remaining, eta))
}

#[cfg(test)]
mod tests {
    use super::{Ticker, DEFAULT_TICK_INTERVAL};
    use crate::{counter::Counter, error::HeadwayError, progress::Progress, ByteCounter};
    use crossbeam_utils::atomic::AtomicCell;
    use std::{sync::Arc, thread, time::Duration};

    const TICK: Duration = Duration::from_millis(5);

    #[test]
    fn emits_until_the_total_is_reached() {
        let counter = ByteCounter::with_total(200);
        let ticks = Ticker::new(counter.clone())
            .interval(TICK)
            .start()
            .expect("failed to start ticker");

        let feeder = thread::spawn(move || loop {
            counter.add(50);
            if counter.progress().is_complete() {
                return;
            }
            thread::sleep(Duration::from_millis(25));
        });

        let events: Vec<Progress> = ticks.collect();
        feeder.join().expect("feeder thread panicked");

        assert!(events.len() >= 5);
        assert!(events
            .windows(2)
            .all(|pair| pair[0].bytes() <= pair[1].bytes()));

        let last = events.last().expect("no snapshots emitted");
        assert!(last.is_complete());
        assert_eq!(last.bytes(), 200);
    }

    #[test]
    fn unknown_total_runs_until_cancelled() {
        let counter = ByteCounter::new();
        let mut ticks = Ticker::new(counter.clone())
            .interval(TICK)
            .start()
            .expect("failed to start ticker");
        let cancel = ticks.cancel_token();

        let mut events = Vec::new();
        for progress in &mut ticks {
            counter.add(50);
            events.push(progress);
            if events.len() == 5 {
                cancel.cancel();
            }
            if events.len() >= 50 {
                break;
            }
        }

        // cancellation can race one last handed-off snapshot
        assert!(events.len() >= 5 && events.len() <= 6);
        for progress in &events {
            assert_eq!(progress.total(), None);
            assert_eq!(progress.percent(), None);
            assert!(progress.remaining().is_none());
            assert!(progress.eta().is_none());
            assert!(!progress.is_complete());
        }
    }

    #[test]
    fn estimates_follow_the_baseline_tick() {
        let counter = ByteCounter::with_total(200);
        counter.add(100);
        let mut ticks = Ticker::new(counter)
            .interval(Duration::from_millis(10))
            .start()
            .expect("failed to start ticker");
        let cancel = ticks.cancel_token();

        let first = ticks.next().expect("ticker stopped early");
        let second = ticks.next().expect("ticker stopped early");
        cancel.cancel();

        // the first tick only establishes the baseline
        assert_eq!(first.bytes(), 100);
        assert_eq!(first.percent(), Some(50.0));
        assert!(first.remaining().is_none());
        assert!(first.eta().is_none());

        // half done at a steady rate: the time left matches the time spent
        let remaining = second.remaining().expect("no estimate after the baseline");
        assert!(remaining >= Duration::from_millis(8));
        assert!(second.eta().is_some());
    }

    #[test]
    fn overshooting_the_total_still_completes() {
        let counter = ByteCounter::with_total(200);
        counter.add(250);
        let ticks = Ticker::new(counter)
            .interval(TICK)
            .start()
            .expect("failed to start ticker");

        let events: Vec<Progress> = ticks.collect();
        assert_eq!(events.len(), 1);

        let only = events[0];
        assert!(only.is_complete());
        assert_eq!(only.percent(), Some(125.0));
        assert!(only.remaining().is_none());
    }

    #[test]
    fn zero_total_completes_on_the_first_tick() {
        let counter = ByteCounter::with_total(0);
        let events: Vec<Progress> = Ticker::new(counter)
            .interval(TICK)
            .start()
            .expect("failed to start ticker")
            .collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bytes(), 0);
        assert!(events[0].is_complete());
        assert!(events[0].remaining().is_none());
    }

    #[test]
    fn idle_counters_tick_zeroes_indefinitely() {
        let counter = ByteCounter::with_total(200);
        let mut ticks = Ticker::new(counter)
            .interval(TICK)
            .start()
            .expect("failed to start ticker");
        let cancel = ticks.cancel_token();

        let mut events = Vec::new();
        for progress in &mut ticks {
            events.push(progress);
            if events.len() == 3 {
                cancel.cancel();
            }
            if events.len() >= 50 {
                break;
            }
        }

        assert!(events.len() >= 3 && events.len() <= 4);
        for progress in &events {
            assert_eq!(progress.bytes(), 0);
            assert_eq!(progress.percent(), Some(0.0));
            assert!(progress.remaining().is_none());
            assert!(!progress.is_complete());
        }
    }

    #[test]
    fn cancelling_before_the_first_tick_emits_nothing() {
        let counter = ByteCounter::with_total(200);
        let ticks = Ticker::new(counter)
            .interval(Duration::from_millis(50))
            .start()
            .expect("failed to start ticker");

        ticks.cancel_token().cancel();
        let events: Vec<Progress> = ticks.collect();

        assert!(events.is_empty());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let result = Ticker::new(ByteCounter::new())
            .interval(Duration::ZERO)
            .start();

        assert!(matches!(result, Err(HeadwayError::ZeroInterval)));
    }

    #[test]
    fn the_default_interval_is_a_second() {
        assert_eq!(DEFAULT_TICK_INTERVAL, Duration::from_secs(1));
    }

    #[derive(Clone, Default)]
    struct LateTotal {
        bytes: Arc<AtomicCell<u64>>,
        total: Arc<AtomicCell<Option<u64>>>,
    }

    impl Counter for LateTotal {
        fn bytes(&self) -> u64 {
            self.bytes.load()
        }

        fn total(&self) -> Option<u64> {
            self.total.load()
        }
    }

    #[test]
    fn totals_learned_late_are_picked_up() {
        let counter = LateTotal::default();
        let mut ticks = Ticker::new(counter.clone())
            .interval(TICK)
            .start()
            .expect("failed to start ticker");

        let first = ticks.next().expect("ticker stopped early");
        assert_eq!(first.total(), None);

        counter.total.store(Some(100));
        counter.bytes.store(100);

        let events: Vec<Progress> = ticks.collect();
        let last = events.last().expect("ticker stopped without completing");
        assert_eq!(last.total(), Some(100));
        assert!(last.is_complete());
    }

    #[test]
    fn pinned_totals_override_the_counter() {
        let counter = ByteCounter::with_total(400);
        counter.add(200);
        let ticks = Ticker::new(counter)
            .total(200)
            .interval(TICK)
            .start()
            .expect("failed to start ticker");

        let events: Vec<Progress> = ticks.collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].total(), Some(200));
        assert!(events[0].is_complete());
    }
}
