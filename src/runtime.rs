use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TrialEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    /// The scheduled go signal fired, tagged with the generation it was
    /// armed for so stale deliveries can be told apart.
    Signal(u64),
}

/// Source of events for the app loop (keyboard, mouse, resize, signals)
pub trait TrialEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TrialEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Timer threads feed the same
/// channel through `sender()`, so presses and signals are totally ordered
/// by the single consumer.
pub struct CrosstermEventSource {
    tx: Sender<TrialEvent>,
    rx: Receiver<TrialEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let reader_tx = tx.clone();
        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if reader_tx.send(TrialEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Mouse(mouse)) => {
                    if reader_tx.send(TrialEvent::Mouse(mouse)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if reader_tx.send(TrialEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }

    /// A sender feeding this source's channel, for schedulers.
    pub fn sender(&self) -> Sender<TrialEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrialEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrialEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Cancellable handle to a scheduled go signal.
///
/// Cancellation is best-effort: the timer thread checks the flag after its
/// sleep, but a delivery already sitting in the channel cannot be recalled.
/// The trial's generation/phase guard is the authoritative backstop.
#[derive(Clone, Debug)]
pub struct SignalHandle {
    cancelled: Arc<AtomicBool>,
}

impl SignalHandle {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for SignalHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Schedules the delayed go signal for a trial.
pub trait Scheduler {
    /// Arrange for `TrialEvent::Signal(generation)` to be delivered to the
    /// event loop no earlier than `delay` from now.
    fn schedule(&mut self, delay: Duration, generation: u64) -> SignalHandle;
}

/// Production scheduler: a one-shot timer thread per schedule, feeding the
/// same channel the event reader uses.
#[derive(Clone, Debug)]
pub struct ThreadScheduler {
    tx: Sender<TrialEvent>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<TrialEvent>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, delay: Duration, generation: u64) -> SignalHandle {
        let handle = SignalHandle::new();
        let watcher = handle.clone();
        let tx = self.tx.clone();

        thread::spawn(move || {
            thread::sleep(delay);
            if !watcher.is_cancelled() {
                let _ = tx.send(TrialEvent::Signal(generation));
            }
        });

        handle
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TrialEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TrialEvent>) -> Self {
        Self { rx }
    }
}

impl TrialEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrialEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// A schedule request captured by `TestScheduler`.
#[derive(Clone, Debug)]
pub struct ScheduledSignal {
    pub delay: Duration,
    pub generation: u64,
    pub handle: SignalHandle,
}

/// Test scheduler that records requests instead of spawning timers; tests
/// fire the signal themselves and can observe cancellation on the handle.
#[derive(Clone, Debug, Default)]
pub struct TestScheduler {
    pub requests: Vec<ScheduledSignal>,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TestScheduler {
    fn schedule(&mut self, delay: Duration, generation: u64) -> SignalHandle {
        let handle = SignalHandle::new();
        self.requests.push(ScheduledSignal {
            delay,
            generation,
            handle: handle.clone(),
        });
        handle
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TrialEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TrialEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> TrialEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TrialEvent::Tick
            }
        }
    }
}
