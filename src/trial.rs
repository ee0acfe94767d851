use std::time::{Duration, Instant};

use rand::Rng;

use crate::runtime::{Scheduler, SignalHandle};

/// Phase of a single reaction trial. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    Waiting,
    Signal,
    Result,
}

/// How a finished trial ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Pressed while still waiting, before the go signal appeared.
    FalseStart,
    /// Valid reaction, measured from signal onset to the press.
    Reaction(Duration),
}

/// Inclusive bounds, in milliseconds, for the randomized wait before the
/// go signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    fn sample(&self) -> Duration {
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_ms: 1500,
            max_ms: 5000,
        }
    }
}

/// A single stimulus/response trial driven by the event loop.
///
/// The trial never schedules or receives events itself; the loop calls
/// `start`, `on_signal` and `on_press` and the guards here decide whether
/// the event is acted on. Off-phase events are silent no-ops.
#[derive(Debug)]
pub struct Trial {
    phase: Phase,
    delay: DelayRange,
    generation: u64,
    pending: Option<SignalHandle>,
    onset: Option<Instant>,
    outcome: Option<TrialOutcome>,
}

impl Trial {
    pub fn new(delay: DelayRange) -> Self {
        Self {
            phase: Phase::Idle,
            delay,
            generation: 0,
            pending: None,
            onset: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<TrialOutcome> {
        self.outcome
    }

    /// Generation the current/most recent schedule was armed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Arm a new trial. No-op unless idle or showing a result, so a
    /// re-entrant start can never re-arm a trial that is mid-flight.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
        if self.phase != Phase::Idle && self.phase != Phase::Result {
            return;
        }

        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }

        self.generation += 1;
        self.outcome = None;
        self.onset = None;
        self.pending = Some(scheduler.schedule(self.delay.sample(), self.generation));
        self.phase = Phase::Waiting;
    }

    /// The scheduled go signal fired. Only honored while waiting and only
    /// for the generation it was armed for; a signal from a cancelled or
    /// superseded schedule falls through here even if its timer thread
    /// managed to deliver it.
    pub fn on_signal(&mut self, generation: u64, now: Instant) {
        if self.phase != Phase::Waiting || generation != self.generation {
            return;
        }

        self.pending = None;
        self.onset = Some(now);
        self.phase = Phase::Signal;
    }

    /// A stimulus press arrived (space bar or primary mouse button).
    pub fn on_press(&mut self, now: Instant) {
        match self.phase {
            Phase::Waiting => {
                if let Some(handle) = self.pending.take() {
                    handle.cancel();
                }
                self.outcome = Some(TrialOutcome::FalseStart);
                self.phase = Phase::Result;
            }
            Phase::Signal => {
                let onset = match self.onset.take() {
                    Some(onset) => onset,
                    None => return,
                };
                // Normally nothing is pending once past Waiting.
                if let Some(handle) = self.pending.take() {
                    handle.cancel();
                }
                self.outcome = Some(TrialOutcome::Reaction(now.saturating_duration_since(onset)));
                self.phase = Phase::Result;
            }
            Phase::Idle | Phase::Result => {}
        }
    }
}
