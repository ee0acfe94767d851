use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use reflex::runtime::{FixedTicker, Runner, TestEventSource, TestScheduler, TrialEvent};
use reflex::trial::{DelayRange, Phase, Trial, TrialOutcome};

// Headless integration using the internal runtime + Trial without a TTY.
// Drives a full trial through Runner/TestEventSource the same way the
// binary's event loop does: Signal events arm the stopwatch, space presses
// stop it.
fn drive(trial: &mut Trial, runner: &Runner<TestEventSource, FixedTicker>, max_steps: u32) {
    for _ in 0..max_steps {
        match runner.step() {
            TrialEvent::Signal(generation) => trial.on_signal(generation, Instant::now()),
            TrialEvent::Key(key) => {
                if key.code == KeyCode::Char(' ') {
                    trial.on_press(Instant::now());
                }
            }
            _ => {}
        }
        if trial.phase() == Phase::Result {
            break;
        }
    }
}

#[test]
fn headless_success_flow_completes() {
    let mut scheduler = TestScheduler::new();
    let mut trial = Trial::new(DelayRange::new(1500, 5000));
    trial.start(&mut scheduler);

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // Producer: the go signal fires, then the user reacts
    tx.send(TrialEvent::Signal(trial.generation())).unwrap();
    tx.send(TrialEvent::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();

    drive(&mut trial, &runner, 100);

    assert_eq!(trial.phase(), Phase::Result);
    match trial.outcome() {
        Some(TrialOutcome::Reaction(elapsed)) => {
            assert!(elapsed >= Duration::ZERO);
        }
        other => panic!("expected a measured reaction, got {:?}", other),
    }
}

#[test]
fn headless_false_start_flow_cancels_the_pending_signal() {
    let mut scheduler = TestScheduler::new();
    let mut trial = Trial::new(DelayRange::new(1500, 5000));
    trial.start(&mut scheduler);
    let generation = trial.generation();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // Producer: a press arrives before any signal
    tx.send(TrialEvent::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();

    drive(&mut trial, &runner, 100);

    assert_eq!(trial.phase(), Phase::Result);
    assert_eq!(trial.outcome(), Some(TrialOutcome::FalseStart));
    assert!(scheduler.requests[0].handle.is_cancelled());

    // A late delivery of the cancelled signal must change nothing
    tx.send(TrialEvent::Signal(generation)).unwrap();
    drive(&mut trial, &runner, 10);

    assert_eq!(trial.phase(), Phase::Result);
    assert_eq!(trial.outcome(), Some(TrialOutcome::FalseStart));
}

#[test]
fn headless_restart_runs_a_second_independent_trial() {
    let mut scheduler = TestScheduler::new();
    let mut trial = Trial::new(DelayRange::new(1500, 5000));

    // First trial ends in a false start
    trial.start(&mut scheduler);
    trial.on_press(Instant::now());
    assert_eq!(trial.outcome(), Some(TrialOutcome::FalseStart));

    // Second trial succeeds with its own schedule and onset
    trial.start(&mut scheduler);
    assert_eq!(trial.phase(), Phase::Waiting);
    assert_eq!(trial.outcome(), None);
    assert_eq!(scheduler.requests.len(), 2);

    let t0 = Instant::now();
    trial.on_signal(trial.generation(), t0);
    trial.on_press(t0 + Duration::from_millis(180));

    assert_eq!(
        trial.outcome(),
        Some(TrialOutcome::Reaction(Duration::from_millis(180)))
    );
}
