pub mod config;
pub mod runtime;
pub mod trial;
pub mod ui;
pub mod util;

use crate::{
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{
        CrosstermEventSource, FixedTicker, Runner, ThreadScheduler, Ticker, TrialEvent,
        TrialEventSource,
    },
    trial::{DelayRange, Trial},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};

const TICK_RATE_MS: u64 = 100;

/// minimal reaction time tui with a randomized go signal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Arm a trial, wait out a randomized delay, and press as soon as the screen turns green. Premature presses are counted as false starts; valid reactions are reported in milliseconds to two decimal places."
)]
pub struct Cli {
    /// shortest wait before the go signal, in milliseconds
    #[clap(long, value_name = "MS")]
    min_delay: Option<u64>,

    /// longest wait before the go signal, in milliseconds
    #[clap(long, value_name = "MS")]
    max_delay: Option<u64>,

    /// ignore mouse presses and react with the keyboard only
    #[clap(long)]
    no_mouse: bool,
}

impl Cli {
    /// Fold command-line overrides into the stored preferences. Reports
    /// whether anything changed so the caller knows to persist.
    fn apply_to(&self, cfg: &mut Config) -> bool {
        let mut changed = false;

        if let Some(min) = self.min_delay {
            changed |= cfg.min_delay_ms != min;
            cfg.min_delay_ms = min;
        }
        if let Some(max) = self.max_delay {
            changed |= cfg.max_delay_ms != max;
            cfg.max_delay_ms = max;
        }
        if self.no_mouse {
            changed |= cfg.mouse;
            cfg.mouse = false;
        }

        changed
    }
}

/// Top-level application state shared between the event loop and the UI.
#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub trial: Trial,
    scheduler: ThreadScheduler,
}

impl App {
    pub fn new(config: Config, scheduler: ThreadScheduler) -> Self {
        let trial = Trial::new(DelayRange::new(config.min_delay_ms, config.max_delay_ms));
        Self {
            config,
            trial,
            scheduler,
        }
    }

    /// The start control. Guarded inside the trial, so pressing it
    /// mid-trial does nothing.
    pub fn start(&mut self) {
        self.trial.start(&mut self.scheduler);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    let overridden = cli.apply_to(&mut config);

    if !config.valid_delays() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::ValueValidation,
            "--min-delay must be at least 1 and no greater than --max-delay",
        )
        .exit();
    }

    if overridden {
        let _ = store.save(&config);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if config.mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let scheduler = ThreadScheduler::new(events.sender());
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(events, ticker);
    let mut app = App::new(config, scheduler);

    let res = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    if app.config.mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, E: TrialEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            TrialEvent::Tick | TrialEvent::Resize => {}
            TrialEvent::Signal(generation) => {
                app.trial.on_signal(generation, Instant::now());
            }
            TrialEvent::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                    app.trial.on_press(Instant::now());
                }
            }
            TrialEvent::Key(key) => match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Enter => app.start(),
                KeyCode::Char(' ') => app.trial.on_press(Instant::now()),
                _ => {}
            },
        }
    }

    Ok(())
}
