pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod content;
pub mod effects;
pub mod engine;
pub mod history;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod util;
pub mod voice;

use crate::{
    app_dirs::AppDirs,
    audio::TerminalAudio,
    config::{Config, ConfigStore, Difficulty, FileConfigStore},
    content::{BuiltinContent, FocusContent},
    effects::{Dispatcher, UiObserver},
    engine::Engine,
    history::{record_completion, HistoryDb, HistoryTotals, WorkoutRecord},
    runtime::{CoachEvent, CoachEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::SessionState,
    util::format_time,
    voice::CoachVoice,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
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
    sync::Arc,
    time::Duration,
};
use tracing::warn;

/// terminal boxing interval trainer with round timers and workout history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal boxing interval trainer: round/break timers with sound cues, a coach line, per-round focus drills, and a persistent workout history with calorie estimates."
)]
pub struct Cli {
    /// number of rounds
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// round length in seconds
    #[clap(short = 'l', long)]
    round_length: Option<u32>,

    /// break length in seconds
    #[clap(short = 'b', long)]
    break_length: Option<u32>,

    /// workout difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// workout focus category (punching, footwork, defense, conditioning)
    #[clap(short = 't', long)]
    workout_type: Option<String>,

    /// skip the get-ready countdown before round 1
    #[clap(long)]
    no_countdown: bool,

    /// disable background music
    #[clap(long)]
    no_music: bool,

    /// disable the coach voice line
    #[clap(long)]
    no_voice: bool,

    /// body weight in kg for the calorie estimate
    #[clap(short = 'w', long)]
    weight_kg: Option<f64>,

    /// print workout history and exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    /// Layer the command-line overrides on top of the stored configuration.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(rounds) = self.rounds {
            config.workout.rounds = rounds.max(1);
        }
        if let Some(secs) = self.round_length {
            config.workout.round_length_secs = secs.max(1);
        }
        if let Some(secs) = self.break_length {
            config.workout.break_length_secs = secs.max(1);
        }
        if let Some(difficulty) = self.difficulty {
            config.workout.difficulty = difficulty;
        }
        if let Some(ty) = &self.workout_type {
            config.workout.workout_type = ty.to_lowercase();
        }
        if self.no_countdown {
            config.workout.countdown = false;
        }
        if self.no_music {
            config.settings.music = false;
        }
        if self.no_voice {
            config.settings.voice = false;
        }
        if let Some(kg) = self.weight_kg {
            if kg > 0.0 {
                config.settings.weight_kg = kg;
            }
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Workout,
    Summary,
    History,
}

/// UI-side observer fed by the effect dispatcher. Holds the latest state
/// snapshot and the focus card for the workout screen.
#[derive(Debug, Default)]
pub struct ViewState {
    pub focus: Option<FocusContent>,
    pub snapshot: Option<SessionState>,
}

impl UiObserver for ViewState {
    fn on_state_change(&mut self, snapshot: &SessionState) {
        self.snapshot = Some(snapshot.clone());
    }

    fn on_focus_change(&mut self, focus: &FocusContent) {
        self.focus = Some(focus.clone());
    }
}

pub struct App {
    pub engine: Engine<BuiltinContent>,
    pub dispatcher: Dispatcher<TerminalAudio, CoachVoice, ViewState>,
    pub screen: Screen,
    pub last_record: Option<WorkoutRecord>,
    pub records: Vec<WorkoutRecord>,
    pub totals: HistoryTotals,
    pub history: Option<HistoryDb>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let voice = CoachVoice::new(
            config.settings.voice,
            config.settings.voice_countdown,
            config.settings.voice_encouragement,
        );
        let dispatcher = Dispatcher::new(TerminalAudio::new(), voice, ViewState::default());
        let engine = Engine::new(config.workout, config.settings, BuiltinContent::new());

        Self {
            engine,
            dispatcher,
            screen: Screen::Setup,
            last_record: None,
            records: Vec::new(),
            totals: HistoryTotals::default(),
            history: None,
        }
    }

    /// Start a session from the setup screen. Returns true when the tick
    /// clock should run.
    pub fn begin_workout(&mut self) -> bool {
        match self.engine.start() {
            Ok(effects) => {
                let snapshot = self.engine.state().clone();
                let _ = self.dispatcher.dispatch(&effects, &snapshot);
                self.screen = Screen::Workout;
                true
            }
            Err(err) => {
                warn!(%err, "start rejected");
                false
            }
        }
    }

    /// Advance the session one second. Returns true once the engine has
    /// cancelled the timer; the caller must stop delivering ticks.
    pub fn on_tick(&mut self) -> bool {
        self.dispatcher.voice.tick();
        match self.engine.tick() {
            Ok(effects) => {
                let snapshot = self.engine.state().clone();
                let outcome = self.dispatcher.dispatch(&effects, &snapshot);
                if outcome.timer_cancelled {
                    self.finish_workout();
                    return true;
                }
                false
            }
            Err(err) => {
                warn!(%err, "tick rejected");
                true
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        let result = if self.engine.state().is_paused {
            self.engine.resume()
        } else {
            self.engine.pause()
        };
        match result {
            Ok(effects) => {
                let snapshot = self.engine.state().clone();
                let _ = self.dispatcher.dispatch(&effects, &snapshot);
            }
            Err(err) => warn!(%err, "pause toggle rejected"),
        }
    }

    pub fn end_workout(&mut self) {
        match self.engine.end_early() {
            Ok(effects) => {
                let snapshot = self.engine.state().clone();
                let _ = self.dispatcher.dispatch(&effects, &snapshot);
                self.finish_workout();
            }
            Err(err) => warn!(%err, "end rejected"),
        }
    }

    /// Record the completed session and move to the summary screen.
    fn finish_workout(&mut self) {
        let record = record_completion(
            self.engine.state(),
            self.engine.config(),
            self.engine.settings().weight_kg,
        );

        if let Some(db) = &self.history {
            if let Err(err) = db.append(&record) {
                warn!(%err, "failed to store workout record");
            }
            if let Some(path) = AppDirs::log_csv_path() {
                if let Err(err) = history::append_csv_log(&path, &record) {
                    warn!(%err, "failed to append csv log");
                }
            }
        }

        self.last_record = Some(record);
        self.dispatcher.voice.clear();
        self.screen = Screen::Summary;
    }

    /// Return to setup and start a fresh session with the same parameters.
    pub fn restart_workout(&mut self) -> bool {
        if let Err(err) = self.engine.reset() {
            warn!(%err, "reset rejected");
            return false;
        }
        self.dispatcher.ui.focus = None;
        self.begin_workout()
    }

    pub fn open_history(&mut self) {
        if let Some(db) = &self.history {
            match db.list() {
                Ok(records) => self.records = records,
                Err(err) => warn!(%err, "failed to load history"),
            }
            match db.totals() {
                Ok(totals) => self.totals = totals,
                Err(err) => warn!(%err, "failed to load history totals"),
            }
        }
        self.screen = Screen::History;
    }
}

fn init_tracing() {
    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let Some(path) = AppDirs::trace_log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    // The TUI owns stdout, so traces go to a file
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    }
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    let records = db.list()?;
    if records.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    let totals = db.totals()?;
    println!(
        "{} workouts / {} rounds / {} active / {} kcal",
        totals.workouts,
        totals.rounds_completed,
        format_time(totals.total_duration_seconds),
        totals.calories_burned,
    );
    println!();
    for record in records {
        println!(
            "{}  {:<14} {:<12} {}/{} rounds  {}  {} kcal",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.workout_type,
            record.difficulty,
            record.rounds_completed,
            record.rounds,
            format_time(record.total_duration_seconds),
            record.calories_burned,
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    if cli.history {
        return print_history();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if let Err(err) = store.save(&config) {
        warn!(%err, "failed to persist configuration");
    }

    let mut app = App::new(config);
    match HistoryDb::new() {
        Ok(db) => app.history = Some(db),
        Err(err) => warn!(%err, "history database unavailable"),
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_secs(1)),
    );
    let result = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: CoachEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            CoachEvent::Tick => {
                if app.on_tick() {
                    runner.set_ticking(false);
                }
            }
            CoachEvent::Resize => {}
            CoachEvent::Key(key) => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                match (app.screen, key.code) {
                    (_, KeyCode::Esc) => {
                        if app.screen == Screen::Workout {
                            app.end_workout();
                            runner.set_ticking(false);
                        }
                        break;
                    }
                    (Screen::Setup, KeyCode::Char('s')) | (Screen::Setup, KeyCode::Enter) => {
                        if app.begin_workout() {
                            runner.set_ticking(true);
                        }
                    }
                    (Screen::Setup, KeyCode::Char('h')) => app.open_history(),
                    (Screen::Workout, KeyCode::Char('p'))
                    | (Screen::Workout, KeyCode::Char(' ')) => app.toggle_pause(),
                    (Screen::Workout, KeyCode::Char('e')) => {
                        app.end_workout();
                        runner.set_ticking(false);
                    }
                    (Screen::Summary, KeyCode::Char('r')) => {
                        if app.restart_workout() {
                            runner.set_ticking(true);
                        }
                    }
                    (Screen::Summary, KeyCode::Char('h')) => app.open_history(),
                    (Screen::History, KeyCode::Char('b')) => {
                        app.screen = if app.last_record.is_some() {
                            Screen::Summary
                        } else {
                            Screen::Setup
                        };
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
