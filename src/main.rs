mod ui;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use typeheat::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    heatmap::ErrorAggregator,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scoring::{compare_to_bests, BestComparison},
    session::{Difficulty, ErrorCountPolicy, SessionConfig, SessionPhase, SessionResult},
    store::{MemoryStore, ProgressStore, SqliteStore},
    text::{resolve_text, CorpusTextProvider, CustomTextProvider, TextProvider},
    InputOutcome, SessionController,
};

const LOG_ENV: &str = "TYPEHEAT_LOG";

/// typing speed practice with live metrics, grading, and an error heatmap
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A typing speed trainer: timed sessions over graded texts, live wpm and accuracy, a composite score with letter grade, and a persistent heatmap of the keys you miss."
)]
pub struct Cli {
    /// difficulty of the practice text
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of seconds to run test, 0 runs until the text is typed
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// countdown before the session starts, 0 disables it
    #[clap(short = 'c', long)]
    countdown: Option<u32>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// how mistakes are counted towards the heatmap
    #[clap(long, value_enum)]
    error_policy: Option<ErrorCountPolicy>,

    /// print the error heatmap report and exit
    #[clap(long)]
    heatmap: bool,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Saved defaults overridden by whatever was passed on the command line
    fn apply(&self, mut config: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(secs) = self.seconds {
            config.duration_secs = (secs > 0).then_some(secs);
        }
        if let Some(countdown) = self.countdown {
            config.countdown_secs = countdown;
        }
        if let Some(prompt) = &self.prompt {
            config.custom_text = Some(prompt.clone());
        }
        if let Some(policy) = self.error_policy {
            config.error_policy = policy;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitType {
    Continue,
    Quit,
}

pub struct App {
    pub controller: SessionController,
    pub state: AppState,
    pub aggregator: ErrorAggregator,
    pub history: Vec<SessionResult>,
    pub comparison: Option<BestComparison>,
    /// one-line message shown on the typing screen
    pub notice: Option<String>,
    errors_dirty: bool,
    store: Box<dyn ProgressStore>,
    texts: Box<dyn TextProvider>,
}

impl App {
    pub fn new(
        session: SessionConfig,
        store: Box<dyn ProgressStore>,
        mut texts: Box<dyn TextProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let text = resolve_text(texts.as_mut(), session.difficulty);
        let controller = SessionController::new(session, clock, text);

        Self {
            controller,
            state: AppState::Typing,
            aggregator: store.load_aggregator(),
            history: store.load_results(),
            comparison: None,
            notice: None,
            errors_dirty: false,
            store,
            texts,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Box<dyn Error>> {
        let session = config.to_session_config()?;
        let texts: Box<dyn TextProvider> = match &config.custom_text {
            Some(text) => Box::new(CustomTextProvider::new(text.clone())),
            None => Box::new(CorpusTextProvider),
        };
        Ok(Self::new(
            session,
            open_store(),
            texts,
            Arc::new(SystemClock::new()),
        ))
    }

    /// Same text again
    pub fn retry(&mut self) {
        let text = self.controller.target_text();
        self.controller.restart(text);
        self.reset_view();
    }

    /// Fresh text from the provider
    pub fn new_text(&mut self) {
        let difficulty = self.controller.config().difficulty;
        let text = resolve_text(self.texts.as_mut(), difficulty);
        self.controller.restart(text);
        self.reset_view();
    }

    pub fn on_tick(&mut self) {
        if let Some(result) = self.controller.on_tick() {
            self.complete(result);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> ExitType {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ExitType::Quit,
            KeyCode::Char('c') if ctrl => return ExitType::Quit,
            KeyCode::Char('r') if ctrl => {
                self.new_text();
                return ExitType::Continue;
            }
            _ => {}
        }

        match self.state {
            AppState::Typing => self.handle_typing_key(key, ctrl),
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.new_text(),
                KeyCode::Char('h') => self.state = AppState::Heatmap,
                _ => {}
            },
            AppState::Heatmap => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = if self.controller.is_complete() {
                        AppState::Results
                    } else {
                        AppState::Typing
                    };
                }
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.new_text(),
                _ => {}
            },
        }
        ExitType::Continue
    }

    fn handle_typing_key(&mut self, key: KeyEvent, ctrl: bool) {
        match self.controller.phase() {
            SessionPhase::Idle => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.start(),
                KeyCode::Char('h') => self.state = AppState::Heatmap,
                _ => {}
            },
            SessionPhase::Countdown | SessionPhase::Complete => {}
            SessionPhase::Paused => match key.code {
                KeyCode::Tab => self.controller.resume(),
                KeyCode::Char('e') if ctrl => self.end(),
                _ => {}
            },
            SessionPhase::Running => {
                let outcome = match key.code {
                    KeyCode::Tab => {
                        self.controller.pause();
                        return;
                    }
                    KeyCode::Char('e') if ctrl => {
                        self.end();
                        return;
                    }
                    KeyCode::Backspace => self.controller.backspace(),
                    KeyCode::Enter => self.controller.push_char('\n'),
                    KeyCode::Char(c) if !ctrl => self.controller.push_char(c),
                    _ => return,
                };
                self.apply(outcome);
            }
        }
    }

    fn start(&mut self) {
        match self.controller.start() {
            Ok(()) => self.notice = None,
            Err(e) => {
                warn!(error = %e, "could not start session");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn end(&mut self) {
        if let Some(result) = self.controller.end() {
            self.complete(result);
        }
    }

    fn apply(&mut self, outcome: InputOutcome) {
        if self
            .aggregator
            .record_errors(&outcome.new_errors, Local::now().date_naive())
        {
            self.errors_dirty = true;
        }
        if let Some(result) = outcome.completed {
            self.complete(result);
        }
    }

    fn complete(&mut self, result: SessionResult) {
        self.comparison = Some(compare_to_bests(&result, &self.history));
        if let Err(e) = self.store.append_result(&result) {
            warn!(error = %e, "failed to save session result");
        }
        self.history.push(result);
        self.persist_errors();
        self.state = AppState::Results;
    }

    /// Writes the heatmap and history if they changed since the last save
    pub fn persist_errors(&mut self) {
        if !self.errors_dirty {
            return;
        }
        match self.store.save_aggregator(&self.aggregator) {
            Ok(()) => self.errors_dirty = false,
            Err(e) => warn!(error = %e, "failed to save error heatmap"),
        }
    }

    fn reset_view(&mut self) {
        self.state = AppState::Typing;
        self.comparison = None;
        self.notice = None;
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("controller", &self.controller)
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("errors_dirty", &self.errors_dirty)
            .finish()
    }
}

fn open_store() -> Box<dyn ProgressStore> {
    match SqliteStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "stats database unavailable, results will not be kept");
            Box::new(MemoryStore::new())
        }
    }
}

fn setup_logging() {
    let Some(log_dir) = AppDirs::log_dir() else {
        return;
    };
    let file_appender = tracing_appender::rolling::daily(log_dir, "typeheat.log");

    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let initialized = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .is_ok();

    if initialized {
        info!("logging initialized");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging();

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    debug!(?config, "resolved configuration");

    if let Err(e) = config.to_session_config() {
        Cli::command().error(ErrorKind::ValueValidation, e).exit();
    }

    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "saved configuration");
    }

    if cli.heatmap {
        let store = open_store();
        print!("{}", ui::heatmap::text_report(&store.load_aggregator()));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::from_config(&config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);
    app.persist_errors();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                let before = app.controller.phase();
                app.on_tick();
                let animating = matches!(
                    app.controller.phase(),
                    SessionPhase::Countdown | SessionPhase::Running
                );
                if animating || app.controller.phase() != before {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.handle_key(key) == ExitType::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;
    use typeheat::clock::ManualClock;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn session(duration_secs: Option<u64>, countdown_secs: u32) -> SessionConfig {
        SessionConfig {
            difficulty: Difficulty::Beginner,
            duration: duration_secs.map(Duration::from_secs),
            countdown_secs,
            error_policy: ErrorCountPolicy::FirstPerPosition,
        }
    }

    fn test_app(text: &str, duration_secs: Option<u64>, countdown: u32) -> (App, ManualClock) {
        let clock = ManualClock::new();
        let app = App::new(
            session(duration_secs, countdown),
            Box::new(MemoryStore::new()),
            Box::new(CustomTextProvider::new(text)),
            Arc::new(clock.clone()),
        );
        (app, clock)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            let code = if c == '\n' {
                KeyCode::Enter
            } else {
                KeyCode::Char(c)
            };
            app.handle_key(key(code));
        }
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typeheat"]);

        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.seconds, None);
        assert_eq!(cli.countdown, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.heatmap);
        assert!(!cli.save_config);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "typeheat",
            "-d",
            "code",
            "-s",
            "30",
            "--countdown",
            "0",
            "-p",
            "hello there",
            "--error-policy",
            "every-keystroke",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.difficulty, Difficulty::Code);
        assert_eq!(config.duration_secs, Some(30));
        assert_eq!(config.countdown_secs, 0);
        assert_eq!(config.custom_text.as_deref(), Some("hello there"));
        assert_eq!(config.error_policy, ErrorCountPolicy::EveryKeystroke);
    }

    #[test]
    fn test_cli_zero_seconds_is_untimed() {
        let cli = Cli::parse_from(["typeheat", "-s", "0"]);
        assert_eq!(cli.apply(Config::default()).duration_secs, None);
    }

    #[test]
    fn test_cli_rejects_unrecognized_difficulty() {
        assert!(Cli::try_parse_from(["typeheat", "-d", "unrecognized"]).is_err());
        assert!(Cli::try_parse_from(["typeheat", "-d", "nightmare"]).is_err());
    }

    #[test]
    fn test_full_session_flow() {
        let (mut app, clock) = test_app("cat", None, 0);
        assert_eq!(app.controller.phase(), SessionPhase::Idle);

        // typing is ignored before start
        type_str(&mut app, "x");
        assert!(app.controller.typed().is_empty());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller.phase(), SessionPhase::Running);

        clock.advance_secs(6);
        type_str(&mut app, "cbt");

        assert_eq!(app.state, AppState::Results);
        let result = app.controller.result().unwrap();
        assert_eq!(result.accuracy, 67.0);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.aggregator.heatmap().get('a'), 1);
        assert!(!app.errors_dirty);
        assert_eq!(app.store.load_results().len(), 1);
        assert_eq!(app.store.load_heatmap().get('a'), 1);
        assert!(app.comparison.unwrap().is_new_best);
    }

    #[test]
    fn test_countdown_then_typing() {
        let (mut app, clock) = test_app("ab", Some(30), 3);
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.controller.phase(), SessionPhase::Countdown);

        // keys during the countdown are dropped
        type_str(&mut app, "a");
        assert!(app.controller.typed().is_empty());

        clock.advance_secs(3);
        app.on_tick();
        assert_eq!(app.controller.phase(), SessionPhase::Running);

        type_str(&mut app, "a");
        assert_eq!(app.controller.typed(), &['a']);
    }

    #[test]
    fn test_pause_resume_and_manual_end() {
        let (mut app, clock) = test_app("hello world", None, 0);
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "hel");
        clock.advance_secs(12);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.controller.phase(), SessionPhase::Paused);
        type_str(&mut app, "l");
        assert_eq!(app.controller.typed().len(), 3);
        clock.advance_secs(100);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.controller.phase(), SessionPhase::Running);

        app.handle_key(ctrl('e'));
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.controller.result().unwrap().time, 12.0);
    }

    #[test]
    fn test_time_expiry_on_tick() {
        let (mut app, clock) = test_app("a long passage nobody finishes", Some(5), 0);
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "a lo");
        clock.advance_secs(6);
        app.on_tick();

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.controller.result().unwrap().time, 5.0);
    }

    #[test]
    fn test_key_after_deadline_shows_results() {
        let (mut app, clock) = test_app("a long passage nobody finishes", Some(5), 0);
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "a lo");
        clock.advance_secs(6);
        type_str(&mut app, "ng passage");

        assert_eq!(app.state, AppState::Results);
        let result = app.controller.result().unwrap();
        assert_eq!(result.time, 5.0);
        assert_eq!(result.correct_chars, 4);
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn test_retry_and_new_text_reset_session() {
        let (mut app, clock) = test_app("go", None, 0);
        app.handle_key(key(KeyCode::Enter));
        clock.advance_secs(1);
        type_str(&mut app, "go");
        assert_eq!(app.state, AppState::Results);

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.controller.phase(), SessionPhase::Idle);
        assert_eq!(app.controller.target_text(), "go");
        assert!(app.comparison.is_none());

        app.handle_key(ctrl('r'));
        assert_eq!(app.controller.phase(), SessionPhase::Idle);
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn test_heatmap_screen_navigation() {
        let (mut app, _clock) = test_app("abc", None, 0);
        app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(app.state, AppState::Heatmap);
        app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(app.state, AppState::Typing);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _clock) = test_app("abc", None, 0);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), ExitType::Quit);
        assert_eq!(app.handle_key(ctrl('c')), ExitType::Quit);
        assert_eq!(app.handle_key(key(KeyCode::Char('z'))), ExitType::Continue);
    }

    #[test]
    fn test_blank_prompt_uses_fallback_text() {
        let (app, _clock) = test_app("   ", None, 0);
        assert!(!app.controller.target().is_empty());
    }

    #[test]
    fn test_newline_typed_with_enter() {
        let (mut app, clock) = test_app("a\nb", None, 0);
        app.handle_key(key(KeyCode::Enter));
        clock.advance_secs(2);
        type_str(&mut app, "a\nb");
        assert_eq!(app.controller.result().unwrap().accuracy, 100.0);
    }

    #[test]
    fn test_ui_renders_every_screen() {
        let (mut app, clock) = test_app("the quick brown fox", None, 0);
        let idle = render(&app);
        assert!(idle.contains("the quick brown fox"));

        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "tha");
        assert!(!render(&app).trim().is_empty());

        app.handle_key(key(KeyCode::Tab));
        assert!(render(&app).contains("PAUSED"));
        app.handle_key(key(KeyCode::Tab));

        clock.advance_secs(4);
        app.on_tick();
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(ctrl('e'));
        let results = render(&app);
        assert!(results.contains("wpm"));
        assert!(results.contains("grade"));

        app.handle_key(key(KeyCode::Char('h')));
        assert!(render(&app).contains("Error heatmap"));
    }
}
