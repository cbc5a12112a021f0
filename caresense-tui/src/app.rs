//! Application state for the TUI.
//!
//! The screen flow is a small finite-state machine: Splash auto-advances to
//! Welcome on a timer, submission gates entry into Loading, and the single
//! in-flight analysis reports its one outcome over a channel polled by the
//! event loop. Loading accepts no user-initiated transitions.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use caresense_core::config::LlmConfig;
use caresense_core::{
    analyze, create_completion_client, AnalysisOutcome, Error, FileHistoryStore, Severity,
    SymptomInput,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// How long the splash screen shows before auto-advancing to Welcome.
pub const SPLASH_DURATION: Duration = Duration::from_millis(2500);

/// Fixed ordered duration buckets: label plus the day count sent upstream.
pub const DURATION_OPTIONS: [(&str, u32); 5] = [
    ("Less than a day", 0),
    ("1-3 days", 2),
    ("4-7 days", 5),
    ("1-2 weeks", 10),
    ("More than 2 weeks", 21),
];

/// Quick-add chips appended to the symptom text.
pub const SYMPTOM_CHIPS: [&str; 6] = [
    "Headache",
    "Fever",
    "Chest discomfort",
    "Fatigue",
    "Stress",
    "Sleep issues",
];

/// Current screen. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Splash,
    Welcome,
    Input,
    Loading,
    Result,
}

/// Which part of the input form has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Symptoms,
    Chips,
    Duration,
    Severity,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Symptoms => FormField::Chips,
            FormField::Chips => FormField::Duration,
            FormField::Duration => FormField::Severity,
            FormField::Severity => FormField::Symptoms,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Symptoms => FormField::Severity,
            FormField::Chips => FormField::Symptoms,
            FormField::Duration => FormField::Chips,
            FormField::Severity => FormField::Duration,
        }
    }
}

/// Main application state.
pub struct App {
    /// Current screen
    pub screen: Screen,
    /// LLM section from the config file, if any
    llm: Option<LlmConfig>,
    /// When the splash screen appeared
    splash_since: Instant,
    /// Symptom free-text being edited
    pub symptoms: String,
    /// Index into [`DURATION_OPTIONS`]
    pub duration_index: usize,
    /// Highlighted chip index
    pub chip_index: usize,
    /// Highlighted severity option
    pub severity_cursor: usize,
    /// Selected severity, toggled off by re-selecting
    pub severity: Option<Severity>,
    /// Focused form field
    pub focus: FormField,
    /// Inline validation message for the form
    pub form_error: Option<String>,
    /// Failure reason from the last analysis attempt
    pub error: Option<String>,
    /// Outcome shown on the Result screen
    pub outcome: Option<AnalysisOutcome>,
    /// Scroll offset for the Result screen
    pub scroll_offset: usize,
    /// Animation frame counter (increments each render)
    pub animation_frame: u64,
    /// Receiver for the single in-flight analysis, if any
    worker: Option<Receiver<caresense_core::Result<AnalysisOutcome>>>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App starting on the splash screen.
    pub fn new(llm: Option<LlmConfig>) -> Self {
        Self {
            screen: Screen::default(),
            llm,
            splash_since: Instant::now(),
            symptoms: String::new(),
            duration_index: 1, // default to "1-3 days"
            chip_index: 0,
            severity_cursor: 0,
            severity: None,
            focus: FormField::default(),
            form_error: None,
            error: None,
            outcome: None,
            scroll_offset: 0,
            animation_frame: 0,
            worker: None,
            should_quit: false,
        }
    }

    /// Advance timers and poll the analysis worker (call each frame).
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);

        if self.screen == Screen::Splash && self.splash_since.elapsed() >= SPLASH_DURATION {
            self.screen = Screen::Welcome;
        }

        if self.screen == Screen::Loading {
            let received = match &self.worker {
                Some(rx) => match rx.try_recv() {
                    Ok(outcome) => Some(outcome),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => Some(Err(Error::Llm(
                        "analysis worker exited unexpectedly".to_string(),
                    ))),
                },
                None => None,
            };
            if let Some(outcome) = received {
                self.worker = None;
                self.finish_analysis(outcome);
            }
        }
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Ctrl+C always quits, whatever the screen
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Splash => {}
            Screen::Welcome => self.handle_welcome_key(key),
            Screen::Input => self.handle_input_key(key),
            // An in-flight analysis runs to completion or failure
            Screen::Loading => {}
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_welcome_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.start(),
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_home(),
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Left => self.adjust_focused(-1),
            KeyCode::Right => self.adjust_focused(1),
            KeyCode::Backspace => {
                if self.focus == FormField::Symptoms {
                    self.symptoms.pop();
                    self.form_error = None;
                }
            }
            KeyCode::Char(' ') if self.focus == FormField::Chips => self.apply_chip(),
            KeyCode::Char(' ') if self.focus == FormField::Severity => self.toggle_severity(),
            KeyCode::Char(c) => {
                if self.focus == FormField::Symptoms {
                    self.symptoms.push(c);
                    self.form_error = None;
                }
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => self.go_home(),
            KeyCode::Enter | KeyCode::Char('n') => {
                // Start a fresh assessment, keeping the typed symptoms cleared
                self.clear_session();
                self.screen = Screen::Input;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::PageDown | KeyCode::Char('d') => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = 0,
            _ => {}
        }
    }

    /// Welcome -> Input on the explicit start action.
    fn start(&mut self) {
        self.clear_session();
        self.screen = Screen::Input;
    }

    /// Explicit home action: back to Welcome, clearing result and error.
    /// Splash and Loading never route here.
    fn go_home(&mut self) {
        self.clear_session();
        self.screen = Screen::Welcome;
    }

    fn clear_session(&mut self) {
        self.symptoms.clear();
        self.duration_index = 1;
        self.severity = None;
        self.severity_cursor = 0;
        self.chip_index = 0;
        self.focus = FormField::Symptoms;
        self.form_error = None;
        self.error = None;
        self.outcome = None;
        self.scroll_offset = 0;
    }

    /// Move the highlight within the focused option row.
    fn adjust_focused(&mut self, delta: i32) {
        match self.focus {
            FormField::Symptoms => {}
            FormField::Chips => {
                self.chip_index = step(self.chip_index, delta, SYMPTOM_CHIPS.len());
            }
            FormField::Duration => {
                self.duration_index = step(self.duration_index, delta, DURATION_OPTIONS.len());
            }
            FormField::Severity => {
                self.severity_cursor = step(self.severity_cursor, delta, Severity::ALL.len());
            }
        }
    }

    /// Append the highlighted chip to the symptom text, skipping duplicates.
    fn apply_chip(&mut self) {
        let chip = SYMPTOM_CHIPS[self.chip_index];
        if self
            .symptoms
            .to_lowercase()
            .contains(&chip.to_lowercase())
        {
            return;
        }
        if self.symptoms.trim().is_empty() {
            self.symptoms = chip.to_string();
        } else if self.symptoms.ends_with(' ') || self.symptoms.ends_with(',') {
            self.symptoms.push(' ');
            self.symptoms.push_str(chip);
        } else {
            self.symptoms.push_str(", ");
            self.symptoms.push_str(chip);
        }
        self.form_error = None;
    }

    /// Toggle the highlighted severity: selecting the active option clears it.
    fn toggle_severity(&mut self) {
        let highlighted = Severity::ALL[self.severity_cursor];
        self.severity = if self.severity == Some(highlighted) {
            None
        } else {
            Some(highlighted)
        };
    }

    /// The input as it would be submitted.
    pub fn current_input(&self) -> SymptomInput {
        SymptomInput {
            symptoms: self.symptoms.clone(),
            duration_days: DURATION_OPTIONS[self.duration_index].1,
            severity: self.severity,
        }
    }

    /// Input -> Loading on submit, gated on validation and configuration.
    ///
    /// Validation failures and configuration errors keep the Input screen
    /// active and never spawn a worker, so no call is attempted.
    fn submit(&mut self) {
        let input = self.current_input();
        if let Err(e) = input.validate() {
            self.form_error = Some(e.to_string());
            return;
        }
        self.form_error = None;

        let Some(llm) = self.llm.clone() else {
            self.error = Some(format!(
                "No AI provider configured. Add an [llm] section to {}",
                caresense_core::Config::config_path().display()
            ));
            return;
        };
        if let Err(e) = llm.validate() {
            self.error = Some(e.to_string());
            return;
        }
        self.error = None;

        let (tx, rx) = std::sync::mpsc::channel();
        spawn_analysis(input, llm, tx);
        self.enter_loading(rx);
    }

    /// Gate into Loading with the worker's receiver. At most one worker can
    /// exist because submit is unreachable while Loading.
    fn enter_loading(&mut self, rx: Receiver<caresense_core::Result<AnalysisOutcome>>) {
        self.worker = Some(rx);
        self.screen = Screen::Loading;
    }

    /// Loading -> Result on success, Loading -> Input on failure.
    fn finish_analysis(&mut self, outcome: caresense_core::Result<AnalysisOutcome>) {
        match outcome {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                self.scroll_offset = 0;
                self.error = None;
                self.screen = Screen::Result;
            }
            Err(e) => {
                tracing::error!(error = %e, "Analysis failed");
                self.error = Some(match e {
                    // Configuration problems are shown verbatim
                    Error::Config(msg) => msg,
                    other => format!(
                        "Sorry, we couldn't analyze your symptoms at this time. ({})",
                        other
                    ),
                });
                self.screen = Screen::Input;
            }
        }
    }
}

/// Run the blocking analysis on its own thread and report the one outcome.
fn spawn_analysis(
    input: SymptomInput,
    llm: LlmConfig,
    tx: Sender<caresense_core::Result<AnalysisOutcome>>,
) {
    std::thread::spawn(move || {
        let result = create_completion_client(&llm).and_then(|client| {
            let mut history = FileHistoryStore::default_location();
            analyze(&input, client.as_ref(), &mut history)
        });
        // The receiver is dropped when the user quit mid-flight; nothing to do
        let _ = tx.send(result);
    });
}

fn step(index: usize, delta: i32, len: usize) -> usize {
    let len = len as i32;
    ((index as i32 + delta).rem_euclid(len)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use caresense_core::{
        AnalysisResult, CopingItem, NextSteps, RiskLevel, RiskTrend,
    };

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn past_splash(app: &mut App) {
        app.splash_since = Instant::now() - SPLASH_DURATION;
        app.tick();
    }

    fn sample_outcome(level: RiskLevel) -> AnalysisOutcome {
        AnalysisOutcome {
            result: AnalysisResult {
                risk_level: level,
                explanation: "ok".to_string(),
                coping_and_wellness: vec![CopingItem {
                    title: "Rest".to_string(),
                    description: "Sleep early.".to_string(),
                }],
                daily_plan: None,
                risk_analysis: None,
                next_steps: NextSteps {
                    what_to_do_now: "a".to_string(),
                    when_to_seek_help: "b".to_string(),
                    emergency_guidance: None,
                },
                disclaimer: "d".to_string(),
                raw_response: None,
            },
            trend: RiskTrend::Unknown,
            prior: Vec::new(),
        }
    }

    #[test]
    fn splash_advances_to_welcome_after_delay() {
        let mut app = App::new(None);
        app.tick();
        assert_eq!(app.screen, Screen::Splash);
        past_splash(&mut app);
        assert_eq!(app.screen, Screen::Welcome);
    }

    #[test]
    fn splash_ignores_keys() {
        let mut app = App::new(None);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Splash);
    }

    #[test]
    fn welcome_start_enters_input() {
        let mut app = App::new(None);
        past_splash(&mut app);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Input);
    }

    #[test]
    fn typing_edits_symptoms_and_clears_validation() {
        let mut app = App::new(None);
        past_splash(&mut app);
        app.handle_key(key(KeyCode::Enter));
        app.form_error = Some("too short".to_string());
        for c in "fever".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.symptoms, "fever");
        assert!(app.form_error.is_none());
    }

    #[test]
    fn short_symptoms_block_submission_without_state_change() {
        let mut app = App::new(None);
        past_splash(&mut app);
        app.handle_key(key(KeyCode::Enter));
        app.symptoms = "hi".to_string();
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Input);
        assert!(app.form_error.is_some());
        assert!(app.worker.is_none());
    }

    #[test]
    fn missing_llm_config_fails_fast_without_loading() {
        let mut app = App::new(None);
        past_splash(&mut app);
        app.handle_key(key(KeyCode::Enter));
        app.symptoms = "mild headache for 2 days".to_string();
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Input);
        assert!(app.error.as_deref().unwrap_or("").contains("configured"));
        assert!(app.worker.is_none());
    }

    #[test]
    fn loading_ignores_user_keys() {
        let mut app = App::new(None);
        let (_tx, rx) = std::sync::mpsc::channel();
        app.enter_loading(rx);

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Loading);
    }

    #[test]
    fn worker_success_reaches_result_screen() {
        let mut app = App::new(None);
        let (tx, rx) = std::sync::mpsc::channel();
        app.enter_loading(rx);

        tx.send(Ok(sample_outcome(RiskLevel::Low))).unwrap();
        app.tick();

        assert_eq!(app.screen, Screen::Result);
        assert_eq!(
            app.outcome.as_ref().unwrap().result.risk_level,
            RiskLevel::Low
        );
    }

    #[test]
    fn worker_failure_returns_to_input_with_message() {
        let mut app = App::new(None);
        let (tx, rx) = std::sync::mpsc::channel();
        app.enter_loading(rx);

        tx.send(Err(Error::Llm("connection refused".to_string())))
            .unwrap();
        app.tick();

        assert_eq!(app.screen, Screen::Input);
        assert!(app.error.as_deref().unwrap().contains("connection refused"));
        assert!(app.outcome.is_none());
    }

    #[test]
    fn config_error_is_shown_verbatim() {
        let mut app = App::new(None);
        let (tx, rx) = std::sync::mpsc::channel();
        app.enter_loading(rx);

        tx.send(Err(Error::Config("llm.api_key is required".to_string())))
            .unwrap();
        app.tick();
        assert_eq!(app.error.as_deref(), Some("llm.api_key is required"));
    }

    #[test]
    fn home_from_result_clears_everything() {
        let mut app = App::new(None);
        app.screen = Screen::Result;
        app.outcome = Some(sample_outcome(RiskLevel::High));
        app.error = Some("old".to_string());

        app.handle_key(key(KeyCode::Esc));

        assert_eq!(app.screen, Screen::Welcome);
        assert!(app.outcome.is_none());
        assert!(app.error.is_none());
    }

    #[test]
    fn duration_and_severity_rows_cycle() {
        let mut app = App::new(None);
        app.screen = Screen::Input;
        app.focus = FormField::Duration;
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.duration_index, 0);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.duration_index, DURATION_OPTIONS.len() - 1);

        app.focus = FormField::Severity;
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.severity, Some(Severity::Mild));
        // Re-selecting the active option clears it
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.severity, None);
    }

    #[test]
    fn chips_append_without_duplicates() {
        let mut app = App::new(None);
        app.screen = Screen::Input;
        app.focus = FormField::Chips;
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.symptoms, "Headache");

        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.symptoms, "Headache");

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.symptoms, "Headache, Fever");
    }

    #[test]
    fn ctrl_c_quits_from_any_screen() {
        let mut app = App::new(None);
        let (_tx, rx) = std::sync::mpsc::channel();
        app.enter_loading(rx);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
