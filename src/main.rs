mod config;
mod filters;
mod log_util;
mod prompt_markup;
mod question_bank;
mod quiz_session;
mod scoring;
mod shuffle;
mod snapshot;
mod ui_renderer;
mod view_managers;

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dotenvy::dotenv;
use filters::{KindFilter, TopicFilter};
use log_util::log_debug;
use question_bank::{QuestionBank, QuestionKind};
use quiz_session::{Phase, QuizSession};
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use ui_renderer::UiRenderer;
use view_managers::{QuizManager, SetupManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppView {
    Setup,
    Quiz,
    Summary,
}

fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = App::new().run(terminal);
    ratatui::restore();
    result
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub(crate) running: bool,
    /// Quiz engine; the single source of truth for quiz state.
    pub(crate) session: QuizSession,
    /// Where the question bank came from, for the header.
    pub(crate) bank_source: String,
    /// Topic filters offered on the setup screen, `All` first.
    pub(crate) topic_options: Vec<TopicFilter>,
    pub(crate) topic_index: usize,
    /// Type filters offered on the setup screen, `All` first.
    pub(crate) kind_options: Vec<KindFilter>,
    pub(crate) kind_index: usize,
    /// Highlighted option of the current choice question.
    pub(crate) option_cursor: usize,
    /// Text typed for the current fill-gap question.
    pub(crate) answer_input: String,
    pub(crate) show_explanations: bool,
    /// Latest informational message.
    pub(crate) status: Option<String>,
    /// Any error encountered while loading configuration or questions.
    pub(crate) error: Option<String>,
}

impl App {
    /// Construct a new instance of [`App`] from configuration on disk.
    pub fn new() -> Self {
        let mut aggregated_error: Option<String> = None;

        if let Err(err) = config::initialize() {
            Self::push_error(
                &mut aggregated_error,
                format!("Configuration load failed: {:#}", err),
            );
        }
        let app_config = config::current();

        let (bank, bank_source) = match load_question_bank(&app_config) {
            Ok(loaded) => loaded,
            Err(err) => {
                Self::push_error(
                    &mut aggregated_error,
                    format!("Question bank rejected: {:#}", err),
                );
                let fallback = QuestionBank::builtin().unwrap_or_else(|err| {
                    Self::push_error(
                        &mut aggregated_error,
                        format!("Built-in bank rejected: {:#}", err),
                    );
                    QuestionBank::default()
                });
                (fallback, "built-in (fallback)".to_string())
            }
        };
        log_debug(&format!(
            "App: loaded {} question(s) from {}",
            bank.len(),
            bank_source
        ));

        let mut session = QuizSession::new(bank);
        session.set_random_mode(app_config.random_mode);

        let mut app = Self::from_session(session, app_config.show_explanations, bank_source);
        app.apply_initial_filters(&app_config.topic_filter, &app_config.kind_filter);
        app.error = aggregated_error;
        app
    }

    pub(crate) fn from_session(
        session: QuizSession,
        show_explanations: bool,
        bank_source: String,
    ) -> Self {
        let topic_options = std::iter::once(TopicFilter::All)
            .chain(
                session
                    .bank()
                    .topics()
                    .into_iter()
                    .map(|topic| TopicFilter::Topic(topic.to_string())),
            )
            .collect();
        let kind_options = std::iter::once(KindFilter::All)
            .chain(QuestionKind::ALL.into_iter().map(KindFilter::Kind))
            .collect();

        Self {
            running: false,
            session,
            bank_source,
            topic_options,
            topic_index: 0,
            kind_options,
            kind_index: 0,
            option_cursor: 0,
            answer_input: String::new(),
            show_explanations,
            status: None,
            error: None,
        }
    }

    /// Select the configured filters on the setup screen. Labels that do not match
    /// an existing option are offered as an extra entry; they may cover several
    /// topics or types.
    pub(crate) fn apply_initial_filters(&mut self, topic_label: &str, kind_label: &str) {
        let topic = TopicFilter::from_label(topic_label);
        let topic_index = match self.topic_options.iter().position(|option| {
            option.to_string().eq_ignore_ascii_case(&topic.to_string())
        }) {
            Some(index) => index,
            None => {
                self.topic_options.push(topic.clone());
                self.topic_options.len() - 1
            }
        };
        self.topic_index = topic_index;
        if let Some(filter) = self.topic_options.get(topic_index).cloned() {
            self.session.set_topic_filter(filter);
        }

        let kind = KindFilter::from_label(kind_label).unwrap_or_else(|| {
            log_debug(&format!(
                "App: unknown question type '{}' in configuration, showing all types",
                kind_label
            ));
            KindFilter::All
        });
        self.kind_index = match self.kind_options.iter().position(|option| *option == kind) {
            Some(index) => index,
            None => {
                self.kind_options.push(kind.clone());
                self.kind_options.len() - 1
            }
        };
        self.session.set_kind_filter(kind);
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        let tick_rate = Duration::from_millis(120);
        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(tick_rate)?;
        }
        Ok(())
    }

    /// Screen to draw, derived from the session phase.
    pub(crate) fn view(&self) -> AppView {
        match self.session.phase() {
            Phase::Idle | Phase::NoQuestionsAvailable => AppView::Setup,
            Phase::Active | Phase::AwaitingNext => AppView::Quiz,
            Phase::Complete => AppView::Summary,
        }
    }

    /// Dispatch rendering based on the active view.
    fn render(&mut self, frame: &mut Frame) {
        UiRenderer::new(self).render(frame);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self, tick_rate: Duration) -> Result<()> {
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub(crate) fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc)
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (KeyModifiers::CONTROL, KeyCode::Char('r') | KeyCode::Char('R')) => self.reset_quiz(),
            (KeyModifiers::NONE, KeyCode::Char('q')) if !self.is_typing_answer() => self.quit(),
            _ => match self.view() {
                AppView::Setup | AppView::Summary => SetupManager::new(self).handle_key(key),
                AppView::Quiz => QuizManager::new(self).handle_key(key),
            },
        }
    }

    /// True while an unanswered fill-gap question captures plain keystrokes.
    pub(crate) fn is_typing_answer(&self) -> bool {
        self.session.phase() == Phase::Active
            && self
                .session
                .current_question()
                .is_some_and(|question| question.kind == QuestionKind::FillGap)
    }

    pub(crate) fn reset_quiz(&mut self) {
        self.session.reset_quiz();
        self.reset_answer_input();
        self.status = Some("Quiz reset. Adjust filters and press Enter to start.".to_string());
    }

    /// Align the input widgets with the question now under the cursor.
    pub(crate) fn reset_answer_input(&mut self) {
        self.option_cursor = self.session.pending_selection().unwrap_or(0);
        self.answer_input.clear();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        log_debug("App: quit requested");
        self.running = false;
    }

    /// Append a message to an optional error slot.
    pub(crate) fn push_error(slot: &mut Option<String>, message: String) {
        if let Some(existing) = slot {
            existing.push_str(" | ");
            existing.push_str(&message);
        } else {
            *slot = Some(message);
        }
    }
}

fn load_question_bank(app_config: &config::AppConfig) -> Result<(QuestionBank, String)> {
    match app_config.question_bank_path() {
        Some(path) => {
            let bank = QuestionBank::load_from_path(&path)?;
            Ok((bank, path.display().to_string()))
        }
        None => Ok((QuestionBank::builtin()?, "built-in".to_string())),
    }
}
