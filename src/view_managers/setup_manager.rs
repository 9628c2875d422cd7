use crate::{App, AppView, config, log_util::log_debug, quiz_session::Phase};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key handling for the setup and completion screens: filter selection,
/// random toggle and starting a quiz.
pub(crate) struct SetupManager<'a> {
    app: &'a mut App,
}

impl<'a> SetupManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.next_topic(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.previous_topic(),
            (KeyModifiers::NONE, KeyCode::Right | KeyCode::Char('l')) => self.next_kind(),
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h')) => self.previous_kind(),
            (KeyModifiers::NONE, KeyCode::Char('r')) => self.toggle_random_mode(),
            (KeyModifiers::NONE, KeyCode::Char('x')) => self.toggle_explanations(),
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char('s')) => self.start_quiz(),
            (KeyModifiers::NONE, KeyCode::Char('m')) if self.app.view() == AppView::Summary => {
                self.app.reset_quiz()
            }
            _ => {}
        }
    }

    fn next_topic(&mut self) {
        let total = self.app.topic_options.len();
        if total == 0 {
            return;
        }
        self.app.topic_index = (self.app.topic_index + 1) % total;
        self.apply_topic();
    }

    fn previous_topic(&mut self) {
        let total = self.app.topic_options.len();
        if total == 0 {
            return;
        }
        if self.app.topic_index == 0 {
            self.app.topic_index = total - 1;
        } else {
            self.app.topic_index -= 1;
        }
        self.apply_topic();
    }

    fn next_kind(&mut self) {
        let total = self.app.kind_options.len();
        if total == 0 {
            return;
        }
        self.app.kind_index = (self.app.kind_index + 1) % total;
        self.apply_kind();
    }

    fn previous_kind(&mut self) {
        let total = self.app.kind_options.len();
        if total == 0 {
            return;
        }
        if self.app.kind_index == 0 {
            self.app.kind_index = total - 1;
        } else {
            self.app.kind_index -= 1;
        }
        self.apply_kind();
    }

    fn apply_topic(&mut self) {
        let Some(filter) = self.app.topic_options.get(self.app.topic_index).cloned() else {
            return;
        };
        self.app.session.set_topic_filter(filter);
        self.app.status = Some(format!(
            "{} question(s) match the current filters.",
            self.app.session.working_set().len()
        ));
    }

    fn apply_kind(&mut self) {
        let Some(filter) = self.app.kind_options.get(self.app.kind_index).cloned() else {
            return;
        };
        self.app.session.set_kind_filter(filter);
        self.app.status = Some(format!(
            "{} question(s) match the current filters.",
            self.app.session.working_set().len()
        ));
    }

    fn toggle_random_mode(&mut self) {
        self.app.session.toggle_random_mode();
        self.app.status = Some(format!(
            "Random order {}. Applies when the quiz starts.",
            if self.app.session.random_mode() {
                "on"
            } else {
                "off"
            }
        ));
    }

    fn toggle_explanations(&mut self) {
        let enabled = !self.app.show_explanations;
        self.app.show_explanations = enabled;
        match config::update(|config| config.show_explanations = enabled) {
            Ok(_) => {
                self.app.status = Some(format!(
                    "Explanations {}. Saved to {}",
                    if enabled { "shown" } else { "hidden" },
                    config::config_file_path().display()
                ));
                log_debug("App: configuration saved");
            }
            Err(err) => {
                App::push_error(
                    &mut self.app.error,
                    format!("Failed to save configuration: {}", err),
                );
                log_debug(&format!("App: failed to save configuration: {}", err));
            }
        }
    }

    fn start_quiz(&mut self) {
        self.app.session.start_quiz();
        self.app.reset_answer_input();
        self.app.status = if self.app.session.phase() == Phase::NoQuestionsAvailable {
            Some("No questions match these filters. Pick another topic or type.".to_string())
        } else {
            None
        };
    }
}
