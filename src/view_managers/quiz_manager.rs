use crate::{
    App,
    log_util::log_debug,
    quiz_session::{IntentOutcome, Phase},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key handling while a question is on screen. Keys are translated into
/// session intents; the session decides whether they apply.
pub(crate) struct QuizManager<'a> {
    app: &'a mut App,
}

impl<'a> QuizManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if self.app.session.phase() == Phase::AwaitingNext {
            self.handle_answered_key(key);
        } else if self.app.is_typing_answer() {
            self.handle_text_key(key);
        } else {
            self.handle_choice_key(key);
        }
    }

    fn handle_answered_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Enter)
            | (KeyModifiers::NONE, KeyCode::Char(' '))
            | (KeyModifiers::NONE, KeyCode::Char('n'))
            | (KeyModifiers::NONE, KeyCode::Right)
            | (KeyModifiers::NONE, KeyCode::PageDown)
            | (KeyModifiers::NONE, KeyCode::Tab) => self.next_question(),
            (KeyModifiers::NONE, KeyCode::Char('p'))
            | (KeyModifiers::NONE, KeyCode::Left)
            | (KeyModifiers::NONE, KeyCode::PageUp)
            | (KeyModifiers::NONE, KeyCode::BackTab)
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => self.previous_question(),
            _ => {}
        }
    }

    fn handle_choice_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.next_option(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.previous_option(),
            (KeyModifiers::NONE, KeyCode::Char(digit @ '1'..='9')) => {
                let index = digit as usize - '1' as usize;
                self.select_option(index);
            }
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s')) => {
                self.submit_answer()
            }
            (KeyModifiers::NONE, KeyCode::PageDown | KeyCode::Tab | KeyCode::Char('n')) => {
                self.next_question()
            }
            (KeyModifiers::NONE, KeyCode::PageUp | KeyCode::BackTab | KeyCode::Char('p'))
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => self.previous_question(),
            _ => {}
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Enter) => self.submit_answer(),
            (_, KeyCode::Backspace) => {
                self.app.answer_input.pop();
            }
            (KeyModifiers::NONE, KeyCode::PageDown | KeyCode::Tab) => self.next_question(),
            (KeyModifiers::NONE, KeyCode::PageUp | KeyCode::BackTab)
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => self.previous_question(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(ch)) => {
                self.app.answer_input.push(ch);
            }
            _ => {}
        }
    }

    fn option_count(&self) -> usize {
        self.app
            .session
            .current_question()
            .map(|question| question.display_options().len())
            .unwrap_or(0)
    }

    fn next_option(&mut self) {
        let total = self.option_count();
        if total == 0 {
            return;
        }
        let next = match self.app.session.pending_selection() {
            Some(_) => (self.app.option_cursor + 1) % total,
            None => self.app.option_cursor.min(total - 1),
        };
        self.select_option(next);
    }

    fn previous_option(&mut self) {
        let total = self.option_count();
        if total == 0 {
            return;
        }
        let previous = match self.app.session.pending_selection() {
            Some(_) if self.app.option_cursor == 0 => total - 1,
            Some(_) => self.app.option_cursor - 1,
            None => self.app.option_cursor.min(total - 1),
        };
        self.select_option(previous);
    }

    fn select_option(&mut self, index: usize) {
        match self.app.session.select_option(index) {
            IntentOutcome::Applied => self.app.option_cursor = index,
            IntentOutcome::Ignored(reason) => self.app.status = Some(reason.describe().to_string()),
        }
    }

    fn submit_answer(&mut self) {
        let text = self.app.answer_input.clone();
        if !self.app.session.submit_answer(Some(&text)).is_applied() {
            return;
        }
        let correct = self
            .app
            .session
            .answer_at(self.app.session.cursor())
            .map(|answer| answer.correct)
            .unwrap_or(false);
        self.app.status = Some(if correct {
            "Correct! Press Enter to continue.".to_string()
        } else {
            "Not quite. Press Enter to continue.".to_string()
        });
    }

    fn next_question(&mut self) {
        if self.app.session.next_question().is_applied() {
            self.app.reset_answer_input();
            self.app.status = None;
            if self.app.session.phase() == Phase::Complete {
                log_debug("App: switched to summary view");
            }
        }
    }

    fn previous_question(&mut self) {
        if self.app.session.previous_question().is_applied() {
            self.app.reset_answer_input();
            self.app.status = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AppView,
        question_bank::tests::{choice, fill_gap, true_false},
        quiz_session::Phase,
        scoring::Submission,
        tests::{app_with, press},
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn arrow_keys_move_the_pending_selection() {
        let mut app = app_with(vec![choice(1, "objects", &["a", "b", "c"], 2)]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Down);
        assert_eq!(app.session.pending_selection(), Some(0));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.session.pending_selection(), Some(2));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.session.pending_selection(), Some(0));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.session.pending_selection(), Some(2));
        assert_eq!(app.option_cursor, 2);
    }

    #[test]
    fn digit_selects_and_enter_submits_then_advances() {
        let mut app = app_with(vec![
            choice(1, "objects", &["a", "b", "c"], 1),
            true_false(2, "objects", 0),
        ]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.session.phase(), Phase::AwaitingNext);
        assert!(app.session.answer_at(0).unwrap().correct);
        assert!(app.status.as_deref().unwrap().starts_with("Correct"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.cursor(), 1);
        assert_eq!(app.session.phase(), Phase::Active);
        assert_eq!(app.option_cursor, 0);
    }

    #[test]
    fn out_of_range_digit_is_ignored() {
        let mut app = app_with(vec![true_false(1, "objects", 0)]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('3'));

        assert_eq!(app.session.pending_selection(), None);
        assert_eq!(app.status.as_deref(), Some("That option does not exist for this question."));
    }

    #[test]
    fn fill_gap_collects_typed_text() {
        let mut app = app_with(vec![fill_gap(1, "access", "public")]);
        press(&mut app, KeyCode::Enter);

        for ch in " Publix".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Backspace);
        app.on_key_event(KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT));
        press(&mut app, KeyCode::Enter);

        let answer = app.session.answer_at(0).unwrap();
        assert!(answer.correct);
        assert_eq!(answer.submission, Submission::Text("PubliC".to_string()));
    }

    #[test]
    fn previous_restores_answered_question_and_blocks_resubmit() {
        let mut app = app_with(vec![
            true_false(1, "objects", 0),
            true_false(2, "objects", 1),
        ]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('p'));

        assert_eq!(app.session.cursor(), 0);
        assert_eq!(app.session.phase(), Phase::AwaitingNext);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.session.stats().total_answered, 1);
        assert_eq!(app.session.answer_at(0).unwrap().submission, Submission::Choice(Some(0)));
    }

    #[test]
    fn advancing_past_last_question_shows_summary() {
        let mut app = app_with(vec![true_false(1, "objects", 1)]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view(), AppView::Summary);
        assert_eq!(app.session.completion().unwrap().accuracy_percent, 100);
    }

    #[test]
    fn page_down_skips_unanswered_question() {
        let mut app = app_with(vec![true_false(1, "a", 0), true_false(2, "a", 0)]);
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::PageDown);

        assert_eq!(app.session.cursor(), 1);
        assert!(app.session.answers().is_empty());
    }
}
