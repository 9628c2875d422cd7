use crate::{
    filters::{KindFilter, TopicFilter, compute_working_set},
    log_util::log_debug,
    question_bank::{QuestionBank, QuestionRecord},
    scoring::{CompletionTier, SessionStats, Submission, evaluate},
    shuffle::shuffle,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::BTreeMap;

/// Coarse lifecycle of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session running; filters can be adjusted.
    Idle,
    /// The current question is waiting for an answer.
    Active,
    /// The current question has a locked-in answer and waits for an explicit advance.
    AwaitingNext,
    /// Every question in the working set has been stepped through.
    Complete,
    /// `start_quiz` found no question matching the filters.
    NoQuestionsAvailable,
}

impl Phase {
    /// True while a question is on screen.
    pub fn in_session(self) -> bool {
        matches!(self, Self::Active | Self::AwaitingNext)
    }
}

/// The locked-in answer for one working-set position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub submission: Submission,
    pub correct: bool,
    /// Index of the answered question in the bank.
    pub bank_index: usize,
}

/// Frozen result captured when the working set is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub accuracy_percent: u8,
    pub tier: CompletionTier,
    pub answered: u32,
    pub total_questions: usize,
}

/// Why an intent left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredIntent {
    NotInSession,
    AlreadyAnswered,
    AtFirstQuestion,
    NotAChoiceQuestion,
    OptionOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    Applied,
    Ignored(IgnoredIntent),
}

impl IgnoredIntent {
    pub fn describe(self) -> &'static str {
        match self {
            Self::NotInSession => "No quiz is running.",
            Self::AlreadyAnswered => "This question is already answered.",
            Self::AtFirstQuestion => "Already at the first question.",
            Self::NotAChoiceQuestion => "This question expects a typed answer.",
            Self::OptionOutOfRange => "That option does not exist for this question.",
        }
    }
}

impl IntentOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Owns every piece of mutable quiz state. Intents are synchronous and either
/// apply completely or are ignored without side effects.
#[derive(Debug)]
pub struct QuizSession<R = StdRng> {
    bank: QuestionBank,
    topic_filter: TopicFilter,
    kind_filter: KindFilter,
    /// Bank indices of the questions in play, in presentation order.
    working_set: Vec<usize>,
    cursor: usize,
    /// Keyed by working-set position.
    answers: BTreeMap<usize, AnswerRecord>,
    pending_selection: Option<usize>,
    phase: Phase,
    random_mode: bool,
    stats: SessionStats,
    completion: Option<CompletionSummary>,
    rng: R,
}

impl QuizSession<StdRng> {
    pub fn new(bank: QuestionBank) -> Self {
        Self::with_rng(bank, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuizSession<R> {
    /// Build an idle session whose working set is the whole bank.
    pub fn with_rng(bank: QuestionBank, rng: R) -> Self {
        let topic_filter = TopicFilter::All;
        let kind_filter = KindFilter::All;
        let working_set = compute_working_set(&bank, &topic_filter, &kind_filter);
        Self {
            bank,
            topic_filter,
            kind_filter,
            working_set,
            cursor: 0,
            answers: BTreeMap::new(),
            pending_selection: None,
            phase: Phase::Idle,
            random_mode: false,
            stats: SessionStats::default(),
            completion: None,
            rng,
        }
    }

    /// Begin (or restart) a session from the current filters.
    pub fn start_quiz(&mut self) -> IntentOutcome {
        self.clear_progress();
        self.recompute_working_set();
        if self.random_mode {
            shuffle(&mut self.working_set, &mut self.rng);
        }

        if self.working_set.is_empty() {
            self.phase = Phase::NoQuestionsAvailable;
            log_debug(&format!(
                "Quiz: no questions match topic '{}' and type '{}'",
                self.topic_filter, self.kind_filter
            ));
        } else {
            self.phase = Phase::Active;
            log_debug(&format!(
                "Quiz: started with {} question(s) (random: {})",
                self.working_set.len(),
                self.random_mode
            ));
        }
        IntentOutcome::Applied
    }

    /// Return to idle, keeping the filters and the random toggle.
    pub fn reset_quiz(&mut self) -> IntentOutcome {
        self.clear_progress();
        self.recompute_working_set();
        self.phase = Phase::Idle;
        log_debug("Quiz: reset to idle");
        IntentOutcome::Applied
    }

    /// Flip random ordering; it applies from the next `start_quiz`.
    pub fn toggle_random_mode(&mut self) -> IntentOutcome {
        self.random_mode = !self.random_mode;
        log_debug(&format!("Quiz: random mode {}", on_off(self.random_mode)));
        IntentOutcome::Applied
    }

    pub fn set_random_mode(&mut self, enabled: bool) {
        self.random_mode = enabled;
    }

    pub fn set_topic_filter(&mut self, filter: TopicFilter) -> IntentOutcome {
        log_debug(&format!("Quiz: topic filter set to '{}'", filter));
        self.topic_filter = filter;
        self.apply_filter_change()
    }

    pub fn set_kind_filter(&mut self, filter: KindFilter) -> IntentOutcome {
        log_debug(&format!("Quiz: type filter set to '{}'", filter));
        self.kind_filter = filter;
        self.apply_filter_change()
    }

    /// Record a pending option choice for the current choice question.
    pub fn select_option(&mut self, index: usize) -> IntentOutcome {
        if self.phase == Phase::AwaitingNext {
            return self.ignore("select_option", IgnoredIntent::AlreadyAnswered);
        }
        let Some(question) = self.active_question() else {
            return self.ignore("select_option", IgnoredIntent::NotInSession);
        };
        if !question.kind.is_choice() {
            return self.ignore("select_option", IgnoredIntent::NotAChoiceQuestion);
        }
        if index >= question.display_options().len() {
            return self.ignore("select_option", IgnoredIntent::OptionOutOfRange);
        }
        self.pending_selection = Some(index);
        IntentOutcome::Applied
    }

    /// Evaluate and lock in an answer for the current question. Choice questions
    /// use the pending selection; fill-gap questions use `text`.
    pub fn submit_answer(&mut self, text: Option<&str>) -> IntentOutcome {
        if self.phase == Phase::AwaitingNext {
            return self.ignore("submit_answer", IgnoredIntent::AlreadyAnswered);
        }
        if self.phase != Phase::Active {
            return self.ignore("submit_answer", IgnoredIntent::NotInSession);
        }
        let Some(&bank_index) = self.working_set.get(self.cursor) else {
            return self.ignore("submit_answer", IgnoredIntent::NotInSession);
        };
        if self.answers.contains_key(&self.cursor) {
            return self.ignore("submit_answer", IgnoredIntent::AlreadyAnswered);
        }
        let Some(question) = self.bank.get(bank_index) else {
            return self.ignore("submit_answer", IgnoredIntent::NotInSession);
        };

        let submission = if question.kind.is_choice() {
            Submission::Choice(self.pending_selection)
        } else {
            Submission::Text(text.unwrap_or_default().trim().to_string())
        };
        let correct = evaluate(question, &submission);
        self.stats.record(question, correct);
        log_debug(&format!(
            "Quiz: question {} (id {}) answered {}",
            self.cursor + 1,
            question.id,
            if correct { "correctly" } else { "incorrectly" }
        ));

        self.answers.insert(
            self.cursor,
            AnswerRecord {
                submission,
                correct,
                bank_index,
            },
        );
        self.phase = Phase::AwaitingNext;
        IntentOutcome::Applied
    }

    /// Advance to the next question, or finish the quiz from the last one.
    pub fn next_question(&mut self) -> IntentOutcome {
        if !self.phase.in_session() {
            return self.ignore("next_question", IgnoredIntent::NotInSession);
        }
        if self.cursor + 1 < self.working_set.len() {
            self.cursor += 1;
            self.pending_selection = None;
            self.phase = self.phase_for_cursor();
            log_debug(&format!(
                "Quiz: moved to question {} of {}",
                self.cursor + 1,
                self.working_set.len()
            ));
        } else {
            self.complete_quiz();
        }
        IntentOutcome::Applied
    }

    /// Step back one question. Answers stay locked in.
    pub fn previous_question(&mut self) -> IntentOutcome {
        if !self.phase.in_session() {
            return self.ignore("previous_question", IgnoredIntent::NotInSession);
        }
        if self.cursor == 0 {
            return self.ignore("previous_question", IgnoredIntent::AtFirstQuestion);
        }
        self.cursor -= 1;
        self.pending_selection = None;
        self.phase = self.phase_for_cursor();
        log_debug(&format!(
            "Quiz: moved back to question {} of {}",
            self.cursor + 1,
            self.working_set.len()
        ));
        IntentOutcome::Applied
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn working_set(&self) -> &[usize] {
        &self.working_set
    }

    pub fn topic_filter(&self) -> &TopicFilter {
        &self.topic_filter
    }

    pub fn kind_filter(&self) -> &KindFilter {
        &self.kind_filter
    }

    pub fn random_mode(&self) -> bool {
        self.random_mode
    }

    pub fn pending_selection(&self) -> Option<usize> {
        self.pending_selection
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn completion(&self) -> Option<CompletionSummary> {
        self.completion
    }

    #[cfg(test)]
    pub fn answers(&self) -> &BTreeMap<usize, AnswerRecord> {
        &self.answers
    }

    pub fn answer_at(&self, position: usize) -> Option<&AnswerRecord> {
        self.answers.get(&position)
    }

    /// The question under the cursor while a session is running.
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        if !self.phase.in_session() {
            return None;
        }
        self.working_set
            .get(self.cursor)
            .and_then(|&index| self.bank.get(index))
    }

    fn active_question(&self) -> Option<&QuestionRecord> {
        if self.phase == Phase::Active {
            self.current_question()
        } else {
            None
        }
    }

    fn phase_for_cursor(&self) -> Phase {
        if self.answers.contains_key(&self.cursor) {
            Phase::AwaitingNext
        } else {
            Phase::Active
        }
    }

    fn complete_quiz(&mut self) {
        let summary = CompletionSummary {
            accuracy_percent: self.stats.accuracy_percent,
            tier: CompletionTier::from_percent(self.stats.accuracy_percent),
            answered: self.stats.total_answered,
            total_questions: self.working_set.len(),
        };
        self.completion = Some(summary);
        self.pending_selection = None;
        self.phase = Phase::Complete;
        log_debug(&format!(
            "Quiz: complete with {}% accuracy ({} of {} answered)",
            summary.accuracy_percent, summary.answered, summary.total_questions
        ));
    }

    fn apply_filter_change(&mut self) -> IntentOutcome {
        if self.phase.in_session() {
            return self.start_quiz();
        }
        self.recompute_working_set();
        self.cursor = 0;
        if self.phase == Phase::NoQuestionsAvailable {
            self.phase = Phase::Idle;
        }
        IntentOutcome::Applied
    }

    fn recompute_working_set(&mut self) {
        self.working_set = compute_working_set(&self.bank, &self.topic_filter, &self.kind_filter);
    }

    fn clear_progress(&mut self) {
        self.cursor = 0;
        self.answers.clear();
        self.pending_selection = None;
        self.stats = SessionStats::default();
        self.completion = None;
    }

    fn ignore(&self, intent: &str, reason: IgnoredIntent) -> IntentOutcome {
        log_debug(&format!(
            "Quiz: ignored {} in phase {:?} ({:?})",
            intent, self.phase, reason
        ));
        IntentOutcome::Ignored(reason)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
