use crate::question_bank::{Difficulty, QuestionKind, QuestionRecord};
use std::collections::BTreeMap;

/// What the user handed in for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Selected option index for choice questions; `None` when nothing was selected.
    Choice(Option<usize>),
    /// Free text for fill-gap questions, stored as typed.
    Text(String),
}

/// Decide whether `submission` answers `question` correctly. A submission of the
/// wrong shape for the question kind counts as incorrect.
pub fn evaluate(question: &QuestionRecord, submission: &Submission) -> bool {
    match (question.kind, submission) {
        (QuestionKind::TrueFalse | QuestionKind::MultipleChoice, Submission::Choice(selected)) => {
            selected.is_some() && *selected == question.correct_index
        }
        (QuestionKind::FillGap, Submission::Text(text)) => question
            .accepted_answer
            .as_deref()
            .is_some_and(|accepted| normalize_answer(text) == normalize_answer(accepted)),
        _ => false,
    }
}

fn normalize_answer(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Correct/total pair for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTally {
    pub correct: u32,
    pub total: u32,
}

impl CategoryTally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_answered: u32,
    pub accuracy_percent: u8,
    pub current_streak: u32,
    pub best_streak: u32,
    pub by_topic: BTreeMap<String, CategoryTally>,
    pub by_difficulty: BTreeMap<Difficulty, CategoryTally>,
}

impl SessionStats {
    /// Fold one evaluated submission into the running totals.
    pub fn record(&mut self, question: &QuestionRecord, correct: bool) {
        self.total_answered += 1;
        if correct {
            self.correct_count += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.incorrect_count += 1;
            self.current_streak = 0;
        }
        self.accuracy_percent = accuracy_percent(self.correct_count, self.total_answered);

        self.by_topic
            .entry(question.topic.clone())
            .or_default()
            .record(correct);
        self.by_difficulty
            .entry(question.difficulty)
            .or_default()
            .record(correct);
    }
}

/// `round(correct / total * 100)`, or 0 before anything was answered.
pub fn accuracy_percent(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (f64::from(correct) / f64::from(total) * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

pub const MASTERY_THRESHOLD: u8 = 90;
pub const STRONG_THRESHOLD: u8 = 80;
pub const PASSING_THRESHOLD: u8 = 70;

/// Qualitative band of the final accuracy, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTier {
    Mastery,
    Strong,
    Passing,
    NeedsReview,
}

impl CompletionTier {
    pub fn from_percent(percent: u8) -> Self {
        if percent >= MASTERY_THRESHOLD {
            Self::Mastery
        } else if percent >= STRONG_THRESHOLD {
            Self::Strong
        } else if percent >= PASSING_THRESHOLD {
            Self::Passing
        } else {
            Self::NeedsReview
        }
    }

    /// 0 for the top tier through 3 for the lowest.
    pub fn index(self) -> usize {
        match self {
            Self::Mastery => 0,
            Self::Strong => 1,
            Self::Passing => 2,
            Self::NeedsReview => 3,
        }
    }
}
