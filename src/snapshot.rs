use crate::{
    filters::{KindFilter, TopicFilter},
    question_bank::{QuestionKind, QuestionRecord},
    quiz_session::{AnswerRecord, CompletionSummary, Phase, QuizSession},
    scoring::{SessionStats, Submission},
};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    /// Pending selection, not yet submitted.
    Selected,
    /// The right answer, revealed after submission.
    Correct,
    /// The submitted wrong answer.
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: char,
    pub text: String,
    pub state: OptionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerInput {
    Choices(Vec<OptionView>),
    /// Fill-gap text entry; `submitted` holds the locked-in text once answered.
    FreeText { submitted: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub explanation: Option<String>,
    /// Expected text for fill-gap questions.
    pub accepted_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: u32,
    pub kind: QuestionKind,
    pub topic: String,
    pub difficulty: &'static str,
    /// Untouched prompt text; markup is rendered by the view.
    pub prompt: String,
    pub input: AnswerInput,
    pub feedback: Option<Feedback>,
}

/// Render-ready copy of everything the view needs after an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    /// 1-based position of the current question, 0 outside a session.
    pub position: usize,
    pub total: usize,
    pub question: Option<QuestionView>,
    pub stats: SessionStats,
    pub completion: Option<CompletionSummary>,
    pub progress_percent: u8,
    pub random_mode: bool,
    pub topic_filter: TopicFilter,
    pub kind_filter: KindFilter,
    pub can_go_back: bool,
    pub can_submit: bool,
    pub can_advance: bool,
    /// Advancing from here finishes the quiz.
    pub advance_completes: bool,
}

impl<R: Rng> QuizSession<R> {
    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = self.phase();
        let total = self.working_set().len();
        let in_session = phase.in_session();
        let answer = if in_session {
            self.answer_at(self.cursor())
        } else {
            None
        };
        let question = self
            .current_question()
            .map(|record| question_view(record, answer, self.pending_selection()));

        SessionSnapshot {
            phase,
            position: if in_session { self.cursor() + 1 } else { 0 },
            total,
            question,
            stats: self.stats().clone(),
            completion: self.completion(),
            progress_percent: progress_percent(phase, self.cursor(), answer.is_some(), total),
            random_mode: self.random_mode(),
            topic_filter: self.topic_filter().clone(),
            kind_filter: self.kind_filter().clone(),
            can_go_back: in_session && self.cursor() > 0,
            can_submit: phase == Phase::Active,
            can_advance: in_session,
            advance_completes: in_session && self.cursor() + 1 == total,
        }
    }
}

fn question_view(
    record: &QuestionRecord,
    answer: Option<&AnswerRecord>,
    pending: Option<usize>,
) -> QuestionView {
    let input = match record.kind {
        QuestionKind::TrueFalse | QuestionKind::MultipleChoice => {
            AnswerInput::Choices(option_views(record, answer, pending))
        }
        QuestionKind::FillGap => AnswerInput::FreeText {
            submitted: answer.and_then(|answer| match &answer.submission {
                Submission::Text(text) => Some(text.clone()),
                Submission::Choice(_) => None,
            }),
        },
    };
    let feedback = answer.map(|answer| Feedback {
        correct: answer.correct,
        explanation: record.explanation.clone(),
        accepted_answer: match record.kind {
            QuestionKind::FillGap => record.accepted_answer.clone(),
            _ => None,
        },
    });

    QuestionView {
        id: record.id,
        kind: record.kind,
        topic: record.topic.clone(),
        difficulty: record.difficulty.label(),
        prompt: record.prompt.clone(),
        input,
        feedback,
    }
}

fn option_views(
    record: &QuestionRecord,
    answer: Option<&AnswerRecord>,
    pending: Option<usize>,
) -> Vec<OptionView> {
    let submitted = answer.and_then(|answer| match answer.submission {
        Submission::Choice(selected) => selected,
        Submission::Text(_) => None,
    });

    record
        .display_options()
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let state = if answer.is_some() {
                if Some(index) == record.correct_index {
                    OptionState::Correct
                } else if Some(index) == submitted {
                    OptionState::Incorrect
                } else {
                    OptionState::Neutral
                }
            } else if Some(index) == pending {
                OptionState::Selected
            } else {
                OptionState::Neutral
            };
            OptionView {
                label: option_label(record.kind, index),
                text: text.to_string(),
                state,
            }
        })
        .collect()
}

fn option_label(kind: QuestionKind, index: usize) -> char {
    match (kind, index) {
        (QuestionKind::TrueFalse, 0) => 'T',
        (QuestionKind::TrueFalse, _) => 'F',
        _ => (b'A' + (index % 26) as u8) as char,
    }
}

fn progress_percent(phase: Phase, cursor: usize, answered: bool, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    match phase {
        Phase::Active | Phase::AwaitingNext => {
            let done = cursor + usize::from(answered);
            ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
        }
        Phase::Complete => 100,
        Phase::Idle | Phase::NoQuestionsAvailable => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        question_bank::tests::{choice, fill_gap, true_false},
        quiz_session::tests::session_with,
        scoring::CompletionTier,
    };

    #[test]
    fn idle_snapshot_reports_filtered_total_without_question() {
        let session = session_with(vec![true_false(1, "a", 0), true_false(2, "b", 1)]);

        let snapshot = session.snapshot();

        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.position, 0);
        assert_eq!(snapshot.total, 2);
        assert!(snapshot.question.is_none());
        assert_eq!(snapshot.progress_percent, 0);
        assert!(!snapshot.can_submit);
    }

    #[test]
    fn active_choice_question_shows_pending_selection() {
        let mut session = session_with(vec![
            choice(1, "objects", &["one", "two", "three"], 2),
            true_false(2, "objects", 0),
        ]);
        session.start_quiz();
        session.select_option(1);

        let snapshot = session.snapshot();
        let question = snapshot.question.unwrap();

        assert_eq!(snapshot.position, 1);
        assert_eq!(snapshot.total, 2);
        assert!(snapshot.can_submit);
        assert!(!snapshot.can_go_back);
        assert!(!snapshot.advance_completes);
        assert_eq!(question.difficulty, "Medium");
        assert!(question.feedback.is_none());
        let AnswerInput::Choices(options) = question.input else {
            panic!("expected choice input");
        };
        let labels: Vec<char> = options.iter().map(|option| option.label).collect();
        assert_eq!(labels, vec!['A', 'B', 'C']);
        assert_eq!(options[1].state, OptionState::Selected);
        assert_eq!(options[0].state, OptionState::Neutral);
    }

    #[test]
    fn answered_choice_question_marks_correct_and_incorrect_options() {
        let mut session = session_with(vec![choice(1, "objects", &["one", "two", "three"], 2)]);
        session.start_quiz();
        session.select_option(0);
        session.submit_answer(None);

        let snapshot = session.snapshot();
        let question = snapshot.question.unwrap();

        assert_eq!(snapshot.phase, Phase::AwaitingNext);
        assert!(snapshot.advance_completes);
        assert_eq!(snapshot.progress_percent, 100);
        let AnswerInput::Choices(options) = question.input else {
            panic!("expected choice input");
        };
        let states: Vec<OptionState> = options.iter().map(|option| option.state).collect();
        assert_eq!(
            states,
            vec![
                OptionState::Incorrect,
                OptionState::Neutral,
                OptionState::Correct
            ]
        );
        let feedback = question.feedback.unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.explanation.as_deref(), Some("Explanation 1"));
        assert_eq!(feedback.accepted_answer, None);
    }

    #[test]
    fn true_false_options_are_labelled_t_and_f() {
        let mut session = session_with(vec![true_false(1, "objects", 1)]);
        session.start_quiz();

        let question = session.snapshot().question.unwrap();

        let AnswerInput::Choices(options) = question.input else {
            panic!("expected choice input");
        };
        assert_eq!(options.len(), 2);
        assert_eq!((options[0].label, options[0].text.as_str()), ('T', "True"));
        assert_eq!((options[1].label, options[1].text.as_str()), ('F', "False"));
    }

    #[test]
    fn revisited_fill_gap_restores_submitted_text_and_feedback() {
        let mut session = session_with(vec![
            fill_gap(1, "access", "private"),
            true_false(2, "access", 0),
        ]);
        session.start_quiz();
        session.submit_answer(Some("  Private "));
        session.next_question();
        assert_eq!(session.snapshot().progress_percent, 50);

        session.previous_question();
        let snapshot = session.snapshot();
        let question = snapshot.question.unwrap();

        assert_eq!(snapshot.phase, Phase::AwaitingNext);
        assert!(!snapshot.can_submit);
        assert_eq!(
            question.input,
            AnswerInput::FreeText {
                submitted: Some("Private".to_string())
            }
        );
        let feedback = question.feedback.unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.accepted_answer.as_deref(), Some("private"));
    }

    #[test]
    fn complete_snapshot_exposes_final_percentage_and_tier() {
        let mut session = session_with(vec![true_false(1, "a", 0)]);
        session.start_quiz();
        session.select_option(0);
        session.submit_answer(None);
        session.next_question();

        let snapshot = session.snapshot();
        let completion = snapshot.completion.unwrap();

        assert_eq!(snapshot.phase, Phase::Complete);
        assert!(snapshot.question.is_none());
        assert_eq!(snapshot.progress_percent, 100);
        assert_eq!(completion.accuracy_percent, 100);
        assert_eq!(completion.tier, CompletionTier::Mastery);
        assert_eq!(snapshot.stats.best_streak, 1);
    }
}
