use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// Bank bundled with the binary, used when no `question_bank_path` is configured.
const BUILTIN_BANK: &str = include_str!("../data/questions.json");

/// Canonical options shown for every true/false question, whatever the record stores.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    TrueFalse,
    MultipleChoice,
    FillGap,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [Self::TrueFalse, Self::MultipleChoice, Self::FillGap];

    /// Lower-case names, separators normalised to spaces, that identify this
    /// kind inside a filter label. The first entry is the canonical form.
    pub fn label_aliases(self) -> &'static [&'static str] {
        match self {
            Self::TrueFalse => &["true false"],
            Self::MultipleChoice => &["multiple choice"],
            Self::FillGap => &["fill gap", "fill in the gap", "fill in the blank"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TrueFalse => "True/False",
            Self::MultipleChoice => "Multiple Choice",
            Self::FillGap => "Fill in the Gap",
        }
    }

    pub fn is_choice(self) -> bool {
        !matches!(self, Self::FillGap)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// A single immutable question as supplied by the bank file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u32,
    #[serde(alias = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correct")]
    pub correct_index: Option<usize>,
    #[serde(default, alias = "answer")]
    pub accepted_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    /// Options as the user sees them. True/false questions always use the canonical pair.
    pub fn display_options(&self) -> Vec<&str> {
        match self.kind {
            QuestionKind::TrueFalse => TRUE_FALSE_OPTIONS.to_vec(),
            QuestionKind::MultipleChoice => self.options.iter().map(String::as_str).collect(),
            QuestionKind::FillGap => Vec::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(eyre!("question {} has an empty prompt", self.id));
        }
        match self.kind {
            QuestionKind::TrueFalse => match self.correct_index {
                Some(index) if index < TRUE_FALSE_OPTIONS.len() => Ok(()),
                Some(index) => Err(eyre!(
                    "true/false question {} has correct index {} (expected 0 or 1)",
                    self.id,
                    index
                )),
                None => Err(eyre!("true/false question {} has no correct index", self.id)),
            },
            QuestionKind::MultipleChoice => {
                if self.options.is_empty() {
                    return Err(eyre!("multiple choice question {} has no options", self.id));
                }
                match self.correct_index {
                    Some(index) if index < self.options.len() => Ok(()),
                    Some(index) => Err(eyre!(
                        "multiple choice question {} has correct index {} but only {} option(s)",
                        self.id,
                        index,
                        self.options.len()
                    )),
                    None => Err(eyre!(
                        "multiple choice question {} has no correct index",
                        self.id
                    )),
                }
            }
            QuestionKind::FillGap => match self.accepted_answer.as_deref().map(str::trim) {
                Some(answer) if !answer.is_empty() => Ok(()),
                _ => Err(eyre!("fill-gap question {} has no accepted answer", self.id)),
            },
        }
    }
}

/// Ordered, validated, read-only list of questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Validate every record and reject the whole bank on the first defect.
    pub fn from_records(records: Vec<QuestionRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            record.validate()?;
            if !seen.insert(record.id) {
                return Err(eyre!("question id {} appears more than once", record.id));
            }
        }
        Ok(Self { records })
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let records: Vec<QuestionRecord> =
            serde_json::from_str(contents).wrap_err("failed to parse question bank JSON")?;
        Self::from_records(records)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read question bank at {}", path.display()))?;
        Self::from_json_str(&contents)
            .wrap_err_with(|| format!("invalid question bank at {}", path.display()))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_BANK).wrap_err("invalid built-in question bank")
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct non-empty topics in first-seen order.
    pub fn topics(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.topic.as_str())
            .filter(|topic| !topic.trim().is_empty())
            .filter(|topic| seen.insert(*topic))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn choice(id: u32, topic: &str, options: &[&str], correct: usize) -> QuestionRecord {
        QuestionRecord {
            id,
            kind: QuestionKind::MultipleChoice,
            topic: topic.to_string(),
            difficulty: Difficulty::Medium,
            prompt: format!("Question {id}?"),
            options: options.iter().map(|option| option.to_string()).collect(),
            correct_index: Some(correct),
            accepted_answer: None,
            explanation: Some(format!("Explanation {id}")),
        }
    }

    pub(crate) fn true_false(id: u32, topic: &str, correct: usize) -> QuestionRecord {
        QuestionRecord {
            id,
            kind: QuestionKind::TrueFalse,
            topic: topic.to_string(),
            difficulty: Difficulty::Easy,
            prompt: format!("Statement {id}."),
            options: Vec::new(),
            correct_index: Some(correct),
            accepted_answer: None,
            explanation: None,
        }
    }

    pub(crate) fn fill_gap(id: u32, topic: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            id,
            kind: QuestionKind::FillGap,
            topic: topic.to_string(),
            difficulty: Difficulty::Hard,
            prompt: format!("Fill _____ {id}."),
            options: Vec::new(),
            correct_index: None,
            accepted_answer: Some(answer.to_string()),
            explanation: Some(format!("Answer is {answer}")),
        }
    }

    #[test]
    fn builtin_bank_is_valid() {
        let bank = QuestionBank::builtin().expect("built-in bank should validate");
        assert_eq!(bank.len(), 18);
        assert!(bank.topics().contains(&"constructors"));
    }

    #[test]
    fn accepts_source_field_names() {
        let json = r#"[
            {"id": 1, "type": "true-false", "topic": "fundamentals", "difficulty": "easy",
             "question": "A class is a blueprint.", "options": ["True", "False"], "correct": 0},
            {"id": 2, "type": "fill-gap", "topic": "access",
             "question": "Members are _____ by default.", "answer": "private"}
        ]"#;

        let bank = QuestionBank::from_json_str(json).expect("bank should parse");

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.records()[0].kind, QuestionKind::TrueFalse);
        assert_eq!(bank.records()[0].correct_index, Some(0));
        assert_eq!(bank.records()[1].difficulty, Difficulty::Easy);
        assert_eq!(bank.records()[1].accepted_answer.as_deref(), Some("private"));
    }

    #[test]
    fn rejects_choice_question_without_options() {
        let mut record = choice(7, "objects", &["a"], 0);
        record.options.clear();

        let err = QuestionBank::from_records(vec![record]).unwrap_err();

        assert!(err.to_string().contains("question 7 has no options"));
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let record = choice(3, "objects", &["a", "b"], 2);
        assert!(QuestionBank::from_records(vec![record]).is_err());

        let record = true_false(4, "objects", 2);
        assert!(QuestionBank::from_records(vec![record]).is_err());
    }

    #[test]
    fn rejects_fill_gap_without_answer() {
        let mut record = fill_gap(9, "scope", "x");
        record.accepted_answer = Some("   ".to_string());

        let err = QuestionBank::from_records(vec![record]).unwrap_err();

        assert!(err.to_string().contains("fill-gap question 9"));
    }

    #[test]
    fn rejects_blank_prompt() {
        let mut record = true_false(5, "scope", 1);
        record.prompt = " \n ".to_string();

        let err = QuestionBank::from_records(vec![record]).unwrap_err();

        assert!(err.to_string().contains("question 5 has an empty prompt"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let records = vec![true_false(1, "a", 0), true_false(1, "b", 1)];

        let err = QuestionBank::from_records(records).unwrap_err();

        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn true_false_always_displays_canonical_pair() {
        let mut record = true_false(1, "a", 0);
        record.options = vec!["Yes".to_string(), "No".to_string(), "Maybe".to_string()];

        assert_eq!(record.display_options(), vec!["True", "False"]);
    }

    #[test]
    fn topics_are_distinct_in_first_seen_order() {
        let bank = QuestionBank::from_records(vec![
            true_false(1, "fundamentals", 0),
            true_false(2, "constructors", 0),
            true_false(3, "fundamentals", 1),
            true_false(4, "", 1),
            true_false(5, "access", 1),
        ])
        .unwrap();

        assert_eq!(bank.topics(), vec!["fundamentals", "constructors", "access"]);
    }
}
