use crate::question_bank::{QuestionBank, QuestionKind, QuestionRecord};
use std::fmt;

/// Topic selection. A record matches a [`TopicFilter::Topic`] when its own topic
/// appears, case-insensitively, inside the filter value, so a filter of
/// `"Constructors & Destructors"` also selects records tagged `constructors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    /// Convert a user-facing label into a filter. Blank labels and labels that
    /// contain the word "all" select everything.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || mentions_all(trimmed) {
            Self::All
        } else {
            Self::Topic(trimmed.to_string())
        }
    }

    pub fn matches(&self, record: &QuestionRecord) -> bool {
        match self {
            Self::All => true,
            Self::Topic(value) => {
                let topic = record.topic.trim();
                !topic.is_empty() && value.to_lowercase().contains(&topic.to_lowercase())
            }
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All topics"),
            Self::Topic(value) => f.write_str(value),
        }
    }
}

/// Question type selection. A label that names several kinds keeps all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    Kind(QuestionKind),
    AnyOf(Vec<QuestionKind>),
}

impl KindFilter {
    /// Convert a user-facing label such as `"Fill-Gap"` or `"True / False"` into a
    /// filter. Every kind whose name appears in the label is kept. Returns `None`
    /// when the label names no known kind.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = normalize_separators(label);
        if normalized.is_empty() || mentions_all(&normalized) {
            return Some(Self::All);
        }
        let mut named: Vec<QuestionKind> = QuestionKind::ALL
            .into_iter()
            .filter(|kind| {
                kind.label_aliases()
                    .iter()
                    .any(|alias| normalized.contains(alias))
            })
            .collect();
        match named.len() {
            0 => None,
            1 => named.pop().map(Self::Kind),
            _ => Some(Self::AnyOf(named)),
        }
    }

    pub fn matches(&self, record: &QuestionRecord) -> bool {
        match self {
            Self::All => true,
            Self::Kind(kind) => record.kind == *kind,
            Self::AnyOf(kinds) => kinds.contains(&record.kind),
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All types"),
            Self::Kind(kind) => f.write_str(kind.label()),
            Self::AnyOf(kinds) => {
                let labels: Vec<&str> = kinds.iter().map(|kind| kind.label()).collect();
                f.write_str(&labels.join(" & "))
            }
        }
    }
}

/// Indices into `bank` of every record accepted by both filters, in bank order.
pub fn compute_working_set(
    bank: &QuestionBank,
    topic: &TopicFilter,
    kind: &KindFilter,
) -> Vec<usize> {
    bank.records()
        .iter()
        .enumerate()
        .filter(|(_, record)| topic.matches(record) && kind.matches(record))
        .map(|(index, _)| index)
        .collect()
}

fn mentions_all(label: &str) -> bool {
    label
        .split(|ch: char| !ch.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("all"))
}

fn normalize_separators(label: &str) -> String {
    label
        .to_lowercase()
        .split(|ch: char| ch == '-' || ch == '_' || ch == '/' || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::tests::{choice, fill_gap, true_false};

    fn mixed_bank() -> QuestionBank {
        QuestionBank::from_records(vec![
            true_false(1, "fundamentals", 0),
            choice(2, "constructors", &["a", "b"], 1),
            fill_gap(3, "access", "public"),
            true_false(4, "constructors", 1),
            fill_gap(5, "constructors", "this"),
            choice(6, "fundamentals", &["a", "b", "c"], 2),
        ])
        .unwrap()
    }

    fn ids(bank: &QuestionBank, indices: &[usize]) -> Vec<u32> {
        indices.iter().map(|&index| bank.records()[index].id).collect()
    }

    #[test]
    fn all_filters_select_whole_bank_in_order() {
        let bank = mixed_bank();

        let set = compute_working_set(&bank, &TopicFilter::All, &KindFilter::All);

        assert_eq!(ids(&bank, &set), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn topic_filter_selects_only_matching_topic_preserving_order() {
        let bank = mixed_bank();

        let set = compute_working_set(
            &bank,
            &TopicFilter::from_label("constructors"),
            &KindFilter::All,
        );

        assert_eq!(ids(&bank, &set), vec![2, 4, 5]);
    }

    #[test]
    fn topic_filter_matches_topic_inside_wider_label() {
        let bank = mixed_bank();

        let set = compute_working_set(
            &bank,
            &TopicFilter::Topic("Access Specifiers".to_string()),
            &KindFilter::All,
        );

        assert_eq!(ids(&bank, &set), vec![3]);
    }

    #[test]
    fn kind_and_topic_filters_combine() {
        let bank = mixed_bank();

        let set = compute_working_set(
            &bank,
            &TopicFilter::Topic("constructors".to_string()),
            &KindFilter::Kind(QuestionKind::FillGap),
        );

        assert_eq!(ids(&bank, &set), vec![5]);
    }

    #[test]
    fn unmatched_topic_yields_empty_set() {
        let bank = mixed_bank();

        let set = compute_working_set(
            &bank,
            &TopicFilter::Topic("templates".to_string()),
            &KindFilter::All,
        );

        assert!(set.is_empty());
    }

    #[test]
    fn working_set_is_always_an_ordered_subset() {
        let bank = mixed_bank();
        let topics = ["all", "fundamentals", "constructors", "access", "nothing"];
        let kinds = [
            KindFilter::All,
            KindFilter::Kind(QuestionKind::TrueFalse),
            KindFilter::Kind(QuestionKind::MultipleChoice),
            KindFilter::Kind(QuestionKind::FillGap),
        ];

        for topic in topics {
            for kind in &kinds {
                let set = compute_working_set(&bank, &TopicFilter::from_label(topic), kind);
                assert!(set.windows(2).all(|pair| pair[0] < pair[1]));
                assert!(set.iter().all(|&index| index < bank.len()));
            }
        }
    }

    #[test]
    fn labels_convert_to_typed_filters() {
        assert_eq!(TopicFilter::from_label("All Topics"), TopicFilter::All);
        assert_eq!(TopicFilter::from_label("  "), TopicFilter::All);
        assert_eq!(
            TopicFilter::from_label(" Scope "),
            TopicFilter::Topic("Scope".to_string())
        );
        assert_eq!(KindFilter::from_label("All Types"), Some(KindFilter::All));
        assert_eq!(
            KindFilter::from_label("Fill-Gap"),
            Some(KindFilter::Kind(QuestionKind::FillGap))
        );
        assert_eq!(
            KindFilter::from_label("fill gap"),
            Some(KindFilter::Kind(QuestionKind::FillGap))
        );
        assert_eq!(
            KindFilter::from_label("True / False"),
            Some(KindFilter::Kind(QuestionKind::TrueFalse))
        );
        assert_eq!(KindFilter::from_label("essay"), None);
        assert_eq!(
            KindFilter::from_label("Fill in the blank"),
            Some(KindFilter::Kind(QuestionKind::FillGap))
        );
    }

    #[test]
    fn kind_filter_labels_read_back_to_the_same_filter() {
        let mut filters = vec![KindFilter::All];
        filters.extend(QuestionKind::ALL.into_iter().map(KindFilter::Kind));
        filters.push(KindFilter::AnyOf(vec![
            QuestionKind::TrueFalse,
            QuestionKind::FillGap,
        ]));

        for filter in filters {
            assert_eq!(
                KindFilter::from_label(&filter.to_string()),
                Some(filter.clone()),
                "label {:?}",
                filter.to_string()
            );
        }
    }

    #[test]
    fn kind_label_naming_two_kinds_keeps_both() {
        let bank = QuestionBank::from_records(vec![
            true_false(1, "objects", 0),
            choice(2, "objects", &["a", "b"], 0),
            fill_gap(3, "objects", "this"),
        ])
        .unwrap();
        let filter = KindFilter::from_label("Multiple Choice & Fill Gap").unwrap();

        assert_eq!(
            filter,
            KindFilter::AnyOf(vec![QuestionKind::MultipleChoice, QuestionKind::FillGap])
        );
        assert_eq!(
            compute_working_set(&bank, &TopicFilter::All, &filter),
            vec![1, 2]
        );
    }

    #[test]
    fn record_without_topic_never_matches_a_topic_filter() {
        let record = true_false(1, "", 0);

        assert!(!TopicFilter::Topic("anything".to_string()).matches(&record));
        assert!(TopicFilter::All.matches(&record));
    }
}
