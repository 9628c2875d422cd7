use crate::{
    App, AppView,
    prompt_markup::{PromptSegment, parse_prompt},
    quiz_session::Phase,
    scoring::CompletionTier,
    snapshot::{AnswerInput, OptionState, QuestionView, SessionSnapshot},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

pub(crate) struct UiRenderer<'a> {
    app: &'a mut App,
}

impl<'a> UiRenderer<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn render(&mut self, frame: &mut Frame) {
        let snapshot = self.app.session.snapshot();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(5),
            ])
            .split(frame.area());

        self.render_header(frame, layout[0], &snapshot);
        match self.app.view() {
            AppView::Setup => self.render_setup(frame, layout[1], &snapshot),
            AppView::Quiz => self.render_quiz(frame, layout[1], &snapshot),
            AppView::Summary => self.render_summary(frame, layout[1], &snapshot),
        }
        self.render_status(frame, layout[2], &snapshot);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let header_title = Line::from(format!("Quiz • {}", self.app.bank_source))
            .bold()
            .blue()
            .centered();
        let stats = &snapshot.stats;
        let header_text = format!(
            "Question {}/{} • Correct {} • Accuracy {}% • Streak {} (best {})",
            snapshot.position,
            snapshot.total,
            stats.correct_count,
            stats.accuracy_percent,
            stats.current_streak,
            stats.best_streak
        );

        frame.render_widget(
            Paragraph::new(header_text)
                .block(Block::bordered().title(header_title))
                .centered(),
            area,
        );
    }

    fn render_setup(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let app = &*self.app;
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let topic_items: Vec<ListItem> = app
            .topic_options
            .iter()
            .map(|filter| ListItem::new(filter.to_string()))
            .collect();
        let mut topic_state = ListState::default();
        topic_state.select(Some(app.topic_index));
        frame.render_stateful_widget(
            List::new(topic_items)
                .block(Block::bordered().title(Line::from("Topic (↑/↓)")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            sections[0],
            &mut topic_state,
        );

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3)])
            .split(sections[1]);

        let kind_items: Vec<ListItem> = app
            .kind_options
            .iter()
            .map(|filter| ListItem::new(filter.to_string()))
            .collect();
        let mut kind_state = ListState::default();
        kind_state.select(Some(app.kind_index));
        frame.render_stateful_widget(
            List::new(kind_items)
                .block(Block::bordered().title(Line::from("Type (←/→)")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            right[0],
            &mut kind_state,
        );

        let mut lines = vec![
            format!("Filters: {} • {}", snapshot.topic_filter, snapshot.kind_filter),
            format!("Questions matching: {}", snapshot.total),
            format!(
                "Random order: {}",
                if snapshot.random_mode { "ON" } else { "OFF" }
            ),
            format!(
                "Explanations: {}",
                if app.show_explanations { "shown" } else { "hidden" }
            ),
        ];
        if snapshot.phase == Phase::NoQuestionsAvailable {
            lines.push(String::new());
            lines.push("No questions available for this combination.".to_string());
        }
        frame.render_widget(
            Paragraph::new(lines.join("\n"))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Session"))),
            right[1],
        );
    }

    fn render_quiz(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let Some(question) = &snapshot.question else {
            return;
        };
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(7),
            ])
            .split(area);

        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Blue))
                .percent(u16::from(snapshot.progress_percent)),
            sections[0],
        );

        let title = format!(
            "Question {} (#{}) • {} • {} • {}",
            snapshot.position,
            question.id,
            question.kind.label(),
            question.difficulty,
            question.topic
        );
        let mut lines = prompt_lines(&question.prompt);
        lines.push(Line::from(""));
        lines.extend(self.answer_lines(question));

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from(title))),
            sections[1],
        );

        frame.render_widget(
            Paragraph::new(self.feedback_lines(question))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Feedback"))),
            sections[2],
        );
    }

    fn answer_lines(&self, question: &QuestionView) -> Vec<Line<'static>> {
        match &question.input {
            AnswerInput::Choices(options) => options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let highlighted = question.feedback.is_none() && index == self.app.option_cursor;
                    let prefix = if highlighted { "▶" } else { " " };
                    let (marker, style) = match option.state {
                        OptionState::Neutral => ("[ ]", Style::default()),
                        OptionState::Selected => ("[•]", Style::default().bold()),
                        OptionState::Correct => ("[✓]", Style::default().fg(Color::Green)),
                        OptionState::Incorrect => ("[✗]", Style::default().fg(Color::Red)),
                    };
                    Line::from(Span::styled(
                        format!("{} {} {}. {}", prefix, marker, option.label, option.text),
                        style,
                    ))
                })
                .collect(),
            AnswerInput::FreeText { submitted } => {
                let (text, style) = match (submitted, &question.feedback) {
                    (Some(text), Some(feedback)) if feedback.correct => {
                        (text.clone(), Style::default().fg(Color::Green))
                    }
                    (Some(text), _) => (text.clone(), Style::default().fg(Color::Red)),
                    (None, _) => (format!("{}▏", self.app.answer_input), Style::default()),
                };
                vec![Line::from(vec![
                    Span::raw("Answer: "),
                    Span::styled(text, style),
                ])]
            }
        }
    }

    fn feedback_lines(&self, question: &QuestionView) -> Vec<Line<'static>> {
        let Some(feedback) = &question.feedback else {
            return vec![Line::from("Submit an answer to see feedback.")];
        };
        let mut lines = vec![if feedback.correct {
            Line::from("Correct!").green().bold()
        } else {
            Line::from("Incorrect.").red().bold()
        }];
        if let Some(accepted) = feedback.accepted_answer.as_ref().filter(|_| !feedback.correct) {
            lines.push(Line::from(format!("Expected: {}", accepted)));
        }
        if self.app.show_explanations {
            if let Some(explanation) = &feedback.explanation {
                lines.push(Line::from(""));
                lines.extend(prompt_lines(explanation));
            }
        }
        lines
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let Some(completion) = snapshot.completion else {
            return;
        };
        let mut lines = vec![
            Line::from(format!("{}%", completion.accuracy_percent))
                .bold()
                .centered(),
            Line::from(tier_message(completion.tier)).centered(),
            Line::from(""),
            Line::from(format!(
                "Answered {} of {} question(s) • best streak {}",
                completion.answered, completion.total_questions, snapshot.stats.best_streak
            ))
            .centered(),
        ];

        if !snapshot.stats.by_topic.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("By topic").bold());
            for (topic, tally) in &snapshot.stats.by_topic {
                lines.push(Line::from(format!(
                    "  {:<16} {}/{}",
                    topic, tally.correct, tally.total
                )));
            }
        }
        if !snapshot.stats.by_difficulty.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("By difficulty").bold());
            for (difficulty, tally) in &snapshot.stats.by_difficulty {
                lines.push(Line::from(format!(
                    "  {:<16} {}/{}",
                    difficulty.label(),
                    tally.correct,
                    tally.total
                )));
            }
        }

        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Quiz Complete"))),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let app = &*self.app;
        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        if let Some(status) = &app.status {
            status_lines.push(status.clone());
        }
        status_lines.push(match app.view() {
            AppView::Setup => {
                "↑/↓ topic • ←/→ type • r random • x explanations • Enter start • q quit".to_string()
            }
            AppView::Quiz if snapshot.can_submit && app.is_typing_answer() => {
                "Type your answer • Enter submit • PgUp/PgDn move • Ctrl-R reset • Esc quit"
                    .to_string()
            }
            AppView::Quiz if snapshot.can_submit => {
                "↑/↓ or 1-9 select • Enter submit • PgUp/PgDn move • Ctrl-R reset • q quit"
                    .to_string()
            }
            AppView::Quiz if !snapshot.can_advance => String::new(),
            AppView::Quiz => {
                let advance = if snapshot.advance_completes {
                    "complete quiz"
                } else {
                    "next"
                };
                if snapshot.can_go_back {
                    format!("Enter {} • p previous • Ctrl-R reset • q quit", advance)
                } else {
                    format!("Enter {} • Ctrl-R reset • q quit", advance)
                }
            }
            AppView::Summary => "Enter restart • m back to setup • q quit".to_string(),
        });

        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Status"))),
            area,
        );
    }
}

/// Completion messages ordered by tier index, best tier first.
const TIER_MESSAGES: [&str; 4] = [
    "Outstanding! You have mastered this material.",
    "Great job! Your understanding is solid. Keep practicing!",
    "Good work! Review the questions you missed and try again.",
    "Keep studying! Practice makes perfect.",
];

pub(crate) fn tier_message(tier: CompletionTier) -> &'static str {
    TIER_MESSAGES[tier.index()]
}

/// Styled lines for a prompt containing inline code and fenced code blocks.
pub(crate) fn prompt_lines(prompt: &str) -> Vec<Line<'static>> {
    let code_style = Style::default().fg(Color::Cyan);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in parse_prompt(prompt) {
        match segment {
            PromptSegment::Text(text) => push_wrapped(&mut lines, &mut current, &text, Style::default()),
            PromptSegment::InlineCode(code) => {
                current.push(Span::styled(code, code_style.add_modifier(Modifier::BOLD)))
            }
            PromptSegment::CodeBlock { language, code } => {
                if !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                if let Some(language) = language {
                    lines.push(Line::from(Span::styled(
                        format!("  [{}]", language),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.extend(
                    code.lines()
                        .map(|line| Line::from(Span::styled(format!("  {}", line), code_style))),
                );
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    current: &mut Vec<Span<'static>>,
    text: &str,
    style: Style,
) {
    let mut parts = text.split('\n').peekable();
    while let Some(part) = parts.next() {
        if !part.is_empty() {
            current.push(Span::styled(part.to_string(), style));
        }
        if parts.peek().is_some() {
            lines.push(Line::from(std::mem::take(current)));
        }
    }
}
