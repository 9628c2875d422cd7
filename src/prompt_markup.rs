const FENCE: &str = "```";
const LITERAL_NEWLINE: &str = "\\n";

/// A piece of a question prompt, ready for styling by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSegment {
    Text(String),
    InlineCode(String),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
}

/// Split a prompt into plain text, inline code spans and fenced code blocks.
/// Literal `\n` markers become real line breaks. An unterminated fence or
/// backtick is kept as plain text.
pub fn parse_prompt(prompt: &str) -> Vec<PromptSegment> {
    let expanded = prompt.replace(LITERAL_NEWLINE, "\n");
    let mut segments = Vec::new();
    let mut rest = expanded.as_str();

    while let Some(start) = rest.find(FENCE) {
        let after_open = &rest[start + FENCE.len()..];
        let Some(end) = after_open.find(FENCE) else {
            break;
        };
        push_inline(&mut segments, &rest[..start]);
        segments.push(code_block(&after_open[..end]));
        rest = &after_open[end + FENCE.len()..];
    }
    push_inline(&mut segments, rest);
    segments
}

fn code_block(body: &str) -> PromptSegment {
    let (first_line, remainder) = body.split_once('\n').unwrap_or((body, ""));
    let tag = first_line.trim();
    let is_language_tag = !tag.is_empty()
        && !remainder.is_empty()
        && tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '#' | '-' | '_'));

    if is_language_tag {
        PromptSegment::CodeBlock {
            language: Some(tag.to_string()),
            code: trim_newlines(remainder).to_string(),
        }
    } else {
        PromptSegment::CodeBlock {
            language: None,
            code: trim_newlines(body).to_string(),
        }
    }
}

fn push_inline(segments: &mut Vec<PromptSegment>, text: &str) {
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let run = rest[start..].chars().take_while(|ch| *ch == '`').count();
        if run > 1 {
            push_text(segments, &rest[..start + run]);
            rest = &rest[start + run..];
            continue;
        }
        let after_open = &rest[start + 1..];
        let Some(end) = after_open.find('`') else {
            break;
        };
        push_text(segments, &rest[..start]);
        segments.push(PromptSegment::InlineCode(after_open[..end].to_string()));
        rest = &after_open[end + 1..];
    }
    push_text(segments, rest);
}

fn push_text(segments: &mut Vec<PromptSegment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(PromptSegment::Text(previous)) = segments.last_mut() {
        previous.push_str(text);
    } else {
        segments.push(PromptSegment::Text(text.to_string()));
    }
}

fn trim_newlines(value: &str) -> &str {
    value.trim_matches(|ch| ch == '\n' || ch == '\r')
}
