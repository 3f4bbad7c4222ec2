use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::text_input::{render_field, TextInput};
use super::theme;
use crate::app::App;
use crate::assistant::{Conversation, Sender, MAX_INPUT_LEN, QUICK_PROMPTS};

/// Chat screen state: the conversation plus the compose box.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub conversation: Conversation,
    pub input: TextInput,
    pub editing: bool,
    /// Set while an assistant reply is pending.
    pub typing: bool,
    /// Highlighted quick prompt, if the prompt row has focus.
    pub prompt_index: Option<usize>,
}

impl ChatState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            input: TextInput::with_max_len(MAX_INPUT_LEN),
            editing: false,
            typing: false,
            prompt_index: None,
        }
    }

    pub fn next_prompt(&mut self) {
        self.prompt_index = Some(match self.prompt_index {
            Some(idx) => (idx + 1) % QUICK_PROMPTS.len(),
            None => 0,
        });
    }

    pub fn selected_prompt(&self) -> Option<&'static str> {
        self.prompt_index.and_then(|idx| QUICK_PROMPTS.get(idx).copied())
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    lines
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.chat;
    let show_prompts = state.conversation.show_quick_prompts();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Messages
            Constraint::Length(if show_prompts { 1 } else { 0 }),
            Constraint::Length(3), // Input
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let status = if state.typing {
        Span::styled("typing...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● Online", Style::default().fg(Color::Green))
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" 🤖 AI Assistant  ", theme::heading()),
            status,
        ])),
        chunks[0],
    );

    render_messages(frame, state, chunks[1]);

    if show_prompts {
        let mut spans = vec![Span::styled(" Try: ", theme::muted())];
        for (idx, prompt) in QUICK_PROMPTS.iter().enumerate() {
            let style = if state.prompt_index == Some(idx) {
                theme::selected()
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(format!("[{}]", prompt), style));
            spans.push(Span::raw(" "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[2]);
    }

    render_field(
        frame,
        &state.input,
        "Message",
        "Ask me anything...",
        state.editing,
        false,
        chunks[3],
    );

    let hints = if state.editing {
        " Enter: send  Esc: stop typing"
    } else if show_prompts {
        " i: type  Tab: quick prompt  Enter: send prompt"
    } else {
        " i: type a message"
    };
    frame.render_widget(Paragraph::new(hints).style(theme::muted()), chunks[4]);
}

fn render_messages(frame: &mut Frame, state: &ChatState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    let width = (inner.width as usize).saturating_sub(2).max(10);

    let mut lines: Vec<Line> = Vec::new();
    for message in state.conversation.messages() {
        let time = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        let (who, color, alignment) = match message.sender {
            Sender::User => ("You", Color::Magenta, Alignment::Right),
            Sender::Assistant => ("Assistant", Color::Cyan, Alignment::Left),
        };
        lines.push(
            Line::from(vec![
                Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}", time), theme::muted()),
            ])
            .alignment(alignment),
        );
        for text in wrap_text(&message.text, width * 3 / 4) {
            lines.push(Line::from(text).alignment(alignment));
        }
        lines.push(Line::from(""));
    }
    if state.typing {
        lines.push(Line::from(Span::styled("Assistant is typing...", theme::muted())));
    }

    let overflow = lines.len().saturating_sub(inner.height as usize);
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_wrap_keeps_words_together() {
        assert_eq!(
            wrap_text("Use a harvesting sickle", 10),
            vec!["Use a", "harvesting", "sickle"]
        );
    }

    #[test]
    fn test_wrap_splits_long_words_and_keeps_blank_lines() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("a\n\nb", 5), vec!["a", "", "b"]);
    }

    #[test]
    fn test_prompt_cycle() {
        let mut state = ChatState::new(Conversation::new(Utc::now()));
        assert_eq!(state.selected_prompt(), None);
        state.next_prompt();
        assert_eq!(state.selected_prompt(), Some(QUICK_PROMPTS[0]));
        for _ in 0..QUICK_PROMPTS.len() {
            state.next_prompt();
        }
        assert_eq!(state.prompt_index, Some(0));
    }
}
