//! Single-line text field state shared by the forms.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in characters.
    cursor: usize,
    max_len: Option<usize>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn handle_char(&mut self, c: char) {
        if self.max_len.is_some_and(|max| self.value.chars().count() >= max) {
            return;
        }
        let idx = self.byte_index();
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index();
            self.value.remove(idx);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Value with a `|` cursor marker when focused; `mask` hides the text.
    pub fn display(&self, focused: bool, mask: bool) -> String {
        let shown: String = if mask {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };
        if !focused {
            return shown;
        }
        let split = shown
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(shown.len());
        format!("{}|{}", &shown[..split], &shown[split..])
    }
}

/// Draw a bordered field, highlighted when focused.
pub fn render_field(
    frame: &mut Frame,
    input: &TextInput,
    title: &str,
    placeholder: &str,
    focused: bool,
    mask: bool,
    area: Rect,
) {
    let color = if focused { Color::Yellow } else { Color::DarkGray };
    let (text, style) = if input.is_empty() && !focused {
        (placeholder.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (input.display(focused, mask), Style::default().fg(Color::White))
    };

    let field = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(field, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::new();
        for c in "añb".chars() {
            input.handle_char(c);
        }
        input.move_cursor_left();
        input.backspace();
        assert_eq!(input.value(), "ab");
        input.handle_char('é');
        assert_eq!(input.value(), "aéb");
    }

    #[test]
    fn test_max_len() {
        let mut input = TextInput::with_max_len(3);
        for c in "abcdef".chars() {
            input.handle_char(c);
        }
        assert_eq!(input.value(), "abc");
    }

    #[test]
    fn test_display_cursor_and_mask() {
        let mut input = TextInput::new();
        input.set("pw");
        assert_eq!(input.display(true, false), "pw|");
        assert_eq!(input.display(false, true), "••");
        input.move_cursor_left();
        assert_eq!(input.display(true, true), "•|•");
    }

    #[test]
    fn test_clear() {
        let mut input = TextInput::new();
        input.set("block a");
        input.clear();
        assert!(input.is_empty());
        input.backspace();
        assert!(input.is_empty());
    }
}
