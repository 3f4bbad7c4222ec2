use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::text_input::{render_field, TextInput};
use super::theme;
use crate::session::{Registration, AVATARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Avatar,
    HeroName,
    Email,
    Password,
}

impl SignupField {
    const ORDER: [SignupField; 4] = [
        SignupField::Avatar,
        SignupField::HeroName,
        SignupField::Email,
        SignupField::Password,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// State for the signup form.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub avatar: usize,
    pub hero_name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub focus: SignupField,
    /// Set while the "quest ready" overlay is showing.
    pub celebrating: bool,
}

impl SignupForm {
    pub fn new() -> Self {
        Self {
            avatar: 0,
            hero_name: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::new(),
            focus: SignupField::Avatar,
            celebrating: false,
        }
    }

    pub fn next_field(&mut self) {
        let next = (self.focus.position() + 1) % SignupField::ORDER.len();
        self.focus = SignupField::ORDER[next];
    }

    pub fn previous_field(&mut self) {
        let len = SignupField::ORDER.len();
        let previous = (self.focus.position() + len - 1) % len;
        self.focus = SignupField::ORDER[previous];
    }

    pub fn next_avatar(&mut self) {
        self.avatar = (self.avatar + 1) % AVATARS.len();
    }

    pub fn previous_avatar(&mut self) {
        self.avatar = (self.avatar + AVATARS.len() - 1) % AVATARS.len();
    }

    /// The text field with focus, or None while the avatar row is focused.
    pub fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            SignupField::Avatar => None,
            SignupField::HeroName => Some(&mut self.hero_name),
            SignupField::Email => Some(&mut self.email),
            SignupField::Password => Some(&mut self.password),
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            hero_name: self.hero_name.value().to_string(),
            email: self.email.value().to_string(),
            password: self.password.value().to_string(),
            avatar: self.avatar,
        }
    }
}

impl Default for SignupForm {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(frame: &mut Frame, form: &SignupForm, area: Rect) {
    let width = 54.min(area.width.saturating_sub(2));
    let height = 23.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let form_area = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Sign Up ");
    frame.render_widget(block, form_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(4), // Avatar picker
            Constraint::Length(3), // Hero name
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1),
            Constraint::Length(3), // Hints
        ])
        .split(form_area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled("NEW WORKER", theme::heading())),
        Line::from(Span::styled("Create your profile to start quests", theme::muted())),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let avatar_focused = form.focus == SignupField::Avatar;
    let mut avatar_spans = Vec::new();
    for (idx, glyph) in AVATARS.iter().enumerate() {
        let style = if idx == form.avatar {
            theme::selected()
        } else {
            Style::default()
        };
        avatar_spans.push(Span::styled(format!(" {} ", glyph), style));
        avatar_spans.push(Span::raw(" "));
    }
    let avatars = Paragraph::new(vec![Line::from(avatar_spans)])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" SELECT YOUR AVATAR ")
                .border_style(Style::default().fg(if avatar_focused {
                    Color::Yellow
                } else {
                    Color::DarkGray
                })),
        );
    frame.render_widget(avatars, chunks[1]);

    render_field(
        frame,
        &form.hero_name,
        "HERO NAME",
        "Your hero name",
        form.focus == SignupField::HeroName,
        false,
        chunks[2],
    );
    render_field(
        frame,
        &form.email,
        "EMAIL ADDRESS",
        "worker@estate.com",
        form.focus == SignupField::Email,
        false,
        chunks[3],
    );
    render_field(
        frame,
        &form.password,
        "PASSWORD",
        "••••••",
        form.focus == SignupField::Password,
        true,
        chunks[4],
    );

    let hints = Paragraph::new(vec![
        Line::from("Enter: REGISTER  Tab: next field"),
        Line::from("←/→: change avatar"),
        Line::from(Span::styled("Esc: ← Back to Login", theme::muted())),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(hints, chunks[6]);

    if form.celebrating {
        render_success(frame, form, form_area);
    }
}

fn render_success(frame: &mut Frame, form: &SignupForm, area: Rect) {
    let width = 40.min(area.width);
    let height = 7.min(area.height);
    let overlay = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, overlay);

    let name = form.hero_name.value().trim();
    let name = if name.is_empty() { "Worker" } else { name };
    let text = vec![
        Line::from(AVATARS[form.avatar % AVATARS.len()]),
        Line::from(Span::styled(
            "QUEST READY!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("Hero "),
            Span::styled(name.to_string(), Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            Span::raw(" has been registered."),
        ]),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );
    frame.render_widget(paragraph, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_wraps_both_ways() {
        let mut form = SignupForm::new();
        form.previous_avatar();
        assert_eq!(form.avatar, AVATARS.len() - 1);
        form.next_avatar();
        assert_eq!(form.avatar, 0);
    }

    #[test]
    fn test_avatar_row_has_no_text_input() {
        let mut form = SignupForm::new();
        assert!(form.focused_input().is_none());
        form.next_field();
        assert_eq!(form.focus, SignupField::HeroName);
        if let Some(input) = form.focused_input() {
            input.set("Siti");
        }
        assert_eq!(form.registration().hero_name, "Siti");
    }

    #[test]
    fn test_previous_field_from_first_wraps() {
        let mut form = SignupForm::new();
        form.previous_field();
        assert_eq!(form.focus, SignupField::Password);
    }
}
