use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::text_input::{render_field, TextInput};
use super::theme;
use crate::session::Credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Name,
    Email,
    Password,
}

/// State for the login form.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub name: TextInput,
    pub email: TextInput,
    pub password: TextInput,
    pub focus: LoginField,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            name: TextInput::new(),
            email: TextInput::new(),
            password: TextInput::new(),
            focus: LoginField::Name,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            LoginField::Name => LoginField::Email,
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.focus = match self.focus {
            LoginField::Name => LoginField::Password,
            LoginField::Email => LoginField::Name,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            name: self.name.value().to_string(),
            email: self.email.value().to_string(),
            password: self.password.value().to_string(),
        }
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(frame: &mut Frame, form: &LoginForm, area: Rect) {
    let width = 50.min(area.width.saturating_sub(2));
    let height = 19.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let form_area = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Login ");
    frame.render_widget(block, form_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Name
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1),
            Constraint::Length(2), // Hints
        ])
        .split(form_area);

    let title = Paragraph::new(vec![
        Line::from("🌴🥥🌱"),
        Line::from(vec![
            Span::raw("WORKER "),
            Span::styled("QUEST", theme::heading()),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    render_field(
        frame,
        &form.name,
        "PLAYER NAME",
        "Enter your name",
        form.focus == LoginField::Name,
        false,
        chunks[1],
    );
    render_field(
        frame,
        &form.email,
        "PLAYER EMAIL",
        "worker@estate.com",
        form.focus == LoginField::Email,
        false,
        chunks[2],
    );
    render_field(
        frame,
        &form.password,
        "SECRET CODE",
        "••••••",
        form.focus == LoginField::Password,
        true,
        chunks[3],
    );

    let hints = Paragraph::new(vec![
        Line::from("Enter: LOGIN  Tab: next field"),
        Line::from(vec![
            Span::styled("New Worker? ", theme::muted()),
            Span::styled("Ctrl+N: Create Account", Style::default().fg(Color::Magenta)),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(hints, chunks[5]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cycle_wraps() {
        let mut form = LoginForm::new();
        form.previous_field();
        assert_eq!(form.focus, LoginField::Password);
        form.next_field();
        assert_eq!(form.focus, LoginField::Name);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut form = LoginForm::new();
        form.focused_input().set("Ahmad Razak");
        form.next_field();
        form.focused_input().set("ahmad@estate.com");
        form.next_field();
        form.focused_input().handle_char('x');

        let credentials = form.credentials();
        assert_eq!(credentials.name, "Ahmad Razak");
        assert_eq!(credentials.email, "ahmad@estate.com");
        assert_eq!(credentials.password, "x");
    }
}
