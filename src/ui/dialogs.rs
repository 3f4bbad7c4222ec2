use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::theme;

/// One-button message box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub is_error: bool,
}

impl Alert {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            is_error: true,
        }
    }
}

/// Actions that need a yes/no before they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Logout,
    CompleteTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub action: ConfirmAction,
    pub title: &'static str,
    pub message: &'static str,
    pub confirm_label: &'static str,
    /// Whether the confirm button (rather than Cancel) is highlighted.
    pub confirm_selected: bool,
}

impl ConfirmDialog {
    pub fn new(action: ConfirmAction) -> Self {
        let (title, message, confirm_label) = match action {
            ConfirmAction::Logout => ("Confirm Logout", "Are you sure you want to log out?", "Logout"),
            ConfirmAction::CompleteTask => (
                "Complete Task",
                "Are you sure you want to mark this task as complete?",
                "Complete",
            ),
        };
        Self {
            action,
            title,
            message,
            confirm_label,
            confirm_selected: false,
        }
    }

    pub fn toggle(&mut self) {
        self.confirm_selected = !self.confirm_selected;
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render_alert(frame: &mut Frame, alert: &Alert, area: Rect) {
    let dialog_area = centered(area, 50, 8);
    frame.render_widget(Clear, dialog_area);

    let color = if alert.is_error { Color::Red } else { Color::Green };
    let text = vec![
        Line::from(alert.message.as_str()),
        Line::from(""),
        Line::from(Span::styled("Enter/Esc: OK", theme::muted())),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", alert.title))
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        );
    frame.render_widget(paragraph, dialog_area);
}

pub fn render_confirm(frame: &mut Frame, dialog: &ConfirmDialog, area: Rect) {
    let dialog_area = centered(area, 56, 9);
    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(2), Constraint::Length(3)])
        .split(dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", dialog.title));
    frame.render_widget(block, dialog_area);

    let message = Paragraph::new(dialog.message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(message, chunks[0]);

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let (cancel_style, confirm_style) = if dialog.confirm_selected {
        (Style::default(), theme::selected())
    } else {
        (theme::selected(), Style::default())
    };

    frame.render_widget(
        Paragraph::new("Cancel")
            .alignment(Alignment::Center)
            .style(cancel_style)
            .block(Block::default().borders(Borders::ALL)),
        buttons[0],
    );
    frame.render_widget(
        Paragraph::new(dialog.confirm_label)
            .alignment(Alignment::Center)
            .style(confirm_style)
            .block(Block::default().borders(Borders::ALL)),
        buttons[1],
    );
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let dialog_area = centered(area, 60, 30);
    frame.render_widget(Clear, dialog_area);

    let help_text = vec![
        Line::from(Span::styled("Navigation", theme::heading())),
        Line::from(""),
        Line::from("  1-5        Home / Tasks / Upload / Map / Assistant"),
        Line::from("  j / ↓      Move down"),
        Line::from("  k / ↑      Move up"),
        Line::from("  Enter      Open / confirm"),
        Line::from("  Esc        Back / stop editing"),
        Line::from(""),
        Line::from(Span::styled("Screens", theme::heading())),
        Line::from(""),
        Line::from("  r          Refresh dashboard"),
        Line::from("  L          Log out"),
        Line::from("  /          Search tasks"),
        Line::from("  f / F      Next / previous status filter"),
        Line::from("  u          Update task progress"),
        Line::from("  c          Complete task"),
        Line::from("  m          Show task location on map"),
        Line::from("  v          Toggle map / list view"),
        Line::from("  d          Directions to selected location"),
        Line::from("  Ctrl+T     Take photo from camera folder"),
        Line::from("  i          Type a message to the assistant"),
        Line::from(""),
        Line::from("  ?          Show this help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", theme::muted())),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_defaults_to_cancel() {
        let mut dialog = ConfirmDialog::new(ConfirmAction::Logout);
        assert!(!dialog.confirm_selected);
        assert_eq!(dialog.confirm_label, "Logout");
        dialog.toggle();
        assert!(dialog.confirm_selected);
    }

    #[test]
    fn test_centered_fits_small_area() {
        let area = Rect::new(0, 0, 30, 6);
        let inner = centered(area, 60, 30);
        assert!(inner.width <= area.width);
        assert!(inner.height <= area.height);
    }
}
