use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::App;
use crate::tasks::BackgroundTask;

fn task_indicator(task: &BackgroundTask) -> String {
    match task.progress {
        Some(ref progress) if progress.total > 1 => {
            format!("[{}:{}%]", task.kind.short_name(), progress.percent())
        }
        _ => format!("[{}:...]", task.kind.short_name()),
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // A status message replaces the whole bar until the next key press
    if let Some(ref message) = app.status_message {
        let line = Line::from(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut spans = Vec::new();

    let who = match app.session.name() {
        Some(name) => format!(" {} ", name),
        None => " Guest ".to_string(),
    };
    spans.push(Span::styled(
        who,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    let unread = app.view.unread_notifications();
    if app.session.is_logged_in() && unread > 0 {
        spans.push(Span::styled(
            format!(" {} unread ", unread),
            Style::default().fg(Color::Red),
        ));
    }

    let running = app.task_manager.running_tasks();
    if !running.is_empty() {
        let indicators: Vec<String> = running.iter().map(|t| task_indicator(t)).collect();
        spans.push(Span::styled(
            format!(" {} ", indicators.join(" ")),
            Style::default().fg(Color::Cyan),
        ));
    }

    let help_text = if running.is_empty() {
        " ?:help Ctrl+C:quit "
    } else {
        " T:tasks ?:help Ctrl+C:quit "
    };

    let content_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let available = area.width as usize;
    if available > content_len + help_text.len() {
        spans.push(Span::raw(" ".repeat(available - content_len - help_text.len())));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
