use chrono::{Local, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};

use super::theme;
use crate::app::App;
use crate::model::{Task, WorkPhoto};
use crate::view::format_relative_due_time;

/// Screen-local state for one task's detail page.
#[derive(Debug, Clone, Default)]
pub struct TaskDetailState {
    pub task_id: String,
    /// Set while a progress update is in flight.
    pub updating: bool,
}

impl TaskDetailState {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            updating: false,
        }
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.view.task(&app.detail.task_id) {
        Some(task) => render_task(frame, task, app.detail.updating, area),
        None => render_not_found(frame, &app.detail.task_id, area),
    }
}

fn render_not_found(frame: &mut Frame, task_id: &str, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Task not found",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("No task with id \"{}\"", task_id),
            theme::muted(),
        )),
        Line::from(""),
        Line::from(Span::styled("Esc: back", theme::muted())),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Task Details "));
    frame.render_widget(paragraph, area);
}

fn render_task(frame: &mut Frame, task: &Task, updating: bool, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Title, badges, description
            Constraint::Length(3), // Assignee + location
            Constraint::Length(3), // Progress
            Constraint::Length(3), // Due date + time spent
            Constraint::Min(3),    // Photos
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", task.priority.label().to_uppercase()),
                theme::badge(task.priority.tone()),
            ),
            Span::raw(" "),
            Span::styled(
                format!(" {} ", task.status.label().to_uppercase()),
                theme::badge(task.status.tone()),
            ),
        ]),
        Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(task.description.clone(), theme::muted())),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(" Task Details "));
    frame.render_widget(header, chunks[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let assignee = Paragraph::new(Line::from(vec![
        Span::styled(task.assigned_to.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", task.assigned_to.role), theme::muted()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Assigned To "));
    frame.render_widget(assignee, cards[0]);

    let location = Paragraph::new(Line::from(vec![
        Span::raw(format!("📍 {}", task.location.name)),
        Span::styled(format!("  {}", task.location.address), theme::muted()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Location (m: map) "));
    frame.render_widget(location, cards[1]);

    let label = if updating {
        "Updating...".to_string()
    } else {
        format!("{}%", task.progress.value())
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(theme::tone_color(task.status.tone())).bg(Color::DarkGray))
        .ratio(task.progress.ratio())
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    let times = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);

    let due_local = task.due_date.with_timezone(&Local);
    let due = Paragraph::new(Line::from(vec![
        Span::raw(due_local.format("%d %b %Y %H:%M").to_string()),
        Span::styled(
            format!("  {}", format_relative_due_time(task.due_date, Utc::now())),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Due Date "));
    frame.render_widget(due, times[0]);

    let spent = match task.actual_hours {
        Some(actual) => format!("{}h / {}h", actual, task.estimated_hours),
        None => format!("0h / {}h", task.estimated_hours),
    };
    let spent = Paragraph::new(spent)
        .block(Block::default().borders(Borders::ALL).title(" Time Spent "));
    frame.render_widget(spent, times[1]);

    render_photos(frame, &task.photos, chunks[4]);

    let hints = " u: Update Progress  c: Mark as Complete  p: Upload Photo  Esc: Back";
    frame.render_widget(Paragraph::new(hints).style(theme::muted()), chunks[5]);
}

fn render_photos(frame: &mut Frame, photos: &[WorkPhoto], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Photos ({}) ", photos.len()));

    if photos.is_empty() {
        let empty = Paragraph::new("No photos uploaded yet")
            .style(theme::muted())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = photos
        .iter()
        .map(|photo| {
            let mut spans = vec![
                Span::raw(format!(
                    "📷 {} ",
                    photo.timestamp.with_timezone(&Local).format("%d %b %H:%M")
                )),
                Span::raw(photo.caption.clone().unwrap_or_default()),
            ];
            if photo.ai_verified {
                let confidence = photo
                    .ai_analysis
                    .as_ref()
                    .map(|a| format!(" {}%", a.confidence))
                    .unwrap_or_default();
                spans.push(Span::styled(
                    format!("  ✓ AI verified{}", confidence),
                    Style::default().fg(Color::Green),
                ));
            }
            spans.push(Span::styled(format!("  {}", photo.uri), theme::muted()));
            ListItem::new(Line::from(spans))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
