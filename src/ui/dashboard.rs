use chrono::{Local, Timelike, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
};

use super::theme;
use crate::app::App;
use crate::session::greeting;
use crate::view::format_relative_due_time;

/// Selection in the "Current Jobs" list.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub selected_index: usize,
    pub refreshing: bool,
}

impl DashboardState {
    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Greeting
            Constraint::Length(3), // Weekly progress
            Constraint::Length(4), // Today's overview
            Constraint::Min(5),    // Current jobs
            Constraint::Length(1), // Hints
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_weekly(frame, app, chunks[1]);
    render_today(frame, app, chunks[2]);
    render_jobs(frame, app, chunks[3]);

    let hints = Paragraph::new(" Enter: View Details  a: See All  r: Refresh  L: Logout Session")
        .style(theme::muted());
    frame.render_widget(hints, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let unread = app.view.unread_notifications();
    let mut spans = vec![
        Span::styled(
            format!(" {}, {}! ", greeting(Local::now().hour()), app.session.display_name()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ACTIVE ", theme::badge(crate::model::Tone::Success)),
    ];
    if app.dashboard.refreshing {
        spans.push(Span::styled("  ⟳ refreshing...", Style::default().fg(Color::Cyan)));
    }

    let bell = if unread > 0 {
        Span::styled(format!(" 🔔 {} ", unread), Style::default().fg(Color::Black).bg(Color::Red))
    } else {
        Span::styled(" 🔔 ", theme::muted())
    };

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Line::from(bell).right_aligned()),
    );
    frame.render_widget(header, area);
}

fn render_weekly(frame: &mut Frame, app: &App, area: Rect) {
    let weekly = app.view.weekly_progress();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Weekly Progress "))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .percent(u16::from(weekly.percentage))
        .label(format!(
            "{}/{} tasks ({}%)",
            weekly.completed, weekly.total, weekly.percentage
        ));
    frame.render_widget(gauge, area);
}

fn render_today(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.view.today_stats() {
        Some(stats) => vec![
            Line::from(vec![
                Span::styled("Completed ", theme::muted()),
                Span::styled(
                    stats.tasks_completed.to_string(),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled("   Hours ", theme::muted()),
                Span::styled(
                    format!("{:.1}", stats.hours_worked),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Photos ", theme::muted()),
                Span::raw(stats.photos_uploaded.to_string()),
                Span::styled("   AI checks ", theme::muted()),
                Span::raw(stats.ai_verifications.to_string()),
            ]),
        ],
        None => vec![Line::from(Span::styled("No activity recorded today", theme::muted()))],
    };

    let overview = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Today's Overview "));
    frame.render_widget(overview, area);
}

fn render_jobs(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let jobs = app.view.active_tasks();

    let items: Vec<ListItem> = jobs
        .iter()
        .map(|task| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(
                        format!(" {} ", task.priority.label().to_uppercase()),
                        theme::badge(task.priority.tone()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled(format!("  📍 {}", task.location.name), theme::muted()),
                    Span::raw(format!("  {}%", task.progress.value())),
                    Span::styled(
                        format!("  {}", format_relative_due_time(task.due_date, now)),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
            ])
        })
        .collect();

    let title = format!(" Current Jobs ({}) ", jobs.len());
    if items.is_empty() {
        let empty = Paragraph::new("No active jobs")
            .style(theme::muted())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(theme::selected())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.dashboard.selected_index.min(jobs.len() - 1)));
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = DashboardState::default();
        state.move_up();
        assert_eq!(state.selected_index, 0);
        state.move_down(2);
        state.move_down(2);
        assert_eq!(state.selected_index, 1);
        state.move_down(0);
        assert_eq!(state.selected_index, 1);
    }
}
