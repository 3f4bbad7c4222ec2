use chrono::Utc;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
};

use super::text_input::{render_field, TextInput};
use super::theme;
use crate::app::App;
use crate::model::Task;
use crate::view::{format_relative_due_time, StatusFilter, TaskAggregate, TaskQuery};

/// Search, filter and selection for the task list.
#[derive(Debug, Clone, Default)]
pub struct TaskListState {
    pub search: TextInput,
    /// True while keystrokes go to the search field.
    pub searching: bool,
    pub filter: StatusFilter,
    pub selected_index: usize,
}

impl TaskListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> TaskQuery {
        TaskQuery::new(self.search.value(), self.filter)
    }

    pub fn next_filter(&mut self) {
        self.filter = self.filter.next();
        self.selected_index = 0;
    }

    pub fn previous_filter(&mut self) {
        self.filter = self.filter.previous();
        self.selected_index = 0;
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.selected_index = 0;
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Keep the selection inside a result list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }
}

fn filter_count(filter: StatusFilter, aggregate: &TaskAggregate) -> Option<usize> {
    match filter {
        StatusFilter::All => None,
        StatusFilter::Pending => Some(aggregate.pending),
        StatusFilter::InProgress => Some(aggregate.in_progress),
        StatusFilter::Completed => Some(aggregate.completed),
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.task_list;
    let aggregate = app.view.aggregate();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(3), // Search
            Constraint::Length(1), // Filters
            Constraint::Min(5),    // Tasks
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(" My Tasks", theme::heading())),
        Line::from(Span::styled(
            format!(
                " {} in progress, {} pending",
                aggregate.in_progress, aggregate.pending
            ),
            theme::muted(),
        )),
    ]);
    frame.render_widget(header, chunks[0]);

    render_field(
        frame,
        &state.search,
        "Search",
        "Search tasks or locations...",
        state.searching,
        false,
        chunks[1],
    );

    let titles: Vec<String> = StatusFilter::CYCLE
        .iter()
        .map(|filter| match filter_count(*filter, &aggregate) {
            Some(count) => format!("{} ({})", filter.label(), count),
            None => filter.label().to_string(),
        })
        .collect();
    let selected = StatusFilter::CYCLE
        .iter()
        .position(|f| *f == state.filter)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(theme::selected())
        .divider(" ");
    frame.render_widget(tabs, chunks[2]);

    let tasks = app.view.filter_tasks(&state.query());
    render_tasks(frame, &tasks, state, chunks[3]);

    let hints = if state.searching {
        " Type to search  Enter/Esc: done  Ctrl+U: clear"
    } else {
        " /: search  f/F or ←/→: filter  Enter: View Details"
    };
    frame.render_widget(Paragraph::new(hints).style(theme::muted()), chunks[4]);
}

fn render_tasks(frame: &mut Frame, tasks: &[&Task], state: &TaskListState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} tasks ", tasks.len()));

    if tasks.is_empty() {
        let hint = if state.search.is_empty() {
            "No tasks match this filter"
        } else {
            "Try a different search term"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No tasks found", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(hint, theme::muted())),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", task.status.label().to_uppercase()),
                        theme::badge(task.status.tone()),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        format!(" {} ", task.priority.label().to_uppercase()),
                        Style::default().fg(theme::tone_color(task.priority.tone())),
                    ),
                    Span::raw(" "),
                    Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(vec![
                    Span::styled(format!("   📍 {}", task.location.name), theme::muted()),
                    Span::raw(format!("  Progress {}%", task.progress.value())),
                    Span::raw(format!("  📷 {}", task.photos.len())),
                    Span::styled(
                        format!("  ⏱ {}", format_relative_due_time(task.due_date, now)),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_index.min(tasks.len() - 1)));
    frame.render_stateful_widget(list, area, &mut list_state);
}
