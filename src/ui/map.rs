use ratatui::{
    prelude::*,
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, List, ListItem, ListState, Paragraph,
    },
};

use super::theme;
use crate::app::App;
use crate::model::Location;

/// Tasks listed on a location card.
pub const CARD_TASKS: usize = 2;

/// Selection and view mode for the locations map.
#[derive(Debug, Clone, Default)]
pub struct MapState {
    pub list_view: bool,
    pub selected_index: usize,
    /// Whether the selected location's card is open.
    pub card_open: bool,
    /// Highlighted task on the open card.
    pub card_index: usize,
}

impl MapState {
    pub fn toggle_view(&mut self) {
        self.list_view = !self.list_view;
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
            self.card_index = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.card_index = 0;
        }
    }

    pub fn open_card(&mut self) {
        self.card_open = true;
        self.card_index = 0;
    }

    pub fn close_card(&mut self) {
        self.card_open = false;
    }

    pub fn next_card_task(&mut self, len: usize) {
        if len > 0 {
            self.card_index = (self.card_index + 1) % len;
        }
    }

    /// Select `location_id` and open its card. Unknown ids leave the map as is.
    pub fn focus_location(&mut self, location_id: &str, locations: &[Location]) {
        if let Some(idx) = locations.iter().position(|l| l.id == location_id) {
            self.selected_index = idx;
            self.open_card();
        }
    }
}

/// Lat/long bounds padded so edge pins stay inside the canvas.
fn bounds(locations: &[Location]) -> ([f64; 2], [f64; 2]) {
    if locations.is_empty() {
        return ([-1.0, 1.0], [-1.0, 1.0]);
    }
    let (mut min_lon, mut max_lon) = (f64::MAX, f64::MIN);
    let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
    for location in locations {
        min_lon = min_lon.min(location.longitude);
        max_lon = max_lon.max(location.longitude);
        min_lat = min_lat.min(location.latitude);
        max_lat = max_lat.max(location.latitude);
    }
    let pad_lon = ((max_lon - min_lon) * 0.15).max(0.001);
    let pad_lat = ((max_lat - min_lat) * 0.15).max(0.001);
    (
        [min_lon - pad_lon, max_lon + pad_lon],
        [min_lat - pad_lat, max_lat + pad_lat],
    )
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = &app.map;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(if state.card_open { 8 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(area);

    if state.list_view {
        render_list(frame, app, chunks[0]);
    } else {
        render_canvas(frame, app, chunks[0]);
    }

    if state.card_open {
        render_card(frame, app, chunks[1]);
    }

    let hints = if state.card_open {
        " Tab: next task  Enter: open task  d: directions  Esc: close"
    } else {
        " j/k: select  Enter: details  v: map/list  d: directions"
    };
    frame.render_widget(Paragraph::new(hints).style(theme::muted()), chunks[2]);
}

fn render_canvas(frame: &mut Frame, app: &App, area: Rect) {
    let locations = app.view.locations();
    let (x_bounds, y_bounds) = bounds(locations);
    let selected = app.map.selected_index;
    let radius = (x_bounds[1] - x_bounds[0]) * 0.02;

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" Work Locations "))
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for (idx, location) in locations.iter().enumerate() {
                let color = theme::tone_color(app.view.location_status(&location.id).tone());
                if idx == selected {
                    ctx.draw(&Circle {
                        x: location.longitude,
                        y: location.latitude,
                        radius,
                        color: Color::White,
                    });
                }
                ctx.print(
                    location.longitude,
                    location.latitude,
                    Span::styled("●", Style::default().fg(color)),
                );
                let label_style = if idx == selected {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    theme::muted()
                };
                ctx.print(
                    location.longitude + radius * 1.5,
                    location.latitude,
                    Span::styled(location.name.clone(), label_style),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .view
        .locations()
        .iter()
        .map(|location| {
            let status = app.view.location_status(&location.id);
            let count = app.view.tasks_for_location(&location.id).len();
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", status.label().to_uppercase()),
                        theme::badge(status.tone()),
                    ),
                    Span::raw(" "),
                    Span::styled(location.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {} tasks", count), theme::muted()),
                ]),
                Line::from(Span::styled(format!("   {}", location.address), theme::muted())),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Work Locations "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !app.view.locations().is_empty() {
        list_state.select(Some(app.map.selected_index));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_card(frame: &mut Frame, app: &App, area: Rect) {
    let Some(location) = app.view.locations().get(app.map.selected_index) else {
        return;
    };
    let status = app.view.location_status(&location.id);
    let tasks = app.view.tasks_for_location(&location.id);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(location.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!(" {} ", status.label().to_uppercase()), theme::badge(status.tone())),
        ]),
        Line::from(Span::styled(location.address.clone(), theme::muted())),
        Line::from(""),
    ];

    if tasks.is_empty() {
        lines.push(Line::from(Span::styled("No tasks at this location", theme::muted())));
    }
    for (idx, task) in tasks.iter().take(CARD_TASKS).enumerate() {
        let style = if idx == app.map.card_index {
            theme::selected()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", task.title), style),
            Span::raw(" "),
            Span::styled(task.status.label(), Style::default().fg(theme::tone_color(task.status.tone()))),
        ]));
    }

    let card = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::tone_color(status.tone()))),
    );
    frame.render_widget(card, area);
}
