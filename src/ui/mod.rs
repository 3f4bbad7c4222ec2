pub mod chat;
pub mod dashboard;
pub mod dialogs;
pub mod login;
pub mod map;
mod running_tasks;
pub mod signup;
mod status_bar;
pub mod task_detail;
pub mod task_list;
pub mod text_input;
pub mod theme;
pub mod upload;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Tabs},
};

use crate::app::{App, Overlay};
use crate::route::{Route, Tab};

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: content area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.navigator.current() {
        Route::Login => login::render(frame, &app.login, main_chunks[0]),
        Route::Signup => signup::render(frame, &app.signup, main_chunks[0]),
        route => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(main_chunks[0]);

            render_tabs(frame, route, chunks[0]);

            match route {
                Route::Tab(Tab::Dashboard) => dashboard::render(frame, app, chunks[1]),
                Route::Tab(Tab::Tasks) => task_list::render(frame, app, chunks[1]),
                Route::Tab(Tab::Upload) => upload::render(frame, app, chunks[1]),
                Route::Tab(Tab::Map) => map::render(frame, app, chunks[1]),
                Route::Tab(Tab::Chat) => chat::render(frame, app, chunks[1]),
                Route::TaskDetail { .. } => task_detail::render(frame, app, chunks[1]),
                Route::Login | Route::Signup => {}
            }
        }
    }

    status_bar::render(frame, app, main_chunks[1]);

    match app.overlay {
        Some(Overlay::Help) => dialogs::render_help(frame, area),
        Some(Overlay::Alert(ref alert)) => dialogs::render_alert(frame, alert, area),
        Some(Overlay::Confirm(ref dialog)) => dialogs::render_confirm(frame, dialog, area),
        Some(Overlay::RunningTasks) => running_tasks::render(frame, app),
        None => {}
    }
}

fn render_tabs(frame: &mut Frame, route: &Route, area: Rect) {
    // Task detail sits on top of the task list
    let selected = match route {
        Route::Tab(tab) => tab.index(),
        _ => Tab::Tasks.index(),
    };

    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(idx, tab)| format!("{} {}", idx + 1, tab.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" WorkerTrack ")
                .title_style(theme::heading()),
        )
        .select(selected)
        .highlight_style(theme::selected())
        .divider("|");
    frame.render_widget(tabs, area);
}
