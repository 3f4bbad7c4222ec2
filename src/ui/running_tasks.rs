//! Overlay listing running background work, with per-task cancel.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use crate::app::App;
use crate::tasks::BackgroundTask;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 14.min(area.height.saturating_sub(4));
    let dialog_x = (area.width.saturating_sub(dialog_width)) / 2;
    let dialog_y = (area.height.saturating_sub(dialog_height)) / 2;
    let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Running Tasks ")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let running_tasks = app.task_manager.running_tasks();

    if running_tasks.is_empty() {
        let text = Paragraph::new("No tasks running\n\nPress Esc or T to close")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(text, inner);
        return;
    }

    let task_height: u16 = 3;
    let max_tasks = (inner.height.saturating_sub(1) / task_height) as usize;

    for (idx, task) in running_tasks.iter().take(max_tasks).enumerate() {
        let task_area = Rect::new(
            inner.x,
            inner.y + idx as u16 * task_height,
            inner.width,
            task_height,
        );
        render_task(frame, task, idx, task_area);
    }

    let help_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
    let help_text = Paragraph::new("1-9:cancel task  c:cancel all  Esc:close")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help_text, help_area);
}

fn render_task(frame: &mut Frame, task: &BackgroundTask, index: usize, area: Rect) {
    if area.height < 2 {
        return;
    }

    let header = format!(
        "[{}] {} ({}s)",
        index + 1,
        task.kind.display_name(),
        task.elapsed().as_secs()
    );
    frame.render_widget(
        Paragraph::new(header).style(Style::default().fg(Color::Cyan)),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let progress_area = Rect::new(area.x, area.y + 1, area.width, 1);
    match task.progress {
        Some(ref progress) => {
            let label = progress
                .message
                .clone()
                .unwrap_or_else(|| format!("{}/{}", progress.current, progress.total));
            let gauge = Gauge::default()
                .ratio(f64::from(progress.percent()) / 100.0)
                .label(label)
                .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray));
            frame.render_widget(gauge, progress_area);
        }
        None => {
            frame.render_widget(
                Paragraph::new("Starting...").style(Style::default().fg(Color::Yellow)),
                progress_area,
            );
        }
    }
}
