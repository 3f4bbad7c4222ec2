use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph},
};

use super::text_input::{render_field, TextInput};
use super::theme;
use crate::app::App;
use crate::assistant::MAX_INPUT_LEN;
use crate::device::FileHandle;
use crate::model::WorkPhoto;
use crate::tasks::TaskKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiStatus {
    #[default]
    Idle,
    Scanning,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadFocus {
    #[default]
    Tasks,
    ImagePath,
    Caption,
    Submit,
}

impl UploadFocus {
    const ORDER: [UploadFocus; 4] = [
        UploadFocus::Tasks,
        UploadFocus::ImagePath,
        UploadFocus::Caption,
        UploadFocus::Submit,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Photo upload form with its verification and sync state.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub selected_task: Option<String>,
    /// Highlighted task chip.
    pub chip_index: usize,
    pub image_path: TextInput,
    pub image: Option<FileHandle>,
    pub caption: TextInput,
    pub focus: UploadFocus,
    pub ai_status: AiStatus,
    pub photo: Option<WorkPhoto>,
    pub uploading: bool,
}

impl UploadForm {
    pub fn new() -> Self {
        Self {
            selected_task: None,
            chip_index: 0,
            image_path: TextInput::new(),
            image: None,
            caption: TextInput::with_max_len(MAX_INPUT_LEN),
            focus: UploadFocus::Tasks,
            ai_status: AiStatus::Idle,
            photo: None,
            uploading: false,
        }
    }

    pub fn next_focus(&mut self) {
        let next = (self.focus.position() + 1) % UploadFocus::ORDER.len();
        self.focus = UploadFocus::ORDER[next];
    }

    pub fn previous_focus(&mut self) {
        let len = UploadFocus::ORDER.len();
        self.focus = UploadFocus::ORDER[(self.focus.position() + len - 1) % len];
    }

    /// True while keystrokes go to a text field.
    pub fn is_editing(&self) -> bool {
        matches!(self.focus, UploadFocus::ImagePath | UploadFocus::Caption)
    }

    pub fn next_chip(&mut self, len: usize) {
        if len > 0 {
            self.chip_index = (self.chip_index + 1) % len;
        }
    }

    pub fn previous_chip(&mut self, len: usize) {
        if len > 0 {
            self.chip_index = (self.chip_index + len - 1) % len;
        }
    }

    /// Submit needs a passed scan for the selected task, and no upload
    /// already running.
    pub fn can_submit(&self) -> bool {
        let photo_matches = match (&self.selected_task, &self.photo) {
            (Some(task_id), Some(photo)) => photo.task_id == *task_id,
            _ => false,
        };
        photo_matches && self.ai_status == AiStatus::Success && !self.uploading
    }

    /// Change the selected task. A picked image belongs to the task it was
    /// scanned for, so it is dropped when the task changes.
    /// Returns true when the image and verdict were discarded.
    pub fn select_task(&mut self, task_id: Option<String>) -> bool {
        if task_id == self.selected_task {
            return false;
        }
        self.selected_task = task_id;
        let had_image = self.image.is_some() || self.photo.is_some();
        if had_image || self.ai_status != AiStatus::Idle {
            self.abort();
        }
        had_image
    }

    pub fn caption(&self) -> Option<String> {
        let caption = self.caption.value().trim();
        (!caption.is_empty()).then(|| caption.to_string())
    }

    /// Drop the picked image and its verdict.
    pub fn abort(&mut self) {
        self.image = None;
        self.photo = None;
        self.ai_status = AiStatus::Idle;
    }

    /// Back to a blank form after a successful sync.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.upload;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(3), // Task chips
            Constraint::Length(3), // Image path
            Constraint::Length(if form.ai_status == AiStatus::Idle { 0 } else { 5 }),
            Constraint::Length(if form.uploading { 3 } else { 0 }),
            Constraint::Length(3), // Caption
            Constraint::Length(3), // Submit
            Constraint::Min(0),
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(Span::styled(" Upload Work", theme::heading())),
        Line::from(Span::styled(" Worker ID: #7712 - AI Verification", theme::muted())),
    ]);
    frame.render_widget(header, chunks[0]);

    render_chips(frame, app, chunks[1]);

    render_field(
        frame,
        &form.image_path,
        "Initiate Scan: image path (Enter: gallery, Ctrl+T: camera)",
        "~/Pictures/field.jpg",
        form.focus == UploadFocus::ImagePath,
        false,
        chunks[2],
    );

    if form.ai_status != AiStatus::Idle {
        render_ai_card(frame, app, chunks[3]);
    }

    if form.uploading {
        let percent = app
            .task_manager
            .progress_of(TaskKind::Upload)
            .map(|p| p.percent())
            .unwrap_or(0);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" SYNCING TO CLOUD... "))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
            .percent(u16::from(percent))
            .label(format!("{}%", percent));
        frame.render_widget(gauge, chunks[4]);
    }

    render_field(
        frame,
        &form.caption,
        "Notes",
        "Log additional notes...",
        form.focus == UploadFocus::Caption,
        false,
        chunks[5],
    );

    let label = if form.uploading {
        "PLEASE WAIT..."
    } else {
        "EXECUTE LOG PROTOCOL"
    };
    let style = match (form.can_submit(), form.focus == UploadFocus::Submit) {
        (true, true) => theme::selected(),
        (true, false) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        (false, _) => theme::muted(),
    };
    let border = if form.focus == UploadFocus::Submit {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let button = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(button, chunks[6]);

    let hints = if form.image.is_some() && !form.uploading {
        " Tab: next  ←/→: task  Ctrl+X: ABORT PROTOCOL"
    } else {
        " Tab: next  ←/→: task  Enter: select"
    };
    frame.render_widget(Paragraph::new(hints).style(theme::muted()), chunks[8]);
}

fn render_chips(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.upload;
    let tasks = app.view.uploadable_tasks();

    let mut spans = Vec::new();
    for (idx, task) in tasks.iter().enumerate() {
        let chosen = form.selected_task.as_deref() == Some(task.id.as_str());
        let mut style = if chosen {
            theme::selected()
        } else {
            Style::default()
        };
        if form.focus == UploadFocus::Tasks && idx == form.chip_index {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(format!(" {} ", task.title), style));
        spans.push(Span::raw(" "));
    }
    if spans.is_empty() {
        spans.push(Span::styled("No active tasks", theme::muted()));
    }

    let border = if form.focus == UploadFocus::Tasks {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let chips = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Active Protocol ")
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(chips, area);
}

fn render_ai_card(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.upload;
    let color = match form.ai_status {
        AiStatus::Scanning => Color::Cyan,
        AiStatus::Success => Color::Green,
        AiStatus::Failed => Color::Red,
        AiStatus::Idle => Color::DarkGray,
    };
    let title = if form.ai_status == AiStatus::Scanning {
        " COMPUTING... "
    } else {
        " ANALYSIS REPORT "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let verdict = if form.ai_status == AiStatus::Success {
        Span::styled("PASS", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("...", theme::muted())
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![Span::raw("OBJECT_VERIFICATION  "), verdict])),
        rows[0],
    );

    match form.ai_status {
        AiStatus::Scanning => {
            let ratio = app
                .task_manager
                .progress_of(TaskKind::AiScan)
                .map(|p| f64::from(p.percent()) / 100.0)
                .unwrap_or(0.0);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
                .ratio(ratio);
            frame.render_widget(gauge, rows[1]);
        }
        AiStatus::Failed => {
            frame.render_widget(
                Paragraph::new("REASON: INSUFFICIENT LIGHTING / BLUR").style(Style::default().fg(Color::Red)),
                rows[1],
            );
        }
        AiStatus::Success => {
            if let Some(analysis) = form.photo.as_ref().and_then(|p| p.ai_analysis.as_ref()) {
                frame.render_widget(
                    Paragraph::new(format!(
                        "{}  confidence {}%",
                        analysis.category, analysis.confidence
                    )),
                    rows[1],
                );
                frame.render_widget(
                    Paragraph::new(analysis.details.join(" · ")).style(theme::muted()),
                    rows[2],
                );
            }
        }
        AiStatus::Idle => {}
    }
}
