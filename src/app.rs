use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::assistant::{typing_delay, Assistant, Conversation};
use crate::config::Config;
use crate::device::{
    Directions, FileHandle, FsGallery, FsPhotoStore, Gallery, ImagePicker, ImageSource,
    PathImagePicker, PhotoStore, SystemDirections,
};
use crate::model::Seed;
use crate::route::{Navigator, Route, Screen, Tab};
use crate::session::Session;
use crate::tasks::{BackgroundTaskManager, TaskCompletionInfo, TaskKind, TaskOutcome};
use crate::ui;
use crate::ui::chat::ChatState;
use crate::ui::dashboard::DashboardState;
use crate::ui::dialogs::{Alert, ConfirmAction, ConfirmDialog};
use crate::ui::login::LoginForm;
use crate::ui::map::{MapState, CARD_TASKS};
use crate::ui::signup::{SignupField, SignupForm};
use crate::ui::task_detail::TaskDetailState;
use crate::ui::task_list::TaskListState;
use crate::ui::upload::{AiStatus, UploadFocus, UploadForm};
use crate::verify::{self, VerificationRequest};
use crate::view::TaskCollectionView;

/// Modal layer drawn above the current screen; it takes all key input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
    Alert(Alert),
    Confirm(ConfirmDialog),
    RunningTasks,
}

/// Device capabilities the screens call into.
pub struct Devices {
    pub photo_store: Arc<dyn PhotoStore>,
    pub gallery: Arc<dyn Gallery>,
    pub picker: Box<dyn ImagePicker>,
    pub directions: Box<dyn Directions>,
}

impl Devices {
    pub fn from_config(config: &Config) -> Self {
        Self {
            photo_store: Arc::new(FsPhotoStore::new(config.storage.photo_dir.clone())),
            gallery: Arc::new(FsGallery::new(
                config.gallery.enabled,
                config.gallery.path.clone(),
            )),
            picker: Box::new(PathImagePicker::new(
                config.storage.capture_dir.clone(),
                config.storage.image_extensions.clone(),
            )),
            directions: Box::new(SystemDirections::new(config.map.directions_command.clone())),
        }
    }
}

pub struct App {
    pub config: Config,
    pub view: TaskCollectionView,
    pub session: Session,
    pub navigator: Navigator,
    pub task_manager: BackgroundTaskManager,
    pub assistant: Assistant,
    devices: Devices,
    // Screen state
    pub login: LoginForm,
    pub signup: SignupForm,
    pub dashboard: DashboardState,
    pub task_list: TaskListState,
    pub detail: TaskDetailState,
    pub map: MapState,
    pub upload: UploadForm,
    pub chat: ChatState,
    pub overlay: Option<Overlay>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, seed: Seed, devices: Devices) -> Self {
        Self {
            config,
            view: TaskCollectionView::new(seed),
            session: Session::guest(),
            navigator: Navigator::new(Route::Login),
            task_manager: BackgroundTaskManager::new(),
            assistant: Assistant::default(),
            devices,
            login: LoginForm::new(),
            signup: SignupForm::new(),
            dashboard: DashboardState::default(),
            task_list: TaskListState::new(),
            detail: TaskDetailState::default(),
            map: MapState::default(),
            upload: UploadForm::new(),
            chat: ChatState::new(Conversation::new(Utc::now())),
            overlay: None,
            status_message: None,
            should_quit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.process_task_updates();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key)?,
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        self.task_manager.cancel_all();
        Ok(())
    }

    /// Apply finished background work to the screen that started it.
    pub fn process_task_updates(&mut self) {
        for completion in self.task_manager.poll_updates() {
            self.apply_completion(completion);
        }
    }

    fn apply_completion(&mut self, info: TaskCompletionInfo) {
        if info.scope != self.navigator.current().screen() {
            tracing::debug!(task = info.kind.display_name(), "Dropping result for a screen that was left");
            return;
        }

        match info.outcome {
            Some(TaskOutcome::Verified(photo)) => {
                tracing::info!(task = %photo.task_id, photo = %photo.id, "AI verification passed");
                self.upload.photo = Some(*photo);
                self.upload.ai_status = AiStatus::Success;
            }
            Some(TaskOutcome::Uploaded) => {
                tracing::info!(task = ?self.upload.selected_task, "Work log synced");
                self.upload.reset();
                self.overlay = Some(Overlay::Alert(Alert::info("Sync Successful", info.message)));
            }
            Some(TaskOutcome::ChatReply(text)) => {
                self.chat.conversation.receive(text, Utc::now());
                self.chat.typing = false;
            }
            Some(TaskOutcome::ProgressUpdated) => {
                self.detail.updating = false;
                self.overlay = Some(Overlay::Alert(Alert::info("Progress Updated", info.message)));
            }
            Some(TaskOutcome::SignupComplete) => {
                self.signup = SignupForm::new();
                self.reset_to(Route::Login);
            }
            Some(TaskOutcome::Refreshed) => {
                self.dashboard.refreshing = false;
                self.status_message = Some(format!("{}: {}", info.kind.display_name(), info.message));
            }
            None => {
                tracing::warn!(task = info.kind.display_name(), error = %info.message, "Background task failed");
                self.reset_in_flight(info.kind);
                if info.kind == TaskKind::AiScan {
                    self.upload.ai_status = AiStatus::Failed;
                    self.overlay = Some(Overlay::Alert(Alert::error(
                        verify::FAILURE_TITLE,
                        verify::FAILURE_MESSAGE,
                    )));
                } else {
                    self.status_message = Some(format!("{} - {}", info.kind.display_name(), info.message));
                }
            }
        }
    }

    /// Clear the "busy" markers a task of `kind` sets on its screen.
    fn reset_in_flight(&mut self, kind: TaskKind) {
        match kind {
            TaskKind::AiScan => {
                if self.upload.ai_status == AiStatus::Scanning {
                    self.upload.abort();
                }
            }
            TaskKind::Upload => self.upload.uploading = false,
            TaskKind::ChatReply => self.chat.typing = false,
            TaskKind::ProgressUpdate => self.detail.updating = false,
            TaskKind::SignupCelebration => self.signup.celebrating = false,
            TaskKind::Refresh => self.dashboard.refreshing = false,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // --- Navigation ---

    fn leave(&mut self, screen: Screen) {
        self.task_manager.cancel_scope(screen);
        for kind in TaskKind::ALL {
            if kind.owner() == screen {
                self.reset_in_flight(kind);
            }
        }
    }

    fn enter(&mut self) {
        let route = self.navigator.current().clone();
        tracing::debug!(?route, "Entered screen");
        if let Route::TaskDetail { task_id } = route {
            if self.view.task(&task_id).is_none() {
                tracing::warn!(task = %task_id, "Opened detail for unknown task");
            }
            self.detail = TaskDetailState::new(task_id);
        }
    }

    pub fn navigate(&mut self, route: Route) {
        let logged_in = self.session.is_logged_in();
        if let Some(left) = self.navigator.push(route, logged_in) {
            self.leave(left);
            self.enter();
        }
    }

    /// Show a tab, dropping any screens stacked on top of the tabs.
    pub fn switch_tab(&mut self, tab: Tab) {
        while let Some(left) = self.navigator.back() {
            self.leave(left);
        }
        let logged_in = self.session.is_logged_in();
        if let Some(left) = self.navigator.replace(Route::Tab(tab), logged_in) {
            self.leave(left);
        }
        self.enter();
    }

    pub fn go_back(&mut self) {
        if let Some(left) = self.navigator.back() {
            self.leave(left);
            self.enter();
        }
    }

    fn reset_to(&mut self, route: Route) {
        for left in self.navigator.reset_to(route) {
            self.leave(left);
        }
        self.enter();
    }

    // --- Key handling ---

    /// Whether keystrokes currently go to a text field.
    fn is_editing(&self) -> bool {
        match self.navigator.current().screen() {
            Screen::Login | Screen::Signup => true,
            Screen::Tasks => self.task_list.searching,
            Screen::Upload => self.upload.is_editing(),
            Screen::Chat => self.chat.editing,
            Screen::Dashboard | Screen::Map | Screen::TaskDetail => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Ok(());
        }

        self.status_message = None;

        if self.overlay.is_some() {
            return self.handle_overlay_key(key);
        }

        if !self.is_editing() {
            match key.code {
                KeyCode::Char('?') => {
                    self.overlay = Some(Overlay::Help);
                    return Ok(());
                }
                KeyCode::Char('q') => {
                    self.quit();
                    return Ok(());
                }
                KeyCode::Char('T') => {
                    self.overlay = Some(Overlay::RunningTasks);
                    return Ok(());
                }
                KeyCode::Char(c @ '1'..='5') => {
                    let idx = c as usize - '1' as usize;
                    self.switch_tab(Tab::ALL[idx]);
                    return Ok(());
                }
                _ => {}
            }
        }

        match self.navigator.current().screen() {
            Screen::Login => self.handle_login_key(key),
            Screen::Signup => self.handle_signup_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Tasks => self.handle_task_list_key(key),
            Screen::TaskDetail => self.handle_detail_key(key),
            Screen::Map => self.handle_map_key(key),
            Screen::Upload => self.handle_upload_key(key),
            Screen::Chat => self.handle_chat_key(key),
        }
        Ok(())
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(overlay) = self.overlay.take() else {
            return Ok(());
        };

        match overlay {
            Overlay::Help => {}
            Overlay::Alert(alert) => {
                if !matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.overlay = Some(Overlay::Alert(alert));
                }
            }
            Overlay::Confirm(mut dialog) => match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                    dialog.toggle();
                    self.overlay = Some(Overlay::Confirm(dialog));
                }
                KeyCode::Enter => {
                    if dialog.confirm_selected {
                        self.confirm(dialog.action);
                    }
                }
                KeyCode::Char('y') => self.confirm(dialog.action),
                KeyCode::Esc | KeyCode::Char('n') => {}
                _ => self.overlay = Some(Overlay::Confirm(dialog)),
            },
            Overlay::RunningTasks => match key.code {
                KeyCode::Esc | KeyCode::Char('T') => {}
                KeyCode::Char('c') => {
                    let kinds: Vec<TaskKind> = self.task_manager.running_tasks().iter().map(|t| t.kind).collect();
                    self.task_manager.cancel_all();
                    for kind in kinds {
                        self.reset_in_flight(kind);
                    }
                    self.status_message = Some("All tasks cancelled".to_string());
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let idx = c as usize - '1' as usize;
                    let target = self
                        .task_manager
                        .running_tasks()
                        .get(idx)
                        .map(|t| (t.id, t.kind));
                    if let Some((id, kind)) = target {
                        self.task_manager.cancel_task(id);
                        self.reset_in_flight(kind);
                        self.status_message = Some(format!("Cancelled {}", kind.display_name()));
                    }
                    self.overlay = Some(Overlay::RunningTasks);
                }
                _ => self.overlay = Some(Overlay::RunningTasks),
            },
        }
        Ok(())
    }

    fn confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::Logout => self.logout(),
            ConfirmAction::CompleteTask => {
                tracing::info!(task = %self.detail.task_id, "Task marked complete");
                self.overlay = Some(Overlay::Alert(Alert::info("Success", "Task marked as complete!")));
            }
        }
    }

    fn show_error(&mut self, title: &str, message: impl Into<String>) {
        self.overlay = Some(Overlay::Alert(Alert::error(title, message)));
    }

    // --- Auth ---

    fn handle_login_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('n') {
                self.navigate(Route::Signup);
            }
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.login.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.login.previous_field(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => self.login.focused_input().backspace(),
            KeyCode::Left => self.login.focused_input().move_cursor_left(),
            KeyCode::Right => self.login.focused_input().move_cursor_right(),
            KeyCode::Char(c) => self.login.focused_input().handle_char(c),
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        match self.session.login(&self.login.credentials()) {
            Ok(()) => {
                self.login = LoginForm::new();
                self.reset_to(Route::Tab(Tab::Dashboard));
            }
            Err(e) => {
                tracing::debug!("Login rejected: {}", e);
                self.show_error("Quest Error", e.to_string());
            }
        }
    }

    fn handle_signup_key(&mut self, key: KeyEvent) {
        if self.signup.celebrating || key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }

        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Tab | KeyCode::Down => self.signup.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.signup.previous_field(),
            KeyCode::Enter => self.submit_signup(),
            KeyCode::Left if self.signup.focus == SignupField::Avatar => self.signup.previous_avatar(),
            KeyCode::Right if self.signup.focus == SignupField::Avatar => self.signup.next_avatar(),
            code => {
                if let Some(input) = self.signup.focused_input() {
                    match code {
                        KeyCode::Backspace => input.backspace(),
                        KeyCode::Left => input.move_cursor_left(),
                        KeyCode::Right => input.move_cursor_right(),
                        KeyCode::Char(c) => input.handle_char(c),
                        _ => {}
                    }
                }
            }
        }
    }

    fn submit_signup(&mut self) {
        let registration = self.signup.registration();
        if let Err(e) = registration.validate() {
            self.show_error("Quest Error", e.to_string());
            return;
        }

        tracing::info!(hero = %registration.hero_name.trim(), avatar = registration.avatar_glyph(), "Hero registered");
        self.signup.celebrating = true;

        let delay = self.config.simulation.signup_delay();
        let (_id, tx, cancel_flag) = self
            .task_manager
            .register_task(TaskKind::SignupCelebration, Screen::Signup);
        std::thread::spawn(move || {
            verify::run_delayed(delay, "Quest ready", TaskOutcome::SignupComplete, tx, &cancel_flag);
        });
    }

    fn logout(&mut self) {
        self.task_manager.cancel_all();
        self.session.logout();
        self.dashboard = DashboardState::default();
        self.task_list = TaskListState::new();
        self.map = MapState::default();
        self.upload = UploadForm::new();
        self.chat = ChatState::new(Conversation::new(Utc::now()));
        self.reset_to(Route::Login);
    }

    // --- Dashboard ---

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        let job_count = self.view.active_tasks().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.dashboard.move_down(job_count),
            KeyCode::Char('k') | KeyCode::Up => self.dashboard.move_up(),
            KeyCode::Enter => {
                let task_id = self
                    .view
                    .active_tasks()
                    .get(self.dashboard.selected_index)
                    .map(|t| t.id.clone());
                if let Some(task_id) = task_id {
                    self.navigate(Route::TaskDetail { task_id });
                }
            }
            KeyCode::Char('a') => self.switch_tab(Tab::Tasks),
            KeyCode::Char('r') => self.start_refresh(),
            KeyCode::Char('L') => {
                self.overlay = Some(Overlay::Confirm(ConfirmDialog::new(ConfirmAction::Logout)));
            }
            _ => {}
        }
    }

    fn start_refresh(&mut self) {
        if self.task_manager.is_running(TaskKind::Refresh) {
            return;
        }
        self.dashboard.refreshing = true;

        let delay = self.config.simulation.refresh();
        let (_id, tx, cancel_flag) = self.task_manager.register_task(TaskKind::Refresh, Screen::Dashboard);
        std::thread::spawn(move || {
            verify::run_delayed(delay, "Dashboard up to date", TaskOutcome::Refreshed, tx, &cancel_flag);
        });
    }

    // --- Tasks ---

    fn handle_task_list_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('u') {
            self.task_list.clear_search();
            return;
        }

        if self.task_list.searching {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.task_list.searching = false,
                KeyCode::Backspace => {
                    self.task_list.search.backspace();
                    self.task_list.selected_index = 0;
                }
                KeyCode::Left => self.task_list.search.move_cursor_left(),
                KeyCode::Right => self.task_list.search.move_cursor_right(),
                KeyCode::Char(c) if !ctrl => {
                    self.task_list.search.handle_char(c);
                    self.task_list.selected_index = 0;
                }
                _ => {}
            }
            return;
        }

        let results: Vec<String> = self
            .view
            .filter_tasks(&self.task_list.query())
            .iter()
            .map(|t| t.id.clone())
            .collect();
        self.task_list.clamp(results.len());

        match key.code {
            KeyCode::Char('/') => self.task_list.searching = true,
            KeyCode::Char('j') | KeyCode::Down => self.task_list.move_down(results.len()),
            KeyCode::Char('k') | KeyCode::Up => self.task_list.move_up(),
            KeyCode::Char('f') | KeyCode::Right | KeyCode::Tab => self.task_list.next_filter(),
            KeyCode::Char('F') | KeyCode::Left | KeyCode::BackTab => self.task_list.previous_filter(),
            KeyCode::Esc => self.task_list.clear_search(),
            KeyCode::Enter => {
                if let Some(task_id) = results.get(self.task_list.selected_index).cloned() {
                    self.navigate(Route::TaskDetail { task_id });
                }
            }
            _ => {}
        }
    }

    // --- Task detail ---

    fn handle_detail_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Backspace) {
            self.go_back();
            return;
        }

        let Some(task) = self.view.task(&self.detail.task_id) else {
            return;
        };
        let task_id = task.id.clone();
        let location_id = task.location.id.clone();
        let uploadable = self.view.uploadable_tasks().iter().any(|t| t.id == task_id);

        match key.code {
            KeyCode::Char('u') => self.start_progress_update(),
            KeyCode::Char('c') => {
                self.overlay = Some(Overlay::Confirm(ConfirmDialog::new(ConfirmAction::CompleteTask)));
            }
            KeyCode::Char('m') => {
                self.switch_tab(Tab::Map);
                self.map.focus_location(&location_id, self.view.locations());
            }
            KeyCode::Char('p') => {
                self.switch_tab(Tab::Upload);
                if uploadable {
                    self.select_upload_task(Some(task_id));
                }
            }
            _ => {}
        }
    }

    fn start_progress_update(&mut self) {
        if self.detail.updating {
            return;
        }
        self.detail.updating = true;

        let delay = self.config.simulation.progress_update();
        let (_id, tx, cancel_flag) = self
            .task_manager
            .register_task(TaskKind::ProgressUpdate, Screen::TaskDetail);
        std::thread::spawn(move || {
            verify::run_delayed(
                delay,
                "Task progress has been updated successfully!",
                TaskOutcome::ProgressUpdated,
                tx,
                &cancel_flag,
            );
        });
    }

    // --- Map ---

    fn handle_map_key(&mut self, key: KeyEvent) {
        let location_count = self.view.locations().len();
        let selected = self
            .view
            .locations()
            .get(self.map.selected_index)
            .map(|l| (l.id.clone(), l.name.clone(), l.address.clone()));

        match key.code {
            KeyCode::Char('v') => self.map.toggle_view(),
            KeyCode::Char('j') | KeyCode::Down => self.map.move_down(location_count),
            KeyCode::Char('k') | KeyCode::Up => self.map.move_up(),
            KeyCode::Esc => self.map.close_card(),
            KeyCode::Tab if self.map.card_open => {
                if let Some((ref id, _, _)) = selected {
                    let shown = self.view.tasks_for_location(id).len().min(CARD_TASKS);
                    self.map.next_card_task(shown);
                }
            }
            KeyCode::Enter => {
                if !self.map.card_open {
                    if selected.is_some() {
                        self.map.open_card();
                    }
                    return;
                }
                let task_id = selected.as_ref().and_then(|(id, _, _)| {
                    self.view
                        .tasks_for_location(id)
                        .into_iter()
                        .take(CARD_TASKS)
                        .nth(self.map.card_index)
                        .map(|t| t.id.clone())
                });
                if let Some(task_id) = task_id {
                    self.navigate(Route::TaskDetail { task_id });
                }
            }
            KeyCode::Char('d') => {
                if let Some((_, name, address)) = selected {
                    match self.devices.directions.open_external_directions(&address) {
                        Ok(()) => self.status_message = Some(format!("Opening directions to {}", name)),
                        Err(e) => {
                            tracing::error!(location = %name, error = %e, "Failed to open directions");
                            self.show_error("Directions", e.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // --- Upload ---

    fn handle_upload_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('t') => self.pick_image(ImageSource::Camera),
                KeyCode::Char('x') => self.abort_scan(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.upload.next_focus();
                return;
            }
            KeyCode::BackTab => {
                self.upload.previous_focus();
                return;
            }
            _ => {}
        }

        match self.upload.focus {
            UploadFocus::Tasks => {
                let tasks: Vec<String> = self.view.uploadable_tasks().iter().map(|t| t.id.clone()).collect();
                match key.code {
                    KeyCode::Right | KeyCode::Char('l') => self.upload.next_chip(tasks.len()),
                    KeyCode::Left | KeyCode::Char('h') => self.upload.previous_chip(tasks.len()),
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        if !self.upload.uploading {
                            self.select_upload_task(tasks.get(self.upload.chip_index).cloned());
                        }
                    }
                    _ => {}
                }
            }
            UploadFocus::ImagePath => match key.code {
                KeyCode::Enter => self.pick_image(ImageSource::Gallery),
                KeyCode::Esc => self.upload.focus = UploadFocus::Tasks,
                KeyCode::Backspace => self.upload.image_path.backspace(),
                KeyCode::Left => self.upload.image_path.move_cursor_left(),
                KeyCode::Right => self.upload.image_path.move_cursor_right(),
                KeyCode::Char(c) => self.upload.image_path.handle_char(c),
                _ => {}
            },
            UploadFocus::Caption => match key.code {
                KeyCode::Enter => self.upload.next_focus(),
                KeyCode::Esc => self.upload.focus = UploadFocus::Tasks,
                KeyCode::Backspace => self.upload.caption.backspace(),
                KeyCode::Left => self.upload.caption.move_cursor_left(),
                KeyCode::Right => self.upload.caption.move_cursor_right(),
                KeyCode::Char(c) => self.upload.caption.handle_char(c),
                _ => {}
            },
            UploadFocus::Submit => {
                if key.code == KeyCode::Enter {
                    self.submit_upload();
                }
            }
        }
    }

    fn pick_image(&mut self, source: ImageSource) {
        if self.upload.uploading {
            return;
        }
        if self.task_manager.is_running(TaskKind::AiScan) {
            self.status_message = Some("Scan already running".to_string());
            return;
        }
        let Some(task_id) = self.upload.selected_task.clone() else {
            self.status_message = Some("Select a task first".to_string());
            return;
        };

        match self.devices.picker.pick_image(source, self.upload.image_path.value()) {
            Ok(Some(image)) => self.start_scan(image, task_id),
            Ok(None) => self.status_message = Some("No image selected".to_string()),
            Err(e) => {
                tracing::error!(?source, error = %e, "Image pick failed");
                self.show_error("Source", e.to_string());
            }
        }
    }

    fn start_scan(&mut self, image: FileHandle, task_id: String) {
        tracing::info!(task = %task_id, image = %image.path().display(), "Starting AI verification");
        self.upload.image_path.set(&image.path().to_string_lossy());
        self.upload.image = Some(image.clone());
        self.upload.photo = None;
        self.upload.ai_status = AiStatus::Scanning;

        let request = VerificationRequest {
            image,
            task_id,
            caption: self.upload.caption(),
        };
        let store = Arc::clone(&self.devices.photo_store);
        let gallery = Arc::clone(&self.devices.gallery);
        let scan_delay = self.config.simulation.scan_delay();
        let (_id, tx, cancel_flag) = self.task_manager.register_task(TaskKind::AiScan, Screen::Upload);

        std::thread::spawn(move || {
            verify::run_verification(request, store.as_ref(), gallery.as_ref(), scan_delay, tx, &cancel_flag);
        });
    }

    fn cancel_scans(&mut self) {
        let running: Vec<_> = self
            .task_manager
            .running_tasks()
            .iter()
            .filter(|t| t.kind == TaskKind::AiScan)
            .map(|t| t.id)
            .collect();
        for id in running {
            self.task_manager.cancel_task(id);
        }
    }

    fn abort_scan(&mut self) {
        if self.upload.uploading || self.upload.image.is_none() {
            return;
        }
        self.cancel_scans();
        self.upload.abort();
        self.status_message = Some("Protocol aborted".to_string());
    }

    /// Switch the upload target; evidence scanned for another task is dropped.
    fn select_upload_task(&mut self, task_id: Option<String>) {
        if task_id == self.upload.selected_task {
            return;
        }
        self.cancel_scans();
        if self.upload.select_task(task_id) {
            self.status_message = Some("Task changed, scan the photo again".to_string());
        }
    }

    fn submit_upload(&mut self) {
        if !self.upload.can_submit() {
            self.status_message = Some("Select a task and pass the AI scan first".to_string());
            return;
        }
        self.upload.uploading = true;

        let sim = &self.config.simulation;
        let (duration, tick, step) = (sim.upload_duration(), sim.upload_tick(), sim.upload_step_percent);
        let (_id, tx, cancel_flag) = self.task_manager.register_task(TaskKind::Upload, Screen::Upload);
        std::thread::spawn(move || {
            verify::run_upload(duration, tick, step, tx, &cancel_flag);
        });
    }

    // --- Chat ---

    fn handle_chat_key(&mut self, key: KeyEvent) {
        if self.chat.editing {
            match key.code {
                KeyCode::Esc => self.chat.editing = false,
                KeyCode::Enter => {
                    let text = self.chat.input.value().to_string();
                    self.send_chat(&text);
                }
                KeyCode::Backspace => self.chat.input.backspace(),
                KeyCode::Left => self.chat.input.move_cursor_left(),
                KeyCode::Right => self.chat.input.move_cursor_right(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.chat.input.handle_char(c)
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('i') => self.chat.editing = true,
            KeyCode::Tab if self.chat.conversation.show_quick_prompts() => self.chat.next_prompt(),
            KeyCode::Esc => self.chat.prompt_index = None,
            KeyCode::Enter => match self.chat.selected_prompt() {
                Some(prompt) => self.send_chat(prompt),
                None => self.chat.editing = true,
            },
            _ => {}
        }
    }

    fn send_chat(&mut self, text: &str) {
        if self.chat.typing {
            self.status_message = Some("Assistant is typing...".to_string());
            return;
        }
        let Some(message) = self.chat.conversation.send(text, Utc::now()) else {
            return;
        };
        self.chat.input.clear();
        self.chat.prompt_index = None;
        self.chat.typing = true;

        let reply = self.assistant.respond(&message).to_string();
        let sim = &self.config.simulation;
        let delay = typing_delay(sim.typing_delay(), sim.typing_jitter());
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Assistant reply scheduled");

        let (_id, tx, cancel_flag) = self.task_manager.register_task(TaskKind::ChatReply, Screen::Chat);
        std::thread::spawn(move || {
            verify::run_delayed(delay, "Reply received", TaskOutcome::ChatReply(reply), tx, &cancel_flag);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingDirections(Arc<Mutex<Vec<String>>>);

    impl Directions for RecordingDirections {
        fn open_external_directions(&self, address: &str) -> Result<(), DeviceError> {
            self.0.lock().unwrap().push(address.to_string());
            Ok(())
        }
    }

    struct Harness {
        app: App,
        dir: TempDir,
        opened: Arc<Mutex<Vec<String>>>,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.photo_dir = Some(dir.path().join("photos"));
        config.storage.capture_dir = None;
        config.gallery.enabled = false;
        config.simulation.scan_delay_ms = 10;
        config.simulation.upload_duration_ms = 20;
        config.simulation.upload_tick_ms = 1;
        config.simulation.typing_delay_ms = 5;
        config.simulation.typing_jitter_ms = 0;
        config.simulation.progress_update_ms = 5;
        config.simulation.signup_delay_ms = 5;
        config.simulation.refresh_ms = 5;

        let opened = Arc::new(Mutex::new(Vec::new()));
        let devices = Devices {
            photo_store: Arc::new(FsPhotoStore::new(config.storage.photo_dir.clone())),
            gallery: Arc::new(FsGallery::new(false, None)),
            picker: Box::new(PathImagePicker::new(None, config.storage.image_extensions.clone())),
            directions: Box::new(RecordingDirections(Arc::clone(&opened))),
        };

        Harness {
            app: App::new(config, Seed::demo(Utc::now()), devices),
            dir,
            opened,
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn ctrl(app: &mut App, c: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Poll until no background work is left.
    fn settle(app: &mut App) {
        for _ in 0..400 {
            app.process_task_updates();
            if !app.task_manager.has_running_tasks() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("background tasks did not finish");
    }

    fn login(app: &mut App) {
        type_text(app, "Ahmad Razak");
        press(app, KeyCode::Tab);
        type_text(app, "ahmad@estate.com");
        press(app, KeyCode::Tab);
        type_text(app, "secret");
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_starts_on_login_and_digits_type_into_form() {
        let mut h = harness();
        assert_eq!(h.app.navigator.current(), &Route::Login);
        press(&mut h.app, KeyCode::Char('2'));
        press(&mut h.app, KeyCode::Char('q'));
        assert_eq!(h.app.navigator.current(), &Route::Login);
        assert_eq!(h.app.login.name.value(), "2q");
        assert!(!h.app.should_quit);
    }

    #[test]
    fn test_login_with_missing_fields_shows_alert() {
        let mut h = harness();
        type_text(&mut h.app, "Ahmad");
        press(&mut h.app, KeyCode::Enter);

        match h.app.overlay {
            Some(Overlay::Alert(ref alert)) => {
                assert_eq!(alert.title, "Quest Error");
                assert_eq!(alert.message, "Please enter your Player Name, Email, and Code!");
            }
            ref other => panic!("expected alert, got {:?}", other),
        }
        assert!(!h.app.session.is_logged_in());

        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.overlay.is_none());
    }

    #[test]
    fn test_login_lands_on_dashboard() {
        let mut h = harness();
        login(&mut h.app);
        assert!(h.app.session.is_logged_in());
        assert_eq!(h.app.session.display_name(), "Ahmad");
        assert_eq!(h.app.navigator.current(), &Route::Tab(Tab::Dashboard));
        assert!(!h.app.navigator.can_go_back());
        assert!(h.app.login.name.is_empty());
    }

    #[test]
    fn test_tabs_and_detail_back_stack() {
        let mut h = harness();
        login(&mut h.app);

        press(&mut h.app, KeyCode::Char('2'));
        assert_eq!(h.app.navigator.current(), &Route::Tab(Tab::Tasks));

        press(&mut h.app, KeyCode::Enter);
        assert_eq!(
            h.app.navigator.current(),
            &Route::TaskDetail {
                task_id: "t1".to_string()
            }
        );

        press(&mut h.app, KeyCode::Esc);
        assert_eq!(h.app.navigator.current(), &Route::Tab(Tab::Tasks));
    }

    #[test]
    fn test_task_search_narrows_results() {
        let mut h = harness();
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('2'));
        press(&mut h.app, KeyCode::Char('/'));
        type_text(&mut h.app, "nursery");
        press(&mut h.app, KeyCode::Enter);

        let results: Vec<(String, String)> = h
            .app
            .view
            .filter_tasks(&h.app.task_list.query())
            .iter()
            .map(|t| (t.id.clone(), t.location.name.clone()))
            .collect();
        assert!(!results.is_empty());
        assert!(results.iter().all(|(_, location)| location == "Estate Nursery"));

        press(&mut h.app, KeyCode::Enter);
        assert_eq!(
            h.app.navigator.current(),
            &Route::TaskDetail {
                task_id: results[0].0.clone()
            }
        );
    }

    #[test]
    fn test_unknown_task_detail_ignores_actions() {
        let mut h = harness();
        login(&mut h.app);
        h.app.navigate(Route::TaskDetail {
            task_id: "missing".to_string(),
        });
        assert_eq!(h.app.detail.task_id, "missing");

        press(&mut h.app, KeyCode::Char('u'));
        press(&mut h.app, KeyCode::Char('c'));
        assert!(!h.app.task_manager.has_running_tasks());
        assert!(h.app.overlay.is_none());
    }

    #[test]
    fn test_progress_update_shows_alert() {
        let mut h = harness();
        login(&mut h.app);
        press(&mut h.app, KeyCode::Enter);
        press(&mut h.app, KeyCode::Char('u'));
        assert!(h.app.detail.updating);

        settle(&mut h.app);
        assert!(!h.app.detail.updating);
        assert!(matches!(
            h.app.overlay,
            Some(Overlay::Alert(ref alert)) if alert.title == "Progress Updated"
        ));
    }

    #[test]
    fn test_leaving_chat_cancels_pending_reply() {
        let mut h = harness();
        h.app.config.simulation.typing_delay_ms = 5_000;
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('5'));
        press(&mut h.app, KeyCode::Char('i'));
        type_text(&mut h.app, "rain today?");
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.chat.typing);
        assert!(h.app.task_manager.is_running(TaskKind::ChatReply));

        press(&mut h.app, KeyCode::Esc);
        press(&mut h.app, KeyCode::Char('1'));
        assert!(!h.app.task_manager.has_running_tasks());
        assert!(!h.app.chat.typing);
        assert_eq!(h.app.chat.conversation.messages().len(), 2);
    }

    #[test]
    fn test_quick_prompt_gets_reply() {
        let mut h = harness();
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('5'));
        press(&mut h.app, KeyCode::Tab);
        press(&mut h.app, KeyCode::Enter);

        settle(&mut h.app);
        let messages = h.app.chat.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[2].text.starts_with("For FFB harvesting"));
        assert!(!h.app.chat.conversation.show_quick_prompts());
    }

    #[test]
    fn test_logout_requires_confirmation() {
        let mut h = harness();
        login(&mut h.app);

        press(&mut h.app, KeyCode::Char('L'));
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.session.is_logged_in());

        press(&mut h.app, KeyCode::Char('L'));
        press(&mut h.app, KeyCode::Right);
        press(&mut h.app, KeyCode::Enter);
        assert!(!h.app.session.is_logged_in());
        assert_eq!(h.app.navigator.current(), &Route::Login);
    }

    #[test]
    fn test_signup_returns_to_login() {
        let mut h = harness();
        ctrl(&mut h.app, 'n');
        assert_eq!(h.app.navigator.current(), &Route::Signup);

        press(&mut h.app, KeyCode::Enter);
        assert!(matches!(h.app.overlay, Some(Overlay::Alert(_))));
        press(&mut h.app, KeyCode::Esc);

        press(&mut h.app, KeyCode::Right);
        press(&mut h.app, KeyCode::Tab);
        type_text(&mut h.app, "Siti");
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.signup.celebrating);

        settle(&mut h.app);
        assert_eq!(h.app.navigator.current(), &Route::Login);
        assert!(!h.app.session.is_logged_in());
        assert!(!h.app.signup.celebrating);
    }

    #[test]
    fn test_map_card_and_directions() {
        let mut h = harness();
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('4'));
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.map.card_open);

        press(&mut h.app, KeyCode::Char('d'));
        let first_address = h.app.view.locations()[0].address.clone();
        assert_eq!(h.opened.lock().unwrap().as_slice(), &[first_address]);

        press(&mut h.app, KeyCode::Enter);
        assert!(matches!(h.app.navigator.current(), Route::TaskDetail { .. }));
    }

    #[test]
    fn test_detail_map_shortcut_focuses_location() {
        let mut h = harness();
        login(&mut h.app);
        press(&mut h.app, KeyCode::Enter);
        let location_id = h.app.view.task(&h.app.detail.task_id).unwrap().location.id.clone();

        press(&mut h.app, KeyCode::Char('m'));
        assert_eq!(h.app.navigator.current(), &Route::Tab(Tab::Map));
        assert!(!h.app.navigator.can_go_back());
        assert_eq!(h.app.view.locations()[h.app.map.selected_index].id, location_id);
    }

    fn write_image(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("field.jpg");
        std::fs::write(&path, b"jpeg").unwrap();
        path
    }

    #[test]
    fn test_upload_needs_task_before_scan() {
        let mut h = harness();
        let image = write_image(&h.dir);
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('3'));
        press(&mut h.app, KeyCode::Tab);
        type_text(&mut h.app, &image.to_string_lossy());
        press(&mut h.app, KeyCode::Enter);

        assert_eq!(h.app.upload.ai_status, AiStatus::Idle);
        assert_eq!(h.app.status_message.as_deref(), Some("Select a task first"));
    }

    #[test]
    fn test_upload_flow_verifies_and_syncs() {
        let mut h = harness();
        let image = write_image(&h.dir);
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('3'));

        press(&mut h.app, KeyCode::Enter);
        let selected = h.app.upload.selected_task.clone();
        assert_eq!(selected.as_deref(), Some(h.app.view.uploadable_tasks()[0].id.as_str()));

        press(&mut h.app, KeyCode::Tab);
        type_text(&mut h.app, &image.to_string_lossy());
        press(&mut h.app, KeyCode::Enter);
        assert_eq!(h.app.upload.ai_status, AiStatus::Scanning);

        settle(&mut h.app);
        assert_eq!(h.app.upload.ai_status, AiStatus::Success);
        let photo = h.app.upload.photo.clone().unwrap();
        assert_eq!(Some(photo.task_id), selected);
        let stored: Vec<_> = std::fs::read_dir(h.dir.path().join("photos")).unwrap().flatten().collect();
        assert_eq!(stored.len(), 1);

        press(&mut h.app, KeyCode::Tab);
        press(&mut h.app, KeyCode::Tab);
        assert_eq!(h.app.upload.focus, UploadFocus::Submit);
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.upload.uploading);

        settle(&mut h.app);
        assert!(matches!(
            h.app.overlay,
            Some(Overlay::Alert(ref alert)) if alert.title == "Sync Successful"
        ));
        assert!(h.app.upload.selected_task.is_none());
        assert_eq!(h.app.upload.ai_status, AiStatus::Idle);
    }

    #[test]
    fn test_switching_task_after_scan_drops_photo() {
        let mut h = harness();
        let image = write_image(&h.dir);
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('3'));
        press(&mut h.app, KeyCode::Enter);
        press(&mut h.app, KeyCode::Tab);
        type_text(&mut h.app, &image.to_string_lossy());
        press(&mut h.app, KeyCode::Enter);
        settle(&mut h.app);
        assert_eq!(h.app.upload.ai_status, AiStatus::Success);
        let scanned_for = h.app.upload.photo.as_ref().unwrap().task_id.clone();

        press(&mut h.app, KeyCode::BackTab);
        press(&mut h.app, KeyCode::Right);
        press(&mut h.app, KeyCode::Enter);
        assert_ne!(h.app.upload.selected_task.as_deref(), Some(scanned_for.as_str()));
        assert!(h.app.upload.photo.is_none());
        assert_eq!(h.app.upload.ai_status, AiStatus::Idle);
        assert!(!h.app.upload.can_submit());

        h.app.upload.focus = UploadFocus::Submit;
        press(&mut h.app, KeyCode::Enter);
        assert!(!h.app.upload.uploading);
        assert!(!h.app.task_manager.is_running(TaskKind::Upload));
    }

    #[test]
    fn test_detail_photo_shortcut_replaces_scanned_task() {
        let mut h = harness();
        login(&mut h.app);
        h.app.upload.selected_task = Some("t1".to_string());
        h.app.upload.image = Some(FileHandle::new(h.dir.path().join("field.jpg")));
        h.app.upload.ai_status = AiStatus::Success;

        h.app.navigate(Route::TaskDetail {
            task_id: "t2".to_string(),
        });
        press(&mut h.app, KeyCode::Char('p'));
        assert_eq!(h.app.navigator.current(), &Route::Tab(Tab::Upload));
        assert_eq!(h.app.upload.selected_task.as_deref(), Some("t2"));
        assert!(h.app.upload.image.is_none());
        assert_eq!(h.app.upload.ai_status, AiStatus::Idle);
    }

    #[test]
    fn test_scan_failure_shows_protocol_error() {
        let mut h = harness();
        let image = write_image(&h.dir);
        h.app.devices.photo_store = Arc::new(FsPhotoStore::new(None));
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('3'));
        press(&mut h.app, KeyCode::Enter);
        press(&mut h.app, KeyCode::Tab);
        type_text(&mut h.app, &image.to_string_lossy());
        press(&mut h.app, KeyCode::Enter);

        settle(&mut h.app);
        assert_eq!(h.app.upload.ai_status, AiStatus::Failed);
        assert!(matches!(
            h.app.overlay,
            Some(Overlay::Alert(ref alert)) if alert.title == "Protocol Error" && alert.is_error
        ));
    }

    #[test]
    fn test_running_tasks_overlay_cancels() {
        let mut h = harness();
        h.app.config.simulation.refresh_ms = 5_000;
        login(&mut h.app);
        press(&mut h.app, KeyCode::Char('r'));
        assert!(h.app.dashboard.refreshing);

        press(&mut h.app, KeyCode::Char('T'));
        assert_eq!(h.app.overlay, Some(Overlay::RunningTasks));
        press(&mut h.app, KeyCode::Char('1'));
        assert!(!h.app.task_manager.has_running_tasks());
        assert!(!h.app.dashboard.refreshing);
        press(&mut h.app, KeyCode::Esc);
        assert!(h.app.overlay.is_none());
    }

    #[test]
    fn test_ctrl_c_quits_from_form() {
        let mut h = harness();
        ctrl(&mut h.app, 'c');
        assert!(h.app.should_quit);
    }
}
