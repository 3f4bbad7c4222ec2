//! Background work that must not block the UI loop.
//!
//! Every simulated delay (AI scan, upload, assistant typing, progress update)
//! runs on a worker thread, reports back through a channel, and belongs to
//! the screen that started it. Leaving that screen cancels it.

pub mod manager;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::model::WorkPhoto;
use crate::route::Screen;

pub use manager::BackgroundTaskManager;

/// Unique identifier for a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn new() -> Self {
        use std::sync::atomic::AtomicU64;
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TaskId(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    AiScan,
    Upload,
    ChatReply,
    ProgressUpdate,
    SignupCelebration,
    Refresh,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::AiScan,
        TaskKind::Upload,
        TaskKind::ChatReply,
        TaskKind::ProgressUpdate,
        TaskKind::SignupCelebration,
        TaskKind::Refresh,
    ];

    /// Screen whose state this kind of task updates.
    pub fn owner(&self) -> Screen {
        match self {
            TaskKind::AiScan | TaskKind::Upload => Screen::Upload,
            TaskKind::ChatReply => Screen::Chat,
            TaskKind::ProgressUpdate => Screen::TaskDetail,
            TaskKind::SignupCelebration => Screen::Signup,
            TaskKind::Refresh => Screen::Dashboard,
        }
    }

    /// Short display name for status bar.
    pub fn short_name(&self) -> &'static str {
        match self {
            TaskKind::AiScan => "AI",
            TaskKind::Upload => "U",
            TaskKind::ChatReply => "C",
            TaskKind::ProgressUpdate => "P",
            TaskKind::SignupCelebration => "S",
            TaskKind::Refresh => "R",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskKind::AiScan => "AI Verification",
            TaskKind::Upload => "Upload",
            TaskKind::ChatReply => "Assistant Reply",
            TaskKind::ProgressUpdate => "Progress Update",
            TaskKind::SignupCelebration => "Signup",
            TaskKind::Refresh => "Refresh",
        }
    }
}

/// Progress information for a task.
#[derive(Debug, Clone)]
pub struct TaskProgress {
    pub current: usize,
    pub total: usize,
    pub message: Option<String>,
}

impl TaskProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            message: None,
        }
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Calculate progress percentage (0-100).
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.current as f64 / self.total as f64) * 100.0).min(100.0) as u8
        }
    }
}

/// What a finished task hands back to its screen.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Verified(Box<WorkPhoto>),
    Uploaded,
    ChatReply(String),
    ProgressUpdated,
    SignupComplete,
    Refreshed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

/// Update messages sent from background tasks via channels.
#[derive(Debug, Clone)]
pub enum TaskUpdate {
    Started { total: usize },
    Progress(TaskProgress),
    Completed { message: String, outcome: TaskOutcome },
    Cancelled,
    Failed { error: String },
}

/// A running background task with its state and communication channels.
pub struct BackgroundTask {
    pub id: TaskId,
    pub kind: TaskKind,
    pub scope: Screen,
    pub state: TaskState,
    pub progress: Option<TaskProgress>,
    pub cancel_flag: Arc<AtomicBool>,
    pub receiver: mpsc::Receiver<TaskUpdate>,
    pub started_at: Instant,
}

impl BackgroundTask {
    pub fn new(
        kind: TaskKind,
        scope: Screen,
        cancel_flag: Arc<AtomicBool>,
        receiver: mpsc::Receiver<TaskUpdate>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            kind,
            scope,
            state: TaskState::Running,
            progress: None,
            cancel_flag,
            receiver,
            started_at: Instant::now(),
        }
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_running(&self) -> bool {
        self.state == TaskState::Running
    }
}

/// Result of polling task updates.
#[derive(Debug, Clone)]
pub struct TaskCompletionInfo {
    pub id: TaskId,
    pub kind: TaskKind,
    pub scope: Screen,
    pub message: String,
    pub outcome: Option<TaskOutcome>,
    pub success: bool,
}

const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Sleep for `duration`, waking early if cancellation is requested.
/// Returns false when the task was cancelled.
pub fn sleep_cancellable(duration: Duration, cancel_flag: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel_flag.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(TaskProgress::new(0, 0).percent(), 0);
        assert_eq!(TaskProgress::new(5, 20).percent(), 25);
        assert_eq!(TaskProgress::new(30, 20).percent(), 100);
    }

    #[test]
    fn test_sleep_completes_without_cancel() {
        let flag = AtomicBool::new(false);
        assert!(sleep_cancellable(Duration::from_millis(10), &flag));
    }

    #[test]
    fn test_sleep_returns_early_when_cancelled() {
        let flag = AtomicBool::new(true);
        let started = Instant::now();
        assert!(!sleep_cancellable(Duration::from_secs(10), &flag));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_every_kind_has_an_owner_screen() {
        assert_eq!(TaskKind::AiScan.owner(), Screen::Upload);
        assert_eq!(TaskKind::Upload.owner(), Screen::Upload);
        assert_eq!(TaskKind::ChatReply.owner(), Screen::Chat);
        assert_eq!(TaskKind::ProgressUpdate.owner(), Screen::TaskDetail);
        assert_eq!(TaskKind::SignupCelebration.owner(), Screen::Signup);
        assert_eq!(TaskKind::Refresh.owner(), Screen::Dashboard);
        assert_eq!(TaskKind::ALL.len(), 6);
    }

    #[test]
    fn test_task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
