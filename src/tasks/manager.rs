//! Background task manager for tracking and cancelling screen-scoped work.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;

use super::{
    BackgroundTask, TaskCompletionInfo, TaskId, TaskKind, TaskProgress, TaskState, TaskUpdate,
};
use crate::route::Screen;

/// Manages all background tasks, providing centralized control and status.
pub struct BackgroundTaskManager {
    tasks: HashMap<TaskId, BackgroundTask>,
    /// Order in which tasks were added.
    task_order: Vec<TaskId>,
}

impl BackgroundTaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            task_order: Vec::new(),
        }
    }

    /// Register a new background task owned by `scope`.
    /// Returns the TaskId, a sender for updates and the cancel flag.
    pub fn register_task(
        &mut self,
        kind: TaskKind,
        scope: Screen,
    ) -> (TaskId, mpsc::Sender<TaskUpdate>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let task = BackgroundTask::new(kind, scope, cancel_flag.clone(), rx);
        let id = task.id;

        tracing::debug!(task = kind.display_name(), ?scope, "Registered background task");
        self.tasks.insert(id, task);
        self.task_order.push(id);

        (id, tx, cancel_flag)
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.tasks.values().any(|t| t.kind == kind && t.is_running())
    }

    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        match self.tasks.remove(&id) {
            Some(task) => {
                task.cancel();
                self.task_order.retain(|t| *t != id);
                true
            }
            None => false,
        }
    }

    /// Cancel every task owned by `scope` and stop tracking it, so any late
    /// result from the worker is dropped with the channel.
    pub fn cancel_scope(&mut self, scope: Screen) -> usize {
        let ids: Vec<TaskId> = self
            .task_order
            .iter()
            .copied()
            .filter(|id| self.tasks.get(id).is_some_and(|t| t.scope == scope))
            .collect();

        for id in &ids {
            self.cancel_task(*id);
        }

        if !ids.is_empty() {
            tracing::debug!(?scope, count = ids.len(), "Cancelled screen tasks");
        }
        ids.len()
    }

    pub fn cancel_all(&mut self) {
        for task in self.tasks.values() {
            task.cancel();
        }
        self.tasks.clear();
        self.task_order.clear();
    }

    /// Poll all task channels for updates.
    /// Returns completions that should be applied to their screens.
    pub fn poll_updates(&mut self) -> Vec<TaskCompletionInfo> {
        let mut completed = Vec::new();

        for id in &self.task_order {
            let Some(task) = self.tasks.get_mut(id) else {
                continue;
            };

            while let Ok(update) = task.receiver.try_recv() {
                match update {
                    TaskUpdate::Started { total } => {
                        task.progress = Some(TaskProgress::new(0, total));
                    }
                    TaskUpdate::Progress(progress) => {
                        task.progress = Some(progress);
                    }
                    TaskUpdate::Completed { message, outcome } => {
                        task.state = TaskState::Completed;
                        completed.push(TaskCompletionInfo {
                            id: *id,
                            kind: task.kind,
                            scope: task.scope,
                            message,
                            outcome: Some(outcome),
                            success: true,
                        });
                        break;
                    }
                    TaskUpdate::Cancelled => {
                        task.state = TaskState::Cancelled;
                        completed.push(TaskCompletionInfo {
                            id: *id,
                            kind: task.kind,
                            scope: task.scope,
                            message: "Cancelled".to_string(),
                            outcome: None,
                            success: false,
                        });
                        break;
                    }
                    TaskUpdate::Failed { error } => {
                        task.state = TaskState::Failed(error.clone());
                        completed.push(TaskCompletionInfo {
                            id: *id,
                            kind: task.kind,
                            scope: task.scope,
                            message: error,
                            outcome: None,
                            success: false,
                        });
                        break;
                    }
                }
            }
        }

        for info in &completed {
            self.tasks.remove(&info.id);
            self.task_order.retain(|id| *id != info.id);
        }

        completed
    }

    /// Get all running tasks for display.
    pub fn running_tasks(&self) -> Vec<&BackgroundTask> {
        self.task_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|t| t.is_running())
            .collect()
    }

    pub fn has_running_tasks(&self) -> bool {
        self.tasks.values().any(|t| t.is_running())
    }

    /// Progress of the newest running task of `kind`, if it has reported any.
    pub fn progress_of(&self, kind: TaskKind) -> Option<&TaskProgress> {
        self.task_order
            .iter()
            .rev()
            .filter_map(|id| self.tasks.get(id))
            .find(|t| t.kind == kind && t.is_running())
            .and_then(|t| t.progress.as_ref())
    }
}

impl Default for BackgroundTaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskOutcome;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_completion_is_reported_once() {
        let mut manager = BackgroundTaskManager::new();
        let (id, tx, _flag) = manager.register_task(TaskKind::ChatReply, Screen::Chat);
        assert!(manager.is_running(TaskKind::ChatReply));

        tx.send(TaskUpdate::Completed {
            message: "done".to_string(),
            outcome: TaskOutcome::ChatReply("hello".to_string()),
        })
        .unwrap();

        let completions = manager.poll_updates();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].id, id);
        assert!(completions[0].success);
        assert!(matches!(
            completions[0].outcome,
            Some(TaskOutcome::ChatReply(ref text)) if text == "hello"
        ));

        assert!(manager.poll_updates().is_empty());
        assert!(!manager.has_running_tasks());
    }

    #[test]
    fn test_progress_is_tracked() {
        let mut manager = BackgroundTaskManager::new();
        let (_id, tx, _flag) = manager.register_task(TaskKind::Upload, Screen::Upload);
        tx.send(TaskUpdate::Started { total: 100 }).unwrap();
        tx.send(TaskUpdate::Progress(TaskProgress::new(40, 100))).unwrap();

        assert!(manager.poll_updates().is_empty());
        let progress = manager.progress_of(TaskKind::Upload).unwrap();
        assert_eq!(progress.percent(), 40);
    }

    #[test]
    fn test_cancel_scope_only_touches_that_screen() {
        let mut manager = BackgroundTaskManager::new();
        let (_a, chat_tx, chat_flag) = manager.register_task(TaskKind::ChatReply, Screen::Chat);
        let (_b, _upload_tx, upload_flag) = manager.register_task(TaskKind::Upload, Screen::Upload);

        assert_eq!(manager.cancel_scope(Screen::Chat), 1);
        assert!(chat_flag.load(Ordering::SeqCst));
        assert!(!upload_flag.load(Ordering::SeqCst));
        assert!(!manager.is_running(TaskKind::ChatReply));
        assert!(manager.is_running(TaskKind::Upload));

        // A late reply from the cancelled worker goes nowhere.
        assert!(chat_tx
            .send(TaskUpdate::Completed {
                message: "late".to_string(),
                outcome: TaskOutcome::ChatReply("late".to_string()),
            })
            .is_err());
        assert!(manager.poll_updates().is_empty());
    }

    #[test]
    fn test_failed_update() {
        let mut manager = BackgroundTaskManager::new();
        let (_id, tx, _flag) = manager.register_task(TaskKind::AiScan, Screen::Upload);
        tx.send(TaskUpdate::Failed {
            error: "device storage is not available".to_string(),
        })
        .unwrap();

        let completions = manager.poll_updates();
        assert_eq!(completions.len(), 1);
        assert!(!completions[0].success);
        assert_eq!(completions[0].scope, Screen::Upload);
    }

    #[test]
    fn test_cancel_all() {
        let mut manager = BackgroundTaskManager::new();
        let (_a, _tx1, flag1) = manager.register_task(TaskKind::Refresh, Screen::Dashboard);
        let (_b, _tx2, flag2) = manager.register_task(TaskKind::AiScan, Screen::Upload);
        manager.cancel_all();
        assert!(flag1.load(Ordering::SeqCst));
        assert!(flag2.load(Ordering::SeqCst));
        assert!(manager.running_tasks().is_empty());
    }
}
