//! Read-only queries over the session's task collection.
//!
//! Nothing here mutates the underlying records; every screen that needs a
//! filtered list or a rolled-up count asks the view for it.

use chrono::{DateTime, Utc};

use crate::model::{
    DailyStats, Location, Notification, Seed, Task, TaskStatus, Tone, Worker,
};

/// Status filter offered by the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Completed,
}

impl StatusFilter {
    /// Filters in the order the task list cycles through them.
    pub const CYCLE: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::InProgress,
        StatusFilter::Completed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::InProgress => "In Progress",
            StatusFilter::Completed => "Completed",
        }
    }

    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TaskStatus::Pending,
            StatusFilter::InProgress => status == TaskStatus::InProgress,
            StatusFilter::Completed => status == TaskStatus::Completed,
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::CYCLE.iter().position(|f| f == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }

    pub fn previous(&self) -> Self {
        let idx = Self::CYCLE.iter().position(|f| f == self).unwrap_or(0);
        Self::CYCLE[(idx + Self::CYCLE.len() - 1) % Self::CYCLE.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub text: String,
    pub status: StatusFilter,
}

impl TaskQuery {
    pub fn new(text: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }
}

/// Rolled-up state of a work site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Active,
    Pending,
    Completed,
}

impl LocationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LocationStatus::Active => "active",
            LocationStatus::Pending => "pending",
            LocationStatus::Completed => "completed",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            LocationStatus::Active => Tone::Primary,
            LocationStatus::Pending => Tone::Warning,
            LocationStatus::Completed => Tone::Success,
        }
    }
}

/// Per-status task counts for summary badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskAggregate {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyProgress {
    pub completed: usize,
    pub total: usize,
    /// 0-100
    pub percentage: u8,
}

/// Owns the session's records and answers derived queries over them.
#[derive(Debug, Clone)]
pub struct TaskCollectionView {
    current_worker: Worker,
    workers: Vec<Worker>,
    locations: Vec<Location>,
    tasks: Vec<Task>,
    notifications: Vec<Notification>,
    daily_stats: Vec<DailyStats>,
}

impl TaskCollectionView {
    pub fn new(seed: Seed) -> Self {
        Self {
            current_worker: seed.current_worker,
            workers: seed.workers,
            locations: seed.locations,
            tasks: seed.tasks,
            notifications: seed.notifications,
            daily_stats: seed.daily_stats,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn current_worker(&self) -> &Worker {
        &self.current_worker
    }

    /// Stats for today, which the seed lists first.
    pub fn today_stats(&self) -> Option<&DailyStats> {
        self.daily_stats.first()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Tasks whose title or location name contains the query text
    /// (case-insensitive) and whose status passes the filter.
    pub fn filter_tasks(&self, query: &TaskQuery) -> Vec<&Task> {
        let needle = query.text.to_lowercase();
        self.tasks
            .iter()
            .filter(|task| {
                let matches_text = task.title.to_lowercase().contains(&needle)
                    || task.location.name.to_lowercase().contains(&needle);
                matches_text && query.status.matches(task.status)
            })
            .collect()
    }

    pub fn tasks_for_location(&self, location_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.location.id == location_id)
            .collect()
    }

    /// In-progress beats pending beats completed.
    pub fn location_status(&self, location_id: &str) -> LocationStatus {
        let tasks = self.tasks_for_location(location_id);
        if tasks.iter().any(|t| t.status == TaskStatus::InProgress) {
            LocationStatus::Active
        } else if tasks.iter().any(|t| t.status == TaskStatus::Pending) {
            LocationStatus::Pending
        } else {
            LocationStatus::Completed
        }
    }

    /// Tasks currently being worked on.
    pub fn active_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .collect()
    }

    /// Tasks that can still receive photo evidence.
    pub fn uploadable_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::InProgress | TaskStatus::Pending))
            .collect()
    }

    pub fn aggregate(&self) -> TaskAggregate {
        compute_daily_aggregate(&self.tasks)
    }

    /// Completed and verified tasks over the whole collection.
    pub fn weekly_progress(&self) -> WeeklyProgress {
        let total = self.tasks.len();
        let completed = self
            .tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Verified))
            .count();
        let percentage = if total == 0 {
            0
        } else {
            round_half_up(completed as f64 * 100.0 / total as f64) as u8
        };
        WeeklyProgress {
            completed,
            total,
            percentage,
        }
    }

    pub fn unread_notifications(&self) -> usize {
        unread_notification_count(&self.notifications)
    }
}

/// Count tasks by status.
pub fn compute_daily_aggregate(tasks: &[Task]) -> TaskAggregate {
    tasks.iter().fold(
        TaskAggregate {
            total: tasks.len(),
            ..TaskAggregate::default()
        },
        |mut agg, task| {
            match task.status {
                TaskStatus::Completed => agg.completed += 1,
                TaskStatus::InProgress => agg.in_progress += 1,
                TaskStatus::Pending => agg.pending += 1,
                TaskStatus::Verified => {}
            }
            agg
        },
    )
}

/// "Overdue", "{h}h left" or "{d}d left" relative to `now`.
pub fn format_relative_due_time(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let millis = (due - now).num_milliseconds() as f64;
    let hours = round_half_up(millis / 3_600_000.0);

    if hours < 0.0 {
        "Overdue".to_string()
    } else if hours < 24.0 {
        format!("{}h left", hours as i64)
    } else {
        format!("{}d left", round_half_up(hours / 24.0) as i64)
    }
}

pub fn unread_notification_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

/// Halves round toward positive infinity, so -0.5 becomes 0.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
