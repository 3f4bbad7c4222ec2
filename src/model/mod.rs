//! Field-work records: workers, locations, tasks, photos and notifications.
//!
//! Field names serialize in camelCase and enum values in snake_case so a seed
//! file can be written in the same shape the mobile client used.

pub mod seed;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use seed::{Seed, SeedError};

/// Semantic color for a status badge. The UI maps tones to terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Primary,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Online,
    Offline,
    Busy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: String,
    pub phone: String,
    pub email: String,
    pub status: WorkerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Verified,
}

impl TaskStatus {
    /// Human label, e.g. "in progress".
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Verified => "verified",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            TaskStatus::Completed => Tone::Success,
            TaskStatus::InProgress => Tone::Primary,
            TaskStatus::Verified => Tone::Info,
            TaskStatus::Pending => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Priority::Urgent => Tone::Error,
            Priority::High => Tone::Warning,
            Priority::Medium => Tone::Info,
            Priority::Low => Tone::Neutral,
        }
    }
}

/// Completion percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub fn new(value: i64) -> Self {
        Progress(value.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl From<i64> for Progress {
    fn from(value: i64) -> Self {
        Progress::new(value)
    }
}

impl From<Progress> for u8 {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_to: Worker,
    pub location: Location,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub progress: Progress,
    #[serde(default)]
    pub photos: Vec<WorkPhoto>,
    pub estimated_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
}

/// Where a photo's pixels live: a URI string or an opaque bundled asset handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PhotoSource {
    Uri(String),
    Asset(u32),
}

impl std::fmt::Display for PhotoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoSource::Uri(uri) => write!(f, "{}", uri),
            PhotoSource::Asset(handle) => write!(f, "asset#{}", handle),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkPhoto {
    pub id: String,
    pub uri: PhotoSource,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub ai_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysisResult>,
    pub task_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    NeedsReview,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysisResult {
    /// 0-100
    pub confidence: u8,
    pub work_detected: bool,
    pub category: String,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub tasks_completed: u32,
    pub photos_uploaded: u32,
    pub hours_worked: f64,
    pub ai_verifications: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskCompleted,
    PhotoVerified,
    Reminder,
    Alert,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps() {
        assert_eq!(Progress::new(-5).value(), 0);
        assert_eq!(Progress::new(42).value(), 42);
        assert_eq!(Progress::new(250).value(), 100);
    }

    #[test]
    fn test_progress_deserialize_clamps() {
        let progress: Progress = serde_json::from_str("140").unwrap();
        assert_eq!(progress.value(), 100);
        assert_eq!(serde_json::to_string(&progress).unwrap(), "100");
    }

    #[test]
    fn test_status_tones() {
        assert_eq!(TaskStatus::Completed.tone(), Tone::Success);
        assert_eq!(TaskStatus::InProgress.tone(), Tone::Primary);
        assert_eq!(TaskStatus::Verified.tone(), Tone::Info);
        assert_eq!(TaskStatus::Pending.tone(), Tone::Neutral);
        assert_eq!(Priority::Urgent.tone(), Tone::Error);
        assert_eq!(Priority::High.tone(), Tone::Warning);
        assert_eq!(Priority::Medium.tone(), Tone::Info);
        assert_eq!(Priority::Low.tone(), Tone::Neutral);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(
            serde_json::to_string(&VerificationStatus::NeedsReview).unwrap(),
            "\"needs_review\""
        );
        assert_eq!(TaskStatus::InProgress.label(), "in progress");
    }

    #[test]
    fn test_photo_source_untagged() {
        let uri: PhotoSource = serde_json::from_str("\"file:///tmp/a.jpg\"").unwrap();
        assert_eq!(uri, PhotoSource::Uri("file:///tmp/a.jpg".to_string()));
        let asset: PhotoSource = serde_json::from_str("7").unwrap();
        assert_eq!(asset, PhotoSource::Asset(7));
        assert_eq!(asset.to_string(), "asset#7");
    }

    #[test]
    fn test_notification_type_field() {
        let json = r#"{
            "id": "n1",
            "type": "task_assigned",
            "title": "New task",
            "message": "Harvest block A",
            "timestamp": "2026-10-16T08:00:00Z",
            "read": false,
            "taskId": "t1"
        }"#;
        let notification: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(notification.kind, NotificationKind::TaskAssigned);
        assert_eq!(notification.task_id.as_deref(), Some("t1"));
    }
}
