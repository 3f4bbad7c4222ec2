//! Static plantation data loaded once at startup.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{
    AiAnalysisResult, DailyStats, Location, Notification, NotificationKind, PhotoSource, Priority,
    Progress, Task, TaskStatus, VerificationStatus, WorkPhoto, Worker, WorkerStatus,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate task id {0}")]
    DuplicateTask(String),
    #[error("task {task_id} is assigned to unknown worker {worker_id}")]
    UnknownWorker { task_id: String, worker_id: String },
    #[error("task {task_id} references unknown location {location_id}")]
    UnknownLocation { task_id: String, location_id: String },
    #[error("photo {photo_id} belongs to task {task_id} but claims task {claimed}")]
    PhotoTaskMismatch {
        photo_id: String,
        task_id: String,
        claimed: String,
    },
}

/// Every record the app works from for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub current_worker: Worker,
    pub workers: Vec<Worker>,
    pub locations: Vec<Location>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub daily_stats: Vec<DailyStats>,
}

impl Seed {
    /// Load a seed from a JSON file and validate its references.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let seed: Seed = serde_json::from_str(&content)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Check that every task resolves its worker and location, and that
    /// photos point back at the task that holds them.
    pub fn validate(&self) -> Result<(), SeedError> {
        let worker_ids: HashSet<&str> = self
            .workers
            .iter()
            .chain(std::iter::once(&self.current_worker))
            .map(|w| w.id.as_str())
            .collect();
        let location_ids: HashSet<&str> = self.locations.iter().map(|l| l.id.as_str()).collect();
        let mut task_ids = HashSet::new();

        for task in &self.tasks {
            if !task_ids.insert(task.id.as_str()) {
                return Err(SeedError::DuplicateTask(task.id.clone()));
            }
            if !worker_ids.contains(task.assigned_to.id.as_str()) {
                return Err(SeedError::UnknownWorker {
                    task_id: task.id.clone(),
                    worker_id: task.assigned_to.id.clone(),
                });
            }
            if !location_ids.contains(task.location.id.as_str()) {
                return Err(SeedError::UnknownLocation {
                    task_id: task.id.clone(),
                    location_id: task.location.id.clone(),
                });
            }
            if let Some(photo) = task.photos.iter().find(|p| p.task_id != task.id) {
                return Err(SeedError::PhotoTaskMismatch {
                    photo_id: photo.id.clone(),
                    task_id: task.id.clone(),
                    claimed: photo.task_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// The built-in estate data set, with times laid out around `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let ahmad = worker("w1", "Ahmad Razak", "Harvester", "+60 12-345 6789", WorkerStatus::Online);
        let siti = worker("w2", "Siti Aminah", "Field Supervisor", "+60 13-222 4455", WorkerStatus::Busy);
        let ravi = worker("w3", "Ravi Chandran", "Sprayer", "+60 17-880 1020", WorkerStatus::Offline);

        let block_a = location("l1", "Block A - North Estate", "Jalan Ladang Utara, 43000 Kajang, Selangor", 3.1612, 101.6965);
        let block_b = location("l2", "Block B - River Side", "Lot 22, Jalan Sungai, 43000 Kajang, Selangor", 3.1212, 101.6665);
        let block_c = location("l3", "Block C - Hill Section", "Bukit Estate Road, 43100 Hulu Langat, Selangor", 3.1712, 101.7165);
        let nursery = location("l4", "Estate Nursery", "Nursery Lane, 43000 Kajang, Selangor", 3.1312, 101.6565);
        let mill = location("l5", "Mill Collection Point", "Jalan Kilang Sawit, 43500 Semenyih, Selangor", 3.1012, 101.7065);

        let hours = Duration::hours;

        let tasks = vec![
            Task {
                id: "t1".to_string(),
                title: "Harvest FFB - Phase 1".to_string(),
                description: "Harvest ripe fresh fruit bunches along rows 1-40 and collect all loose fruits.".to_string(),
                status: TaskStatus::InProgress,
                priority: Priority::High,
                assigned_to: ahmad.clone(),
                location: block_a.clone(),
                due_date: now + hours(3),
                created_at: now - hours(48),
                updated_at: now - hours(1),
                progress: Progress::new(65),
                photos: vec![WorkPhoto {
                    id: "p1".to_string(),
                    uri: PhotoSource::Asset(1),
                    timestamp: now - hours(2),
                    caption: Some("Rows 1-12 cleared".to_string()),
                    ai_verified: true,
                    ai_analysis: Some(AiAnalysisResult {
                        confidence: 94,
                        work_detected: true,
                        category: "Harvesting".to_string(),
                        details: vec![
                            "Cut bunches stacked at collection point".to_string(),
                            "Loose fruits collected".to_string(),
                        ],
                        suggestions: None,
                        verification_status: VerificationStatus::Verified,
                    }),
                    task_id: "t1".to_string(),
                }],
                estimated_hours: 8.0,
                actual_hours: Some(5.5),
            },
            Task {
                id: "t2".to_string(),
                title: "Fertilizer Application".to_string(),
                description: "Apply 3kg NPK compound per palm in a 1.5m ring around the trunk.".to_string(),
                status: TaskStatus::Pending,
                priority: Priority::Medium,
                assigned_to: ahmad.clone(),
                location: block_b.clone(),
                due_date: now + hours(50),
                created_at: now - hours(24),
                updated_at: now - hours(24),
                progress: Progress::new(0),
                photos: Vec::new(),
                estimated_hours: 6.0,
                actual_hours: None,
            },
            Task {
                id: "t3".to_string(),
                title: "Pest Inspection - Rhinoceros Beetle".to_string(),
                description: "Inspect fronds for V-shaped cuts and service the pheromone traps.".to_string(),
                status: TaskStatus::Completed,
                priority: Priority::Urgent,
                assigned_to: siti.clone(),
                location: block_c.clone(),
                due_date: now - hours(20),
                created_at: now - hours(96),
                updated_at: now - hours(22),
                progress: Progress::new(100),
                photos: vec![WorkPhoto {
                    id: "p2".to_string(),
                    uri: PhotoSource::Uri("https://images.workertrack.app/traps/block-c.jpg".to_string()),
                    timestamp: now - hours(23),
                    caption: Some("Trap 4 serviced".to_string()),
                    ai_verified: true,
                    ai_analysis: Some(AiAnalysisResult {
                        confidence: 71,
                        work_detected: true,
                        category: "Pest Control".to_string(),
                        details: vec!["Pheromone trap visible".to_string()],
                        suggestions: Some(vec!["Capture the trap label in frame".to_string()]),
                        verification_status: VerificationStatus::NeedsReview,
                    }),
                    task_id: "t3".to_string(),
                }],
                estimated_hours: 4.0,
                actual_hours: Some(4.5),
            },
            Task {
                id: "t4".to_string(),
                title: "Seedling Watering".to_string(),
                description: "Water polybag seedlings and record any yellowing leaves.".to_string(),
                status: TaskStatus::InProgress,
                priority: Priority::Low,
                assigned_to: ravi.clone(),
                location: nursery.clone(),
                due_date: now + hours(6),
                created_at: now - hours(10),
                updated_at: now - hours(2),
                progress: Progress::new(30),
                photos: Vec::new(),
                estimated_hours: 2.0,
                actual_hours: Some(0.5),
            },
            Task {
                id: "t5".to_string(),
                title: "Ganoderma Survey".to_string(),
                description: "Check palm bases for bracket fungi and mark infected palms.".to_string(),
                status: TaskStatus::Pending,
                priority: Priority::High,
                assigned_to: siti.clone(),
                location: block_c.clone(),
                due_date: now - hours(4),
                created_at: now - hours(72),
                updated_at: now - hours(72),
                progress: Progress::new(0),
                photos: Vec::new(),
                estimated_hours: 5.0,
                actual_hours: None,
            },
            Task {
                id: "t6".to_string(),
                title: "FFB Transport to Mill".to_string(),
                description: "Load harvested bunches and deliver to the mill weighbridge.".to_string(),
                status: TaskStatus::Verified,
                priority: Priority::Medium,
                assigned_to: ahmad.clone(),
                location: mill.clone(),
                due_date: now - hours(30),
                created_at: now - hours(120),
                updated_at: now - hours(28),
                progress: Progress::new(100),
                photos: Vec::new(),
                estimated_hours: 3.0,
                actual_hours: Some(3.0),
            },
            Task {
                id: "t7".to_string(),
                title: "Frond Pruning".to_string(),
                description: "Prune dead fronds and stack them between rows.".to_string(),
                status: TaskStatus::Completed,
                priority: Priority::Low,
                assigned_to: ravi.clone(),
                location: block_b.clone(),
                due_date: now - hours(2),
                created_at: now - hours(50),
                updated_at: now - hours(5),
                progress: Progress::new(100),
                photos: Vec::new(),
                estimated_hours: 6.0,
                actual_hours: Some(6.5),
            },
        ];

        let notifications = vec![
            Notification {
                id: "n1".to_string(),
                kind: NotificationKind::TaskAssigned,
                title: "New task assigned".to_string(),
                message: "Fertilizer Application at Block B - River Side".to_string(),
                timestamp: now - hours(24),
                read: false,
                task_id: Some("t2".to_string()),
            },
            Notification {
                id: "n2".to_string(),
                kind: NotificationKind::PhotoVerified,
                title: "Photo verified".to_string(),
                message: "Rows 1-12 cleared was verified with 94% confidence".to_string(),
                timestamp: now - hours(2),
                read: true,
                task_id: Some("t1".to_string()),
            },
            Notification {
                id: "n3".to_string(),
                kind: NotificationKind::Reminder,
                title: "Due soon".to_string(),
                message: "Harvest FFB - Phase 1 is due in 3 hours".to_string(),
                timestamp: now - hours(1),
                read: false,
                task_id: Some("t1".to_string()),
            },
            Notification {
                id: "n4".to_string(),
                kind: NotificationKind::Alert,
                title: "Heavy rain expected".to_string(),
                message: "Postpone spraying in Block C this afternoon".to_string(),
                timestamp: now - hours(3),
                read: true,
                task_id: None,
            },
        ];

        let today = now.date_naive();
        let daily_stats = (0..7)
            .map(|days_ago| DailyStats {
                date: today - Duration::days(days_ago),
                tasks_completed: [3, 4, 2, 5, 3, 4, 1][days_ago as usize],
                photos_uploaded: [6, 8, 3, 9, 5, 7, 2][days_ago as usize],
                hours_worked: [6.5, 8.0, 5.0, 8.5, 7.0, 7.5, 3.0][days_ago as usize],
                ai_verifications: [5, 7, 3, 8, 4, 6, 2][days_ago as usize],
            })
            .collect();

        Seed {
            current_worker: ahmad.clone(),
            workers: vec![ahmad, siti, ravi],
            locations: vec![block_a, block_b, block_c, nursery, mill],
            tasks,
            notifications,
            daily_stats,
        }
    }
}

fn worker(id: &str, name: &str, role: &str, phone: &str, status: WorkerStatus) -> Worker {
    let handle = name.split_whitespace().next().unwrap_or(name).to_lowercase();
    Worker {
        id: id.to_string(),
        name: name.to_string(),
        avatar: None,
        role: role.to_string(),
        phone: phone.to_string(),
        email: format!("{}@workertrack.app", handle),
        status,
    }
}

fn location(id: &str, name: &str, address: &str, latitude: f64, longitude: f64) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        latitude,
        longitude,
    }
}
