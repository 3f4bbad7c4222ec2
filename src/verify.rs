//! Simulated AI verification and upload of work photos.
//!
//! The "analysis" is a fixed delay followed by a scripted verdict; the real
//! work is copying the picked image into app storage and, when allowed, the
//! user's gallery.

use chrono::Utc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::time::Duration;

use crate::device::{DeviceError, FileHandle, Gallery, Permission, PhotoStore};
use crate::model::{AiAnalysisResult, PhotoSource, VerificationStatus, WorkPhoto};
use crate::tasks::{sleep_cancellable, TaskOutcome, TaskProgress, TaskUpdate};

/// Number of progress updates sent while the scan "runs".
const SCAN_STEPS: usize = 10;

pub const FAILURE_TITLE: &str = "Protocol Error";
pub const FAILURE_MESSAGE: &str = "Verification failed to write to local disk.";

#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub image: FileHandle,
    pub task_id: String,
    pub caption: Option<String>,
}

/// Persist the image and build the verified photo record.
pub fn verify_photo(
    request: &VerificationRequest,
    store: &dyn PhotoStore,
    gallery: &dyn Gallery,
) -> Result<WorkPhoto, DeviceError> {
    let now = Utc::now();
    let file_name = format!(
        "VERIFIED_LOG_{}.{}",
        now.timestamp_millis(),
        request.image.extension()
    );
    let persisted = store.persist_image(&request.image, &file_name)?;

    let mut details = vec![
        "Work activity detected in frame".to_string(),
        "Evidence saved to device storage".to_string(),
    ];

    match gallery.request_permission() {
        Permission::Granted => {
            gallery.save_to_gallery(&persisted)?;
            details.push("Copy saved to gallery".to_string());
        }
        Permission::Denied => {
            tracing::info!("Gallery permission denied, keeping photo in app storage only");
        }
    }

    Ok(WorkPhoto {
        id: format!("photo-{}", now.timestamp_millis()),
        uri: PhotoSource::Uri(persisted.to_uri()),
        timestamp: now,
        caption: request.caption.clone(),
        ai_verified: true,
        ai_analysis: Some(AiAnalysisResult {
            confidence: 92,
            work_detected: true,
            category: "Field Work".to_string(),
            details,
            suggestions: None,
            verification_status: VerificationStatus::Verified,
        }),
        task_id: request.task_id.clone(),
    })
}

/// Scan delay, then persistence. Runs on a worker thread.
pub fn run_verification(
    request: VerificationRequest,
    store: &dyn PhotoStore,
    gallery: &dyn Gallery,
    scan_delay: Duration,
    tx: mpsc::Sender<TaskUpdate>,
    cancel_flag: &AtomicBool,
) {
    let _ = tx.send(TaskUpdate::Started { total: SCAN_STEPS });

    let step = scan_delay / SCAN_STEPS as u32;
    for i in 0..SCAN_STEPS {
        if !sleep_cancellable(step, cancel_flag) {
            let _ = tx.send(TaskUpdate::Cancelled);
            return;
        }
        let _ = tx.send(TaskUpdate::Progress(
            TaskProgress::new(i + 1, SCAN_STEPS).with_message("COMPUTING..."),
        ));
    }

    match verify_photo(&request, store, gallery) {
        Ok(photo) => {
            tracing::info!(task = %request.task_id, photo = %photo.id, "Photo verified");
            let _ = tx.send(TaskUpdate::Completed {
                message: "Verification passed".to_string(),
                outcome: TaskOutcome::Verified(Box::new(photo)),
            });
        }
        Err(e) => {
            tracing::error!(task = %request.task_id, error = %e, "Photo verification failed");
            let _ = tx.send(TaskUpdate::Failed {
                error: e.to_string(),
            });
        }
    }
}

/// Progress bar that advances `step_percent` every tick and completes after
/// `duration`, whichever comes last.
pub fn run_upload(
    duration: Duration,
    tick: Duration,
    step_percent: u8,
    tx: mpsc::Sender<TaskUpdate>,
    cancel_flag: &AtomicBool,
) {
    let _ = tx.send(TaskUpdate::Started { total: 100 });

    let step = usize::from(step_percent.max(1));
    let mut percent = 0usize;
    let mut elapsed = Duration::ZERO;

    while percent < 100 || elapsed < duration {
        let wait = if percent < 100 {
            tick
        } else {
            duration - elapsed
        };
        if !sleep_cancellable(wait, cancel_flag) {
            let _ = tx.send(TaskUpdate::Cancelled);
            return;
        }
        elapsed += wait;
        if percent < 100 {
            percent = (percent + step).min(100);
            let _ = tx.send(TaskUpdate::Progress(TaskProgress::new(percent, 100)));
        }
    }

    let _ = tx.send(TaskUpdate::Completed {
        message: "Harvest data sent to HQ.".to_string(),
        outcome: TaskOutcome::Uploaded,
    });
}

/// Wait, then deliver a fixed outcome.
pub fn run_delayed(
    delay: Duration,
    message: impl Into<String>,
    outcome: TaskOutcome,
    tx: mpsc::Sender<TaskUpdate>,
    cancel_flag: &AtomicBool,
) {
    let _ = tx.send(TaskUpdate::Started { total: 1 });
    if !sleep_cancellable(delay, cancel_flag) {
        let _ = tx.send(TaskUpdate::Cancelled);
        return;
    }
    let _ = tx.send(TaskUpdate::Completed {
        message: message.into(),
        outcome,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PersistedUri;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    struct FakeStore {
        fail: bool,
    }

    impl PhotoStore for FakeStore {
        fn persist_image(&self, _image: &FileHandle, file_name: &str) -> Result<PersistedUri, DeviceError> {
            if self.fail {
                Err(DeviceError::StorageUnavailable)
            } else {
                Ok(PersistedUri::new(format!("/photos/{}", file_name)))
            }
        }
    }

    struct FakeGallery {
        permission: Permission,
        saved: Mutex<Vec<PersistedUri>>,
    }

    impl FakeGallery {
        fn new(permission: Permission) -> Self {
            Self {
                permission,
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    impl Gallery for FakeGallery {
        fn request_permission(&self) -> Permission {
            self.permission
        }

        fn save_to_gallery(&self, image: &PersistedUri) -> Result<(), DeviceError> {
            self.saved.lock().unwrap().push(image.clone());
            Ok(())
        }
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            image: FileHandle::new("/tmp/pick.png"),
            task_id: "t1".to_string(),
            caption: Some("Row 14".to_string()),
        }
    }

    fn drain(rx: mpsc::Receiver<TaskUpdate>) -> Vec<TaskUpdate> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_verify_builds_verified_photo() {
        let gallery = FakeGallery::new(Permission::Granted);
        let photo = verify_photo(&request(), &FakeStore { fail: false }, &gallery).unwrap();

        assert_eq!(photo.task_id, "t1");
        assert!(photo.ai_verified);
        assert_eq!(photo.caption.as_deref(), Some("Row 14"));
        let analysis = photo.ai_analysis.unwrap();
        assert_eq!(analysis.verification_status, VerificationStatus::Verified);
        assert!(analysis.work_detected);
        match photo.uri {
            PhotoSource::Uri(uri) => {
                assert!(uri.starts_with("file:///photos/VERIFIED_LOG_"));
                assert!(uri.ends_with(".png"));
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(gallery.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_denied_gallery_is_not_a_failure() {
        let gallery = FakeGallery::new(Permission::Denied);
        let photo = verify_photo(&request(), &FakeStore { fail: false }, &gallery).unwrap();
        assert!(photo.ai_verified);
        assert!(gallery.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_is_reported() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(false);
        run_verification(
            request(),
            &FakeStore { fail: true },
            &FakeGallery::new(Permission::Granted),
            Duration::from_millis(10),
            tx,
            &flag,
        );

        let updates = drain(rx);
        assert!(matches!(
            updates.last(),
            Some(TaskUpdate::Failed { error }) if error == "device storage is not available"
        ));
    }

    #[test]
    fn test_verification_completes_after_scan() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(false);
        run_verification(
            request(),
            &FakeStore { fail: false },
            &FakeGallery::new(Permission::Granted),
            Duration::from_millis(20),
            tx,
            &flag,
        );

        let updates = drain(rx);
        assert!(matches!(updates.first(), Some(TaskUpdate::Started { total: SCAN_STEPS })));
        let progress_count = updates
            .iter()
            .filter(|u| matches!(u, TaskUpdate::Progress(_)))
            .count();
        assert_eq!(progress_count, SCAN_STEPS);
        assert!(matches!(
            updates.last(),
            Some(TaskUpdate::Completed {
                outcome: TaskOutcome::Verified(_),
                ..
            })
        ));
    }

    #[test]
    fn test_cancelled_scan_does_not_persist() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(true);
        run_verification(
            request(),
            &FakeStore { fail: false },
            &FakeGallery::new(Permission::Granted),
            Duration::from_secs(5),
            tx,
            &flag,
        );
        assert!(matches!(drain(rx).last(), Some(TaskUpdate::Cancelled)));
    }

    #[test]
    fn test_upload_steps_to_hundred() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(false);
        run_upload(Duration::from_millis(30), Duration::from_millis(1), 5, tx, &flag);

        let updates = drain(rx);
        let percents: Vec<usize> = updates
            .iter()
            .filter_map(|u| match u {
                TaskUpdate::Progress(p) => Some(p.current),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 20);
        assert_eq!(percents.first(), Some(&5));
        assert_eq!(percents.last(), Some(&100));
        assert!(matches!(
            updates.last(),
            Some(TaskUpdate::Completed {
                outcome: TaskOutcome::Uploaded,
                ..
            })
        ));
    }

    #[test]
    fn test_upload_cancel() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(false);
        flag.store(true, Ordering::SeqCst);
        run_upload(Duration::from_secs(3), Duration::from_millis(120), 5, tx, &flag);
        assert!(matches!(drain(rx).last(), Some(TaskUpdate::Cancelled)));
    }

    #[test]
    fn test_delayed_outcome() {
        let (tx, rx) = mpsc::channel();
        let flag = AtomicBool::new(false);
        run_delayed(
            Duration::from_millis(5),
            "Task progress has been updated successfully!",
            TaskOutcome::ProgressUpdated,
            tx,
            &flag,
        );
        assert!(matches!(
            drain(rx).last(),
            Some(TaskUpdate::Completed {
                outcome: TaskOutcome::ProgressUpdated,
                ..
            })
        ));
    }
}
