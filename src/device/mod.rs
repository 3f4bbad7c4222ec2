//! Device capabilities the upload and map screens rely on.
//!
//! Each capability is a trait so the simulation code can run against the
//! filesystem in the app and against fakes in tests.

mod fs;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use fs::{FsGallery, FsPhotoStore, PathImagePicker, SystemDirections};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device storage is not available")]
    StorageUnavailable,
    #[error("permission denied")]
    PermissionDenied,
    #[error("failed to copy {path}: {source}")]
    CopyFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no image at {0}")]
    NotFound(PathBuf),
    #[error("no camera capture directory configured")]
    NoCamera,
    #[error("failed to launch {command}: {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where the user wants the picture to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

/// A picked image that has not been copied anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle(PathBuf);

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Lowercased extension, defaulting to "jpg".
    pub fn extension(&self) -> String {
        self.0
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "jpg".to_string())
    }
}

/// Location of an image after it was copied into app storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUri(PathBuf);

impl PersistedUri {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn to_uri(&self) -> String {
        format!("file://{}", self.0.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

pub trait ImagePicker {
    /// `Ok(None)` means the user backed out without choosing.
    fn pick_image(&self, source: ImageSource, hint: &str) -> Result<Option<FileHandle>, DeviceError>;
}

pub trait PhotoStore: Send + Sync {
    fn persist_image(&self, image: &FileHandle, file_name: &str) -> Result<PersistedUri, DeviceError>;
}

pub trait Gallery: Send + Sync {
    fn request_permission(&self) -> Permission;
    fn save_to_gallery(&self, image: &PersistedUri) -> Result<(), DeviceError>;
}

pub trait Directions {
    fn open_external_directions(&self, address: &str) -> Result<(), DeviceError>;
}

/// `geo:` URL the platform map app understands.
pub fn directions_url(address: &str) -> String {
    format!("geo:0,0?q={}", urlencoding::encode(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_url_encodes_address() {
        assert_eq!(
            directions_url("Lot 22, Jalan Sungai"),
            "geo:0,0?q=Lot%2022%2C%20Jalan%20Sungai"
        );
    }

    #[test]
    fn test_file_handle_extension() {
        assert_eq!(FileHandle::new("/tmp/IMG_01.JPG").extension(), "jpg");
        assert_eq!(FileHandle::new("/tmp/shot.png").extension(), "png");
        assert_eq!(FileHandle::new("/tmp/noext").extension(), "jpg");
    }

    #[test]
    fn test_persisted_uri() {
        let uri = PersistedUri::new("/data/photos/a.jpg");
        assert_eq!(uri.to_uri(), "file:///data/photos/a.jpg");
    }
}
