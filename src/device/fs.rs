//! Filesystem-backed device capabilities for the terminal build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{
    directions_url, DeviceError, Directions, FileHandle, Gallery, ImagePicker, ImageSource,
    Permission, PersistedUri, PhotoStore,
};

/// A directory that cannot be created means no storage, unless the OS
/// refused access.
fn dir_error(dir: &Path, e: io::Error) -> DeviceError {
    tracing::error!(dir = %dir.display(), error = %e, "Failed to create directory");
    match e.kind() {
        io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied,
        _ => DeviceError::StorageUnavailable,
    }
}

fn copy_error(path: &Path, source: io::Error) -> DeviceError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied,
        _ => DeviceError::CopyFailed {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Copies picked images into the app's photo directory.
pub struct FsPhotoStore {
    dir: Option<PathBuf>,
}

impl FsPhotoStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn ensure_dir(&self) -> Result<&Path, DeviceError> {
        let dir = self.dir.as_deref().ok_or(DeviceError::StorageUnavailable)?;
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| dir_error(dir, e))?;
        }
        Ok(dir)
    }
}

impl PhotoStore for FsPhotoStore {
    fn persist_image(&self, image: &FileHandle, file_name: &str) -> Result<PersistedUri, DeviceError> {
        if !image.path().is_file() {
            return Err(DeviceError::NotFound(image.path().to_path_buf()));
        }

        let target = self.ensure_dir()?.join(file_name);
        fs::copy(image.path(), &target).map_err(|e| copy_error(image.path(), e))?;

        tracing::info!(from = %image.path().display(), to = %target.display(), "Persisted photo");
        Ok(PersistedUri::new(target))
    }
}

/// Mirrors persisted photos into a user-visible pictures folder.
pub struct FsGallery {
    enabled: bool,
    dir: Option<PathBuf>,
}

impl FsGallery {
    pub fn new(enabled: bool, dir: Option<PathBuf>) -> Self {
        Self { enabled, dir }
    }
}

impl Gallery for FsGallery {
    fn request_permission(&self) -> Permission {
        if self.enabled && self.dir.is_some() {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn save_to_gallery(&self, image: &PersistedUri) -> Result<(), DeviceError> {
        let dir = match (&self.dir, self.enabled) {
            (Some(dir), true) => dir,
            _ => return Err(DeviceError::PermissionDenied),
        };

        fs::create_dir_all(dir).map_err(|e| dir_error(dir, e))?;

        let name = image
            .path()
            .file_name()
            .ok_or_else(|| DeviceError::NotFound(image.path().to_path_buf()))?;
        let target = dir.join(name);
        fs::copy(image.path(), &target).map_err(|e| copy_error(image.path(), e))?;

        tracing::debug!(to = %target.display(), "Saved photo to gallery");
        Ok(())
    }
}

/// Resolves a typed path (gallery) or the newest capture (camera).
pub struct PathImagePicker {
    capture_dir: Option<PathBuf>,
    extensions: Vec<String>,
}

impl PathImagePicker {
    pub fn new(capture_dir: Option<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            capture_dir,
            extensions,
        }
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)))
    }

    fn newest_capture(&self) -> Result<Option<FileHandle>, DeviceError> {
        let dir = self.capture_dir.as_deref().ok_or(DeviceError::NoCamera)?;
        let read_dir = fs::read_dir(dir).map_err(|_| DeviceError::NotFound(dir.to_path_buf()))?;

        let newest = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.is_image(path))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by_key(|(modified, _)| *modified)
            .map(|(_, path)| FileHandle::new(path));

        Ok(newest)
    }
}

impl ImagePicker for PathImagePicker {
    fn pick_image(&self, source: ImageSource, hint: &str) -> Result<Option<FileHandle>, DeviceError> {
        match source {
            ImageSource::Camera => self.newest_capture(),
            ImageSource::Gallery => {
                let hint = hint.trim();
                if hint.is_empty() {
                    return Ok(None);
                }
                let path = expand_home(hint);
                if !path.is_file() || !self.is_image(&path) {
                    return Err(DeviceError::NotFound(path));
                }
                Ok(Some(FileHandle::new(path)))
            }
        }
    }
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    }
}

/// Hands a `geo:` URL to the platform opener or a configured command.
pub struct SystemDirections {
    command: Option<String>,
}

impl SystemDirections {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }

    fn opener(&self) -> &str {
        if let Some(ref command) = self.command {
            return command.as_str();
        }
        #[cfg(target_os = "linux")]
        {
            "xdg-open"
        }
        #[cfg(target_os = "macos")]
        {
            "open"
        }
        #[cfg(target_os = "windows")]
        {
            "start"
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            "xdg-open"
        }
    }
}

impl Directions for SystemDirections {
    fn open_external_directions(&self, address: &str) -> Result<(), DeviceError> {
        let url = directions_url(address);
        let opener = self.opener();

        let mut child = std::process::Command::new(opener)
            .arg(&url)
            .spawn()
            .map_err(|source| DeviceError::LaunchFailed {
                command: opener.to_string(),
                source,
            })?;

        // Reap the opener in the background so it does not linger as a zombie
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                tracing::warn!(error = %e, "Failed to wait for directions opener");
            }
        });

        tracing::info!(%url, "Opened directions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string()]
    }

    #[test]
    fn test_persist_copies_into_photo_dir() {
        let src_dir = tempfile::tempdir().unwrap();
        let store_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("shot.jpg");
        fs::write(&source, b"jpeg bytes").unwrap();

        let store = FsPhotoStore::new(Some(store_dir.path().join("photos")));
        let uri = store
            .persist_image(&FileHandle::new(&source), "VERIFIED_LOG_1.jpg")
            .unwrap();

        assert_eq!(uri.path(), store_dir.path().join("photos/VERIFIED_LOG_1.jpg"));
        assert_eq!(fs::read(uri.path()).unwrap(), b"jpeg bytes");
        assert!(source.exists());
    }

    #[test]
    fn test_persist_without_storage() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("shot.jpg");
        fs::write(&source, b"x").unwrap();

        let store = FsPhotoStore::new(None);
        let result = store.persist_image(&FileHandle::new(&source), "a.jpg");
        assert!(matches!(result, Err(DeviceError::StorageUnavailable)));
    }

    #[test]
    fn test_persist_missing_source() {
        let store_dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(Some(store_dir.path().to_path_buf()));
        let result = store.persist_image(&FileHandle::new(store_dir.path().join("gone.jpg")), "a.jpg");
        assert!(matches!(result, Err(DeviceError::NotFound(_))));
    }

    #[test]
    fn test_access_denied_is_permission_error() {
        let denied = || io::Error::from(io::ErrorKind::PermissionDenied);
        let dir = Path::new("/srv/photos");

        assert!(matches!(dir_error(dir, denied()), DeviceError::PermissionDenied));
        assert!(matches!(copy_error(dir, denied()), DeviceError::PermissionDenied));
        assert!(matches!(
            dir_error(dir, io::Error::from(io::ErrorKind::Other)),
            DeviceError::StorageUnavailable
        ));
        assert!(matches!(
            copy_error(dir, io::Error::from(io::ErrorKind::NotFound)),
            DeviceError::CopyFailed { .. }
        ));
    }

    #[test]
    fn test_configured_opener_wins() {
        let directions = SystemDirections::new(Some("firefox".to_string()));
        assert_eq!(directions.opener(), "firefox");
        assert!(!SystemDirections::new(None).opener().is_empty());
    }

    #[test]
    fn test_persist_into_file_path_is_storage_error() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("shot.jpg");
        fs::write(&source, b"x").unwrap();
        let blocker = src_dir.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();

        let store = FsPhotoStore::new(Some(blocker.join("photos")));
        let result = store.persist_image(&FileHandle::new(&source), "a.jpg");
        assert!(matches!(result, Err(DeviceError::StorageUnavailable)));
    }

    #[test]
    fn test_gallery_permission() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            FsGallery::new(true, Some(dir.path().to_path_buf())).request_permission(),
            Permission::Granted
        );
        assert_eq!(
            FsGallery::new(false, Some(dir.path().to_path_buf())).request_permission(),
            Permission::Denied
        );
        assert_eq!(FsGallery::new(true, None).request_permission(), Permission::Denied);
    }

    #[test]
    fn test_gallery_save_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("VERIFIED_LOG_2.jpg");
        fs::write(&image, b"pixels").unwrap();
        let gallery_dir = dir.path().join("Pictures/WorkerTrack");

        let gallery = FsGallery::new(true, Some(gallery_dir.clone()));
        gallery.save_to_gallery(&PersistedUri::new(&image)).unwrap();
        assert!(gallery_dir.join("VERIFIED_LOG_2.jpg").exists());

        let denied = FsGallery::new(false, Some(gallery_dir));
        assert!(matches!(
            denied.save_to_gallery(&PersistedUri::new(&image)),
            Err(DeviceError::PermissionDenied)
        ));
    }

    #[test]
    fn test_gallery_pick_from_typed_path() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("palm.PNG");
        fs::write(&image, b"x").unwrap();
        let text = dir.path().join("notes.txt");
        fs::write(&text, b"x").unwrap();

        let picker = PathImagePicker::new(None, extensions());
        assert_eq!(picker.pick_image(ImageSource::Gallery, "  ").unwrap(), None);
        assert_eq!(
            picker
                .pick_image(ImageSource::Gallery, &image.to_string_lossy())
                .unwrap(),
            Some(FileHandle::new(&image))
        );
        assert!(matches!(
            picker.pick_image(ImageSource::Gallery, &text.to_string_lossy()),
            Err(DeviceError::NotFound(_))
        ));
    }

    #[test]
    fn test_camera_needs_capture_dir() {
        let picker = PathImagePicker::new(None, extensions());
        assert!(matches!(
            picker.pick_image(ImageSource::Camera, ""),
            Err(DeviceError::NoCamera)
        ));
    }

    #[test]
    fn test_camera_picks_an_image_from_capture_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        let capture = dir.path().join("IMG_0001.jpg");
        fs::write(&capture, b"x").unwrap();

        let picker = PathImagePicker::new(Some(dir.path().to_path_buf()), extensions());
        assert_eq!(
            picker.pick_image(ImageSource::Camera, "").unwrap(),
            Some(FileHandle::new(&capture))
        );
    }

    #[test]
    fn test_directions_with_missing_command() {
        let directions = SystemDirections::new(Some("/nonexistent/opener-binary".to_string()));
        assert!(matches!(
            directions.open_external_directions("Estate Nursery"),
            Err(DeviceError::LaunchFailed { .. })
        ));
    }
}
