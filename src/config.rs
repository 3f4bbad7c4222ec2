use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional JSON seed replacing the built-in estate data.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub gallery: GalleryConfig,

    #[serde(default)]
    pub map: MapConfig,
}

/// Timings for the simulated device and AI behaviour, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_scan_delay_ms")]
    pub scan_delay_ms: u64,

    #[serde(default = "default_upload_duration_ms")]
    pub upload_duration_ms: u64,

    #[serde(default = "default_upload_tick_ms")]
    pub upload_tick_ms: u64,

    #[serde(default = "default_upload_step_percent")]
    pub upload_step_percent: u8,

    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Random extra delay added to each assistant reply.
    #[serde(default = "default_typing_jitter_ms")]
    pub typing_jitter_ms: u64,

    #[serde(default = "default_progress_update_ms")]
    pub progress_update_ms: u64,

    #[serde(default = "default_signup_delay_ms")]
    pub signup_delay_ms: u64,

    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

fn default_scan_delay_ms() -> u64 {
    3000
}

fn default_upload_duration_ms() -> u64 {
    3000
}

fn default_upload_tick_ms() -> u64 {
    120
}

fn default_upload_step_percent() -> u8 {
    5
}

fn default_typing_delay_ms() -> u64 {
    1000
}

fn default_typing_jitter_ms() -> u64 {
    1000
}

fn default_progress_update_ms() -> u64 {
    1500
}

fn default_signup_delay_ms() -> u64 {
    2500
}

fn default_refresh_ms() -> u64 {
    1500
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: default_scan_delay_ms(),
            upload_duration_ms: default_upload_duration_ms(),
            upload_tick_ms: default_upload_tick_ms(),
            upload_step_percent: default_upload_step_percent(),
            typing_delay_ms: default_typing_delay_ms(),
            typing_jitter_ms: default_typing_jitter_ms(),
            progress_update_ms: default_progress_update_ms(),
            signup_delay_ms: default_signup_delay_ms(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

impl SimulationConfig {
    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scan_delay_ms)
    }

    pub fn upload_duration(&self) -> Duration {
        Duration::from_millis(self.upload_duration_ms)
    }

    pub fn upload_tick(&self) -> Duration {
        Duration::from_millis(self.upload_tick_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn typing_jitter(&self) -> Duration {
        Duration::from_millis(self.typing_jitter_ms)
    }

    pub fn progress_update(&self) -> Duration {
        Duration::from_millis(self.progress_update_ms)
    }

    pub fn signup_delay(&self) -> Duration {
        Duration::from_millis(self.signup_delay_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where verified photos are copied. `None` means no writable storage.
    #[serde(default = "default_photo_dir")]
    pub photo_dir: Option<PathBuf>,

    /// Directory a camera drops captures into; enables the camera source.
    #[serde(default)]
    pub capture_dir: Option<PathBuf>,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_photo_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("workertrack").join("photos"))
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "heic", "webp"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            photo_dir: default_photo_dir(),
            capture_dir: None,
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Whether saving to the pictures folder is allowed.
    #[serde(default = "default_gallery_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gallery_path")]
    pub path: Option<PathBuf>,
}

fn default_gallery_enabled() -> bool {
    true
}

fn default_gallery_path() -> Option<PathBuf> {
    dirs::picture_dir().map(|d| d.join("WorkerTrack"))
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            enabled: default_gallery_enabled(),
            path: default_gallery_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapConfig {
    /// Command used to open `geo:` directions URLs (e.g. "firefox").
    /// If not set, uses the system opener (xdg-open on Linux, open on macOS).
    #[serde(default)]
    pub directions_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_path: None,
            simulation: SimulationConfig::default(),
            storage: StorageConfig::default(),
            gallery: GalleryConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl Config {
    /// Load from `WORKERTRACK_CONFIG` or the default location, writing a
    /// default file when none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("WORKERTRACK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            tracing::info!(path = %config_path.display(), "Wrote default config");
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workertrack")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
