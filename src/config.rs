use std::path::PathBuf;

use eyre::Context;

/// Matches the rotation ceiling Android's disk logger ships with.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024;

/// Settings for [`crate::disk::DiskLogWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskConfig {
    /// Directory holding the `logs_<n>.csv` files. Created on demand.
    pub folder: PathBuf,
    /// Rotation ceiling in bytes.
    pub max_file_size: u64,
}

impl DiskConfig {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(self, max_file_size: u64) -> Self {
        Self {
            max_file_size,
            ..self
        }
    }
}

pub trait ConfigManager: Sized + Clone + Send + Sync {
    fn get_log_folder(&self) -> eyre::Result<PathBuf>;

    fn disk_config(&self) -> eyre::Result<DiskConfig> {
        Ok(DiskConfig::new(self.get_log_folder()?))
    }
}

#[derive(Default, Clone, Debug)]
pub struct LocalConfigManager {
    folder_override: Option<PathBuf>,
}

impl LocalConfigManager {
    pub fn new() -> Self {
        Self {
            folder_override: None,
        }
    }

    pub fn with_folder(folder: Option<PathBuf>) -> Self {
        Self {
            folder_override: folder,
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub fn home_dir() -> eyre::Result<PathBuf> {
    let home = std::env::var("HOME").context("$HOME not found")?;
    Ok(PathBuf::from(home))
}

#[cfg(target_os = "windows")]
pub fn home_dir() -> eyre::Result<PathBuf> {
    let home = std::env::var("USERPROFILE").context("%userprofile% not found")?;
    Ok(PathBuf::from(home))
}

pub fn data_dir() -> eyre::Result<PathBuf> {
    let data_dir = match std::env::var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir()?.join(".local").join("share"),
    };

    Ok(data_dir.join("prettylog"))
}

impl ConfigManager for LocalConfigManager {
    fn get_log_folder(&self) -> eyre::Result<PathBuf> {
        match &self.folder_override {
            Some(folder) => Ok(folder.clone()),
            None => Ok(data_dir()?.join("logs")),
        }
    }
}
