use std::{
    fs::{self, File, OpenOptions},
    io::{LineWriter, Write},
    path::{Path, PathBuf},
};

use eyre::{Context, OptionExt};

use crate::{config::DiskConfig, logging::DIAGNOSTIC_TARGET};

pub const FILE_PREFIX: &str = "logs";
pub const FILE_EXTENSION: &str = "csv";

pub fn log_file_path(folder: &Path, index: usize) -> PathBuf {
    folder.join(format!("{}_{}.{}", FILE_PREFIX, index, FILE_EXTENSION))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileInfo {
    pub index: usize,
    pub path: PathBuf,
    pub size: u64,
}

/// Existing rotation files, `logs_0.csv` upwards, stopping at the first gap.
pub fn list_log_files(folder: &Path) -> Vec<LogFileInfo> {
    let mut files = Vec::new();

    let mut index = 0;
    let mut path = log_file_path(folder, index);
    while let Ok(metadata) = fs::metadata(&path) {
        files.push(LogFileInfo {
            index,
            path,
            size: metadata.len(),
        });
        index += 1;
        path = log_file_path(folder, index);
    }

    files
}

/// An empty file takes any write, oversized ones included.
fn fits(size: u64, pending: u64, max_file_size: u64) -> bool {
    size == 0 || size.saturating_add(pending) <= max_file_size
}

struct OpenLog {
    path: PathBuf,
    writer: LineWriter<File>,
    size: u64,
}

/// Decides which file receives the next append. Owned by the disk writer's
/// worker thread and never shared.
pub struct RotatingFileManager {
    folder: PathBuf,
    max_file_size: u64,
    current: Option<OpenLog>,
    folder_error_reported: bool,
}

impl RotatingFileManager {
    pub fn new(config: &DiskConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            max_file_size: config.max_file_size,
            current: None,
            folder_error_reported: false,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    /// Bytes committed to the open file, zero when none is open.
    pub fn current_size(&self) -> u64 {
        self.current.as_ref().map_or(0, |open| open.size)
    }

    /// Returns the file that takes the next `pending` bytes, rotating first
    /// when the open file would overflow.
    ///
    /// The last existing file is reused only if it is below the ceiling and
    /// the pending write still fits; a file merely below the ceiling is not
    /// enough.
    pub fn select_writer(&mut self, pending: u64) -> eyre::Result<&mut LineWriter<File>> {
        if let Some(open) = &self.current {
            if !fits(open.size, pending, self.max_file_size) {
                tracing::debug!(
                    target: DIAGNOSTIC_TARGET,
                    "rotating {} at {} bytes",
                    open.path.display(),
                    open.size
                );
                if let Err(err) = self.close() {
                    tracing::debug!(target: DIAGNOSTIC_TARGET, "{:#}", err);
                }
            }
        }

        if self.current.is_none() {
            self.open_file(pending)?;
        }

        self.current
            .as_mut()
            .map(|open| &mut open.writer)
            .ok_or_eyre("No log file is open")
    }

    /// Appends `content` and flushes it. Any failure closes the file so the
    /// next call starts file selection from scratch.
    pub fn write(&mut self, content: &str) -> eyre::Result<()> {
        let pending = content.len() as u64;

        let result = self.select_writer(pending).and_then(|writer| {
            writer
                .write_all(content.as_bytes())
                .context("Failed appending to log file")?;
            writer.flush().context("Failed flushing log file")
        });

        match result {
            Ok(()) => {
                if let Some(open) = self.current.as_mut() {
                    open.size += pending;
                }
                Ok(())
            }
            Err(err) => {
                self.current = None;
                Err(err)
            }
        }
    }

    pub fn close(&mut self) -> eyre::Result<()> {
        match self.current.take() {
            Some(mut open) => open
                .writer
                .flush()
                .with_context(|| format!("Failed flushing {}", open.path.display())),
            None => Ok(()),
        }
    }

    fn open_file(&mut self, pending: u64) -> eyre::Result<()> {
        self.ensure_folder()?;

        let files = list_log_files(&self.folder);
        let path = match files.last() {
            Some(last) if fits(last.size, pending, self.max_file_size) => last.path.clone(),
            _ => log_file_path(&self.folder, files.len()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed opening or creating log file {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Failed reading size of {}", path.display()))?
            .len();

        tracing::debug!(
            target: DIAGNOSTIC_TARGET,
            "writing to {} ({} bytes)",
            path.display(),
            size
        );

        self.current = Some(OpenLog {
            path,
            writer: LineWriter::new(file),
            size,
        });
        self.folder_error_reported = false;

        Ok(())
    }

    fn ensure_folder(&mut self) -> eyre::Result<()> {
        if self.folder.is_dir() {
            return Ok(());
        }

        if let Err(err) = fs::create_dir_all(&self.folder) {
            if self.folder_error_reported {
                tracing::debug!(
                    target: DIAGNOSTIC_TARGET,
                    "log folder {} still unavailable: {}",
                    self.folder.display(),
                    err
                );
            } else {
                tracing::error!(
                    target: DIAGNOSTIC_TARGET,
                    "failed creating log folder {}, records are dropped until it exists: {}",
                    self.folder.display(),
                    err
                );
                self.folder_error_reported = true;
            }

            return Err(eyre::Report::new(err)
                .wrap_err(format!("Failed creating log folder {}", self.folder.display())));
        }

        Ok(())
    }
}
