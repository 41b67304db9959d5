//! Cross-process error surfacing.
//!
//! The last error is written to a shared file keyed by a fixed name, then a
//! companion signal file is bumped so a watching host wakes up and reads it.
//! Fire and forget: failures here are logged and dropped.

use super::collaborator::ErrorNotifier;
use crate::config;
use std::error::Error;
use std::path::{Path, PathBuf};

/// [`ErrorNotifier`] backed by files in a directory shared with the host.
#[derive(Debug, Clone)]
pub struct SharedFileNotifier {
    dir: PathBuf,
}

impl SharedFileNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> SharedFileNotifier {
        SharedFileNotifier { dir: dir.into() }
    }

    /// Path the host reads the last error message from.
    pub fn error_path(&self) -> PathBuf {
        self.dir.join(config::LAST_ERROR_KEY)
    }

    /// Path whose modification wakes the host.
    pub fn signal_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", config::LAST_ERROR_KEY, config::SIGNAL_SUFFIX))
    }

    fn write(&self, message: &str) -> Result<(), Box<dyn Error>> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Error creating {}: {e}", self.dir.display()))?;
        write_file(&self.error_path(), message)?;
        let stamp = chrono::Utc::now().to_rfc3339();
        write_file(&self.signal_path(), &stamp)?;
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {}: {e}", path.display()).into())
}

impl ErrorNotifier for SharedFileNotifier {
    fn notify(&self, message: &str) {
        log::warn!("Reporting error to host: {message}");
        if let Err(e) = self.write(message) {
            log::error!("Could not surface error to host: {e}");
        }
    }
}

/// Read back the last surfaced error, host side.
pub fn read_last_error(dir: &Path) -> Option<String> {
    std::fs::read_to_string(dir.join(config::LAST_ERROR_KEY)).ok()
}
