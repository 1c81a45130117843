//! Path management
//!
//! ## Path Resolution Order
//!
//! 1. `HOUSETAB_DATA_DIR` environment variable (if set)
//! 2. The platform config directory via [`directories::ProjectDirs`]
//!    (Linux: `~/.config/housetab`, macOS: `~/Library/Application
//!    Support/housetab`, Windows: `%APPDATA%\housetab`)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{LedgerError, LedgerResult};

/// Manages all paths used by housetab
#[derive(Debug, Clone)]
pub struct HousetabPaths {
    /// Base directory for all housetab data
    base_dir: PathBuf,
}

impl HousetabPaths {
    /// Create a new HousetabPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> LedgerResult<Self> {
        let base_dir = if let Ok(custom) = std::env::var("HOUSETAB_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            let dirs = ProjectDirs::from("", "", "housetab").ok_or_else(|| {
                LedgerError::Config("Could not determine a config directory".into())
            })?;
            dirs.config_dir().to_path_buf()
        };

        Ok(Self { base_dir })
    }

    /// Create HousetabPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding the local key-value records
    pub fn store_dir(&self) -> PathBuf {
        self.base_dir.join("store")
    }

    /// Directory holding journaled remote writes awaiting push
    pub fn pending_dir(&self) -> PathBuf {
        self.base_dir.join("pending")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> LedgerResult<()> {
        for dir in [self.base_dir.clone(), self.store_dir(), self.pending_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                LedgerError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Check if housetab has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
