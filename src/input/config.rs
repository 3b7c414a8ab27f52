//! Schema store configuration
//!
//! Modes apply on unix only and are still subject to the process umask.

/// Configuration for how definitions are written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Mode for created directories.
    pub dir_mode: u32,
    /// Mode for written definition files.
    pub file_mode: u32,
    /// Whether to fsync a definition file before it replaces the old one.
    pub sync_on_save: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir_mode: 0o777,
            file_mode: 0o666,
            sync_on_save: true,
        }
    }
}

impl StoreConfig {
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Skip fsync on save. Intended for tests and throwaway directories.
    pub fn without_sync(mut self) -> Self {
        self.sync_on_save = false;
        self
    }
}
