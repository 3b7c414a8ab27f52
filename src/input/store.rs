//! Schema store: one file per definition at `<dir>/<name>`.
//!
//! Saves write a sibling temp file and rename it over the target, so a
//! reader sees either the old definition or the new one. There is no
//! locking; concurrent saves of the same name race and the last rename wins.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::codec::{self, WireSchema};
use super::config::StoreConfig;
use super::errors::{InputDefinitionError, InputResult};
use super::LOG_TARGET;

/// Reads and writes persisted definitions under one directory.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    dir: PathBuf,
    config: StoreConfig,
}

impl SchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_config(dir, StoreConfig::default())
    }

    pub fn with_config(dir: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    /// Returns the directory holding definition files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path for the definition called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Creates the directory and any missing parents.
    pub fn ensure_dir(&self) -> InputResult<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.config.dir_mode);
        }
        builder
            .create(&self.dir)
            .map_err(|e| InputDefinitionError::io(&self.dir, e))
    }

    /// Encodes `schema` and replaces the file for `name` with it.
    pub fn save(&self, name: &str, schema: &WireSchema) -> InputResult<()> {
        self.ensure_dir()?;

        let bytes = codec::encode(schema);
        let path = self.path_for(name);
        let tmp_path = self.dir.join(format!(".{name}.tmp"));

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.config.file_mode);
        }

        let mut file: File = options
            .open(&tmp_path)
            .map_err(|e| InputDefinitionError::io(&tmp_path, e))?;
        let written = file.write_all(&bytes).and_then(|()| {
            if self.config.sync_on_save {
                file.sync_all()
            } else {
                Ok(())
            }
        });
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(InputDefinitionError::io(&tmp_path, e));
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(InputDefinitionError::io(&path, e));
        }

        debug!(
            target: LOG_TARGET,
            path = %path.display(),
            bytes = bytes.len(),
            frames = schema.frames.len(),
            fields = schema.fields.len(),
            "saved input definition"
        );
        Ok(())
    }

    /// Reads and decodes the definition called `name`.
    ///
    /// Returns `Ok(None)` when no file exists; a file that exists but cannot
    /// be decoded is an error.
    pub fn load(&self, name: &str) -> InputResult<Option<WireSchema>> {
        let path = self.path_for(name);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(target: LOG_TARGET, path = %path.display(), "no persisted input definition");
                return Ok(None);
            }
            Err(e) => return Err(InputDefinitionError::io(&path, e)),
        };

        let schema = codec::decode(&bytes).map_err(|source| InputDefinitionError::Decode {
            path: Some(path.clone()),
            source,
        })?;

        debug!(
            target: LOG_TARGET,
            path = %path.display(),
            bytes = bytes.len(),
            "loaded input definition"
        );
        Ok(Some(schema))
    }
}
