//! In-memory input definition bound to its persisted file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::codec::WireSchema;
use super::config::StoreConfig;
use super::errors::InputResult;
use super::name::validate_name;
use super::store::SchemaStore;
use super::types::{Field, InputFrame};
use super::validator::DefinitionValidator;
use super::LOG_TARGET;

/// A named input definition for one index.
///
/// The definition is persisted at `<path>/<name>`. It is mutated only by
/// [`add_frame`](Self::add_frame), which appends and saves, and by
/// [`load_definition`](Self::load_definition), which replaces the contents
/// wholesale.
///
/// Methods that mutate take `&mut self`; sharing across threads goes through
/// [`SharedInputDefinition`](super::SharedInputDefinition).
#[derive(Debug)]
pub struct InputDefinition {
    name: String,
    index: String,
    store: SchemaStore,
    frames: Vec<InputFrame>,
    fields: Vec<Field>,
}

impl InputDefinition {
    /// Creates an empty definition. No I/O is performed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if `name` fails the naming grammar.
    pub fn new(
        path: impl Into<PathBuf>,
        index: impl Into<String>,
        name: impl Into<String>,
    ) -> InputResult<Self> {
        Self::with_config(path, index, name, StoreConfig::default())
    }

    /// Creates an empty definition whose store uses `config`.
    pub fn with_config(
        path: impl Into<PathBuf>,
        index: impl Into<String>,
        name: impl Into<String>,
        config: StoreConfig,
    ) -> InputResult<Self> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            name,
            index: index.into(),
            store: SchemaStore::with_config(path, config),
            frames: Vec::new(),
            fields: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory the definition file lives in.
    pub fn path(&self) -> &Path {
        self.store.dir()
    }

    /// Returns the index this definition feeds.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns the full path of the persisted file.
    pub fn file_path(&self) -> PathBuf {
        self.store.path_for(&self.name)
    }

    /// Frames in insertion order.
    pub fn frames(&self) -> &[InputFrame] {
        &self.frames
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Ensures the storage directory exists and loads any persisted
    /// definition with this name. A missing file leaves the definition empty.
    pub fn open(&mut self) -> InputResult<()> {
        self.store.ensure_dir()?;

        match self.store.load(&self.name)? {
            Some(schema) => self.load_definition(&schema)?,
            None => debug!(
                target: LOG_TARGET,
                index = %self.index,
                name = %self.name,
                "opened fresh input definition"
            ),
        }
        Ok(())
    }

    /// Replaces name, frames and fields with the contents of `schema`.
    ///
    /// The whole schema is validated first; on any error the definition is
    /// left exactly as it was. An empty schema name keeps the current name.
    pub fn load_definition(&mut self, schema: &WireSchema) -> InputResult<()> {
        if !schema.name.is_empty() {
            validate_name(&schema.name)?;
        }
        let (frames, fields) = DefinitionValidator::validate(schema)?;

        if !schema.name.is_empty() {
            self.name = schema.name.clone();
        }
        self.frames = frames;
        self.fields = fields;

        debug!(
            target: LOG_TARGET,
            index = %self.index,
            name = %self.name,
            frames = self.frames.len(),
            fields = self.fields.len(),
            "loaded input definition"
        );
        Ok(())
    }

    /// Appends `frame` and persists the whole definition.
    ///
    /// If the save fails the frame stays in memory; the caller must treat the
    /// in-memory and on-disk state as diverged.
    pub fn add_frame(&mut self, frame: InputFrame) -> InputResult<()> {
        let frame_name = frame.name.clone();
        self.frames.push(frame);

        if let Err(err) = self.save() {
            warn!(
                target: LOG_TARGET,
                index = %self.index,
                name = %self.name,
                frame = %frame_name,
                error = %err,
                "frame added in memory but not persisted"
            );
            return Err(err);
        }
        Ok(())
    }

    /// Converts the definition into wire form.
    pub fn encode(&self) -> InputResult<WireSchema> {
        let fields = self
            .fields
            .iter()
            .map(Field::encode)
            .collect::<InputResult<Vec<_>>>()?;

        Ok(WireSchema {
            name: self.name.clone(),
            frames: self.frames.iter().map(InputFrame::encode).collect(),
            fields,
        })
    }

    /// Writes the full definition to its file.
    pub fn save(&self) -> InputResult<()> {
        let schema = self.encode()?;
        self.store.save(&self.name, &schema)
    }
}
