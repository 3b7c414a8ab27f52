//! Thread-safe handle over a single input definition.
//!
//! Every mutate-then-persist sequence runs under one mutex guard, so two
//! writers can never interleave an append with the other's save. The guard
//! is scoped to each call and released on every exit path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::codec::WireSchema;
use super::definition::InputDefinition;
use super::errors::InputResult;
use super::types::{Field, InputDefinitionInfo, InputFrame};

/// Cloneable, mutex-guarded [`InputDefinition`].
#[derive(Debug, Clone)]
pub struct SharedInputDefinition {
    inner: Arc<Mutex<InputDefinition>>,
}

impl SharedInputDefinition {
    pub fn new(definition: InputDefinition) -> Self {
        Self {
            inner: Arc::new(Mutex::new(definition)),
        }
    }

    fn guard(&self) -> MutexGuard<'_, InputDefinition> {
        // load_definition only ever swaps in fully validated state, so a
        // poisoned guard still holds a consistent definition.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) -> InputResult<()> {
        self.guard().open()
    }

    pub fn add_frame(&self, frame: InputFrame) -> InputResult<()> {
        self.guard().add_frame(frame)
    }

    pub fn load_definition(&self, schema: &WireSchema) -> InputResult<()> {
        self.guard().load_definition(schema)
    }

    /// Replaces the definition with a creation request and persists it.
    pub fn apply_info(&self, info: &InputDefinitionInfo) -> InputResult<()> {
        let schema = info.encode()?;
        let mut definition = self.guard();
        definition.load_definition(&schema)?;
        definition.save()
    }

    pub fn name(&self) -> String {
        self.guard().name().to_string()
    }

    /// Snapshot of the frames at the time of the call.
    pub fn frames(&self) -> Vec<InputFrame> {
        self.guard().frames().to_vec()
    }

    /// Snapshot of the fields at the time of the call.
    pub fn fields(&self) -> Vec<Field> {
        self.guard().fields().to_vec()
    }

    /// Runs `f` with exclusive access to the definition.
    pub fn with<R>(&self, f: impl FnOnce(&mut InputDefinition) -> R) -> R {
        let mut definition = self.guard();
        f(&mut *definition)
    }
}
