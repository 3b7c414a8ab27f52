//! inputdef - validated, persisted input definitions for a bitmap index
//!
//! See [`input`] for the data model, validation rules and on-disk format.

pub mod input;

pub use input::{
    Action, Field, FrameOptions, InputDefinition, InputDefinitionError, InputDefinitionInfo,
    InputFrame, InputResult, SharedInputDefinition, StoreConfig, TimeQuantum, ValueDestination,
};
