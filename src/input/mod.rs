//! Input definition subsystem
//!
//! An input definition tells the bulk loader how raw external records map
//! onto frames of a bitmap index: which frame each input field targets, how a
//! raw value becomes a row id, and which field identifies the record.
//!
//! # Design Principles
//!
//! - Definitions are validated before they are accepted into memory
//! - Loads are all-or-nothing
//! - Every accepted mutation is flushed to disk before returning
//! - One file per definition, `<path>/<name>`, checksummed binary format
//!
//! The model holds no lock. Use [`SharedInputDefinition`] when more than one
//! thread needs to mutate the same definition.

mod codec;
mod config;
mod definition;
mod errors;
mod name;
mod shared;
mod store;
mod types;
mod validator;

pub use codec::{
    decode, encode, WireAction, WireField, WireFrame, WireSchema, FORMAT_VERSION, MAGIC,
};
pub use config::StoreConfig;
pub use definition::InputDefinition;
pub use errors::{DecodeError, ErrorCategory, InputDefinitionError, InputResult};
pub use name::{validate_name, MAX_NAME_LEN};
pub use shared::SharedInputDefinition;
pub use store::SchemaStore;
pub use types::{
    Action, Field, FrameOptions, InputDefinitionInfo, InputFrame, TimeQuantum, ValueDestination,
};
pub use validator::{validate_action, DefinitionValidator};

/// Logging target for every event emitted by this subsystem.
pub(crate) const LOG_TARGET: &str = "inputdef";
