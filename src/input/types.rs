//! Public input definition types
//!
//! These are the JSON-shaped types accepted by the request layer. Every
//! member is omitted from JSON output when empty or default.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::codec::{WireAction, WireField, WireFrame, WireSchema};
use super::errors::InputResult;
use super::validator::validate_action;

/// How a raw field value becomes a row id.
///
/// The string literals are part of the wire and API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueDestination {
    /// Look the raw value up in the action's value map
    #[serde(rename = "mapping")]
    Mapping,
    /// Use the numeric raw value directly as the row id
    #[serde(rename = "value-to-row")]
    ValueToRow,
    /// Set a fixed row when the raw value is truthy
    #[serde(rename = "single-row-boolean")]
    SingleRowBool,
}

impl ValueDestination {
    /// Every destination, in declaration order.
    pub const ALL: [ValueDestination; 3] = [
        ValueDestination::Mapping,
        ValueDestination::ValueToRow,
        ValueDestination::SingleRowBool,
    ];

    /// Returns the contract string literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueDestination::Mapping => "mapping",
            ValueDestination::ValueToRow => "value-to-row",
            ValueDestination::SingleRowBool => "single-row-boolean",
        }
    }

    /// Parses a contract string literal. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dest| dest.as_str() == value)
    }
}

impl fmt::Display for ValueDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time granularity for time-based frames. Opaque here; the storage engine
/// interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeQuantum(String);

impl TimeQuantum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TimeQuantum {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TimeQuantum {
    fn from(value: String) -> Self {
        Self(value)
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Storage options for a destination frame, passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameOptions {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub row_label: String,
    #[serde(skip_serializing_if = "is_false")]
    pub inverse_enabled: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub cache_size: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cache_type: String,
    #[serde(skip_serializing_if = "TimeQuantum::is_empty")]
    pub time_quantum: TimeQuantum,
}

/// A destination frame declared by an input definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub options: FrameOptions,
}

impl InputFrame {
    pub fn new(name: impl Into<String>, options: FrameOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Converts the frame into its wire representation.
    pub fn encode(&self) -> WireFrame {
        WireFrame {
            name: self.name.clone(),
            row_label: self.options.row_label.clone(),
            inverse_enabled: self.options.inverse_enabled,
            cache_size: self.options.cache_size,
            cache_type: self.options.cache_type.clone(),
            time_quantum: self.options.time_quantum.as_str().to_string(),
        }
    }
}

impl From<&WireFrame> for InputFrame {
    fn from(frame: &WireFrame) -> Self {
        Self {
            name: frame.name.clone(),
            options: FrameOptions {
                row_label: frame.row_label.clone(),
                inverse_enabled: frame.inverse_enabled,
                cache_size: frame.cache_size,
                cache_type: frame.cache_type.clone(),
                time_quantum: TimeQuantum::new(frame.time_quantum.clone()),
            },
        }
    }
}

/// One value-mapping rule within a field.
///
/// The destination is the raw literal. A missing or unknown literal is
/// rejected by validation, not by JSON parsing. Actions held by a loaded
/// definition always carry a known literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub frame: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_destination: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub value_map: HashMap<String, u64>,
    #[serde(default, rename = "rowID", skip_serializing_if = "Option::is_none")]
    pub row_id: Option<u64>,
}

impl Action {
    /// Action mapping raw values through `value_map`.
    pub fn mapping(frame: impl Into<String>, value_map: HashMap<String, u64>) -> Self {
        Self {
            frame: frame.into(),
            value_destination: ValueDestination::Mapping.as_str().to_string(),
            value_map,
            row_id: None,
        }
    }

    /// Action using the raw value as the row id.
    pub fn value_to_row(frame: impl Into<String>) -> Self {
        Self {
            frame: frame.into(),
            value_destination: ValueDestination::ValueToRow.as_str().to_string(),
            value_map: HashMap::new(),
            row_id: None,
        }
    }

    /// Action setting `row_id` when the raw value is truthy.
    pub fn single_row_bool(frame: impl Into<String>, row_id: u64) -> Self {
        Self {
            frame: frame.into(),
            value_destination: ValueDestination::SingleRowBool.as_str().to_string(),
            value_map: HashMap::new(),
            row_id: Some(row_id),
        }
    }

    /// Returns the parsed destination, or `None` for a missing or unknown literal.
    pub fn destination(&self) -> Option<ValueDestination> {
        ValueDestination::parse(&self.value_destination)
    }

    /// Converts the action into its wire representation, rejecting it if it
    /// violates an action rule. `field` names the owning field in errors.
    pub fn encode(&self, field: &str) -> InputResult<WireAction> {
        let wire = WireAction {
            frame: self.frame.clone(),
            value_destination: self.value_destination.clone(),
            value_map: self
                .value_map
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect::<BTreeMap<_, _>>(),
            row_id: self.row_id,
        };
        validate_action(field, &wire)?;
        Ok(wire)
    }
}

/// One input column definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Field {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Marks this field as the record's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Converts the field and all its actions into wire form.
    pub fn encode(&self) -> InputResult<WireField> {
        let actions = self
            .actions
            .iter()
            .map(|action| action.encode(&self.name))
            .collect::<InputResult<Vec<_>>>()?;

        Ok(WireField {
            name: self.name.clone(),
            primary_key: self.primary_key,
            actions,
        })
    }
}

/// JSON body of an input definition creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefinitionInfo {
    pub frames: Vec<InputFrame>,
    pub fields: Vec<Field>,
}

impl InputDefinitionInfo {
    /// Parses a creation request body.
    pub fn from_json(json: &str) -> InputResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts the request into wire form. The resulting schema carries no
    /// name; the definition it is loaded into keeps its own.
    pub fn encode(&self) -> InputResult<WireSchema> {
        let fields = self
            .fields
            .iter()
            .map(Field::encode)
            .collect::<InputResult<Vec<_>>>()?;

        Ok(WireSchema {
            name: String::new(),
            frames: self.frames.iter().map(InputFrame::encode).collect(),
            fields,
        })
    }
}
