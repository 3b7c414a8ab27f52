//! Input definition validator
//!
//! Action rules, checked in order:
//! 1. frame is non-empty
//! 2. value destination is a known literal
//! 3. `mapping` carries a non-empty value map
//! 4. `single-row-boolean` carries a row id
//!
//! Definition rules, checked while walking fields in order:
//! - at most one field is the primary key
//! - no two `single-row-boolean` actions share a (frame, row id) pair
//!
//! The validator never mutates its input. A definition is accepted only if
//! every rule holds for every field.

use std::collections::HashMap;

use super::codec::{WireAction, WireField, WireSchema};
use super::errors::{InputDefinitionError, InputResult};
use super::types::{Action, Field, InputFrame, ValueDestination};

/// Validates a single action. `field` names the owning field in errors.
///
/// Returns the parsed value destination on success.
pub fn validate_action(field: &str, action: &WireAction) -> InputResult<ValueDestination> {
    if action.frame.is_empty() {
        return Err(InputDefinitionError::FrameRequired {
            field: field.to_string(),
        });
    }

    let destination = ValueDestination::parse(&action.value_destination).ok_or_else(|| {
        InputDefinitionError::UnknownDestination {
            field: field.to_string(),
            value: action.value_destination.clone(),
        }
    })?;

    match destination {
        ValueDestination::Mapping if action.value_map.is_empty() => {
            Err(InputDefinitionError::MissingValueMap {
                field: field.to_string(),
                frame: action.frame.clone(),
            })
        }
        ValueDestination::SingleRowBool if action.row_id.is_none() => {
            Err(InputDefinitionError::MissingRowId {
                field: field.to_string(),
                frame: action.frame.clone(),
            })
        }
        _ => Ok(destination),
    }
}

/// Walks the fields of a wire schema, enforcing cross-field rules.
///
/// State accumulates across [`check_field`](Self::check_field) calls, so one
/// validator covers exactly one definition.
#[derive(Debug, Default)]
pub struct DefinitionValidator {
    /// Field currently holding the primary key
    primary_key: Option<String>,
    /// (frame, row id) -> field that claimed it
    claimed_rows: HashMap<(String, u64), String>,
}

impl DefinitionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates one field against its own actions and every field checked
    /// before it, returning the model form.
    pub fn check_field(&mut self, field: &WireField) -> InputResult<Field> {
        let mut actions = Vec::with_capacity(field.actions.len());

        for action in &field.actions {
            let destination = validate_action(&field.name, action)?;

            if destination == ValueDestination::SingleRowBool {
                if let Some(row_id) = action.row_id {
                    self.claim_row(&field.name, &action.frame, row_id)?;
                }
            }

            actions.push(Action {
                frame: action.frame.clone(),
                value_destination: destination.as_str().to_string(),
                value_map: action
                    .value_map
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
                row_id: action.row_id,
            });
        }

        if field.primary_key {
            if let Some(existing) = &self.primary_key {
                return Err(InputDefinitionError::DuplicatePrimaryKey {
                    field: field.name.clone(),
                    existing: existing.clone(),
                });
            }
            self.primary_key = Some(field.name.clone());
        }

        Ok(Field {
            name: field.name.clone(),
            primary_key: field.primary_key,
            actions,
        })
    }

    fn claim_row(&mut self, field: &str, frame: &str, row_id: u64) -> InputResult<()> {
        let key = (frame.to_string(), row_id);
        if let Some(owner) = self.claimed_rows.get(&key) {
            return Err(InputDefinitionError::DuplicateRowId {
                frame: frame.to_string(),
                row_id,
                field: field.to_string(),
                conflicting_field: owner.clone(),
            });
        }
        self.claimed_rows.insert(key, field.to_string());
        Ok(())
    }

    /// Validates a whole schema, returning its frames and fields in order.
    ///
    /// Nothing is returned unless every field passes.
    pub fn validate(schema: &WireSchema) -> InputResult<(Vec<InputFrame>, Vec<Field>)> {
        let mut validator = Self::new();

        let frames = schema.frames.iter().map(InputFrame::from).collect();
        let fields = schema
            .fields
            .iter()
            .map(|field| validator.check_field(field))
            .collect::<InputResult<Vec<_>>>()?;

        Ok((frames, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn wire_action(frame: &str, dest: &str) -> WireAction {
        WireAction {
            frame: frame.into(),
            value_destination: dest.into(),
            value_map: BTreeMap::new(),
            row_id: None,
        }
    }

    fn bool_field(name: &str, frame: &str, row_id: u64) -> WireField {
        let mut action = wire_action(frame, "single-row-boolean");
        action.row_id = Some(row_id);
        WireField {
            name: name.into(),
            primary_key: false,
            actions: vec![action],
        }
    }

    #[test]
    fn test_frame_required_for_every_destination() {
        for dest in ["mapping", "value-to-row", "single-row-boolean", "bogus"] {
            let err = validate_action("f", &wire_action("", dest)).unwrap_err();
            assert_eq!(err.code(), "INPUT_FRAME_REQUIRED", "destination {dest}");
        }
    }

    #[test]
    fn test_unknown_destination_names_value() {
        let err = validate_action("f", &wire_action("frame", "row-to-value")).unwrap_err();
        match err {
            InputDefinitionError::UnknownDestination { field, value } => {
                assert_eq!(field, "f");
                assert_eq!(value, "row-to-value");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mapping_requires_value_map() {
        let err = validate_action("f", &wire_action("frame", "mapping")).unwrap_err();
        assert_eq!(err.code(), "INPUT_MISSING_VALUE_MAP");

        let mut action = wire_action("frame", "mapping");
        action.value_map.insert("a".into(), 1);
        assert_eq!(
            validate_action("f", &action).unwrap(),
            ValueDestination::Mapping
        );
    }

    #[test]
    fn test_single_row_bool_requires_row_id() {
        let err = validate_action("f", &wire_action("frame", "single-row-boolean")).unwrap_err();
        assert_eq!(err.code(), "INPUT_MISSING_ROW_ID");
    }

    #[test]
    fn test_row_id_zero_is_present() {
        let mut action = wire_action("frame", "single-row-boolean");
        action.row_id = Some(0);
        assert!(validate_action("f", &action).is_ok());
    }

    #[test]
    fn test_value_to_row_needs_only_frame() {
        assert_eq!(
            validate_action("f", &wire_action("frame", "value-to-row")).unwrap(),
            ValueDestination::ValueToRow
        );
    }

    #[test]
    fn test_duplicate_row_id_across_fields() {
        let mut validator = DefinitionValidator::new();
        validator.check_field(&bool_field("active", "flags", 1)).unwrap();

        let err = validator
            .check_field(&bool_field("enabled", "flags", 1))
            .unwrap_err();
        match err {
            InputDefinitionError::DuplicateRowId {
                frame,
                row_id,
                field,
                conflicting_field,
            } => {
                assert_eq!(frame, "flags");
                assert_eq!(row_id, 1);
                assert_eq!(field, "enabled");
                assert_eq!(conflicting_field, "active");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_distinct_row_ids_or_frames_accepted() {
        let mut validator = DefinitionValidator::new();
        validator.check_field(&bool_field("a", "flags", 1)).unwrap();
        validator.check_field(&bool_field("b", "flags", 2)).unwrap();
        validator.check_field(&bool_field("c", "other", 1)).unwrap();
    }

    #[test]
    fn test_duplicate_detected_beyond_last_seen() {
        let mut validator = DefinitionValidator::new();
        validator.check_field(&bool_field("a", "flags", 1)).unwrap();
        validator.check_field(&bool_field("b", "flags", 2)).unwrap();

        let err = validator.check_field(&bool_field("c", "flags", 1)).unwrap_err();
        assert_eq!(err.code(), "INPUT_DUPLICATE_ROW_ID");
    }

    #[test]
    fn test_duplicate_primary_key() {
        let schema = WireSchema {
            name: "d".into(),
            frames: vec![],
            fields: vec![
                WireField {
                    name: "id".into(),
                    primary_key: true,
                    actions: vec![],
                },
                WireField {
                    name: "other_id".into(),
                    primary_key: true,
                    actions: vec![],
                },
            ],
        };

        let err = DefinitionValidator::validate(&schema).unwrap_err();
        match err {
            InputDefinitionError::DuplicatePrimaryKey { field, existing } => {
                assert_eq!(field, "other_id");
                assert_eq!(existing, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
