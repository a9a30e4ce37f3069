//! Mapping specs: how records transform between two adjacent versions.
//!
//! A [`MappingSpec`] is declarative data, not code. It is looked up by the
//! ordered pair of adjacent version names and applied to every record of the
//! source store when its hop executes. Transforms run in declaration order,
//! so a rename may feed a later retype of the new field name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

use crate::errors::TransformError;
use crate::store::Record;

/// Primitive shape a [`FieldTransform::Retype`] coerces a field into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
}

/// One field-level change between adjacent schema versions.
///
/// Serialized with an `op` tag so mapping data can live in a schema bundle
/// file:
///
/// ```json
/// { "op": "rename", "from": "name", "to": "fullName" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldTransform {
    /// Move a value to a new field name. The source field must be present;
    /// a record without it is unmappable and fails the hop.
    Rename { from: String, to: String },

    /// Introduce a field with a default value. Records that already carry
    /// the field keep their value.
    Add {
        field: String,
        #[serde(default)]
        default: Value,
    },

    /// Remove a field. Records without it pass through unchanged.
    Drop { field: String },

    /// Coerce a field's value to another primitive kind. The field must be
    /// present; `null` passes through untouched.
    Retype { field: String, into: FieldKind },
}

/// Declarative description of the record transform between two adjacent
/// schema versions, looked up by the ordered pair `(from, to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub transforms: Vec<FieldTransform>,
}

impl MappingSpec {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transforms: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: FieldTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Apply every transform to one record, producing the destination-shape
    /// record. The source record is untouched; the first failing transform
    /// aborts with the offending field.
    pub fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let mut out = record.clone();
        for transform in &self.transforms {
            apply_one(transform, &mut out)?;
        }
        Ok(out)
    }
}

fn apply_one(transform: &FieldTransform, record: &mut Record) -> Result<(), TransformError> {
    match transform {
        FieldTransform::Rename { from, to } => {
            let value = record
                .shift_remove(from)
                .ok_or_else(|| TransformError::MissingField {
                    field: from.clone(),
                })?;
            record.insert(to.clone(), value);
            Ok(())
        }
        FieldTransform::Add { field, default } => {
            if !record.contains_key(field) {
                record.insert(field.clone(), default.clone());
            }
            Ok(())
        }
        FieldTransform::Drop { field } => {
            record.shift_remove(field);
            Ok(())
        }
        FieldTransform::Retype { field, into } => {
            let value = record
                .get_mut(field)
                .ok_or_else(|| TransformError::MissingField {
                    field: field.clone(),
                })?;
            if value.is_null() {
                return Ok(());
            }
            *value = coerce(value, *into).ok_or_else(|| TransformError::Uncoercible {
                field: field.clone(),
                kind: *into,
            })?;
            Ok(())
        }
    }
}

fn coerce(value: &Value, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => {
                let f = n.as_f64()?;
                (f.fract() == 0.0).then(|| Value::from(f as i64))
            }
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        FieldKind::Float => match value {
            Value::Number(n) => n.as_f64().map(Value::from),
            Value::String(s) => s.trim().parse::<f64>().ok().map(Value::from),
            _ => None,
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().expect("test record").clone()
    }

    #[test]
    fn rename_moves_the_value() {
        let spec = MappingSpec::new("V2", "V3").with_transform(FieldTransform::Rename {
            from: "name".into(),
            to: "fullName".into(),
        });
        let out = spec.apply(&record(json!({"name": "A"}))).unwrap();
        assert_eq!(out, record(json!({"fullName": "A"})));
    }

    #[test]
    fn rename_of_missing_field_is_unmappable() {
        let spec = MappingSpec::new("V2", "V3").with_transform(FieldTransform::Rename {
            from: "name".into(),
            to: "fullName".into(),
        });
        let err = spec.apply(&record(json!({"other": 1}))).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingField {
                field: "name".into()
            }
        );
    }

    #[test]
    fn add_fills_only_absent_fields() {
        let spec = MappingSpec::new("V1", "V2").with_transform(FieldTransform::Add {
            field: "age".into(),
            default: json!(0),
        });
        assert_eq!(
            spec.apply(&record(json!({"name": "A"}))).unwrap(),
            record(json!({"name": "A", "age": 0}))
        );
        assert_eq!(
            spec.apply(&record(json!({"age": 44}))).unwrap(),
            record(json!({"age": 44}))
        );
    }

    #[test]
    fn drop_is_idempotent() {
        let spec = MappingSpec::new("V1", "V2").with_transform(FieldTransform::Drop {
            field: "legacy".into(),
        });
        assert_eq!(
            spec.apply(&record(json!({"legacy": 1, "kept": 2}))).unwrap(),
            record(json!({"kept": 2}))
        );
        assert_eq!(
            spec.apply(&record(json!({"kept": 2}))).unwrap(),
            record(json!({"kept": 2}))
        );
    }

    #[test]
    fn retype_coercions() {
        let spec = MappingSpec::new("V1", "V2").with_transform(FieldTransform::Retype {
            field: "age".into(),
            into: FieldKind::Integer,
        });
        assert_eq!(
            spec.apply(&record(json!({"age": "41"}))).unwrap(),
            record(json!({"age": 41}))
        );
        assert_eq!(
            spec.apply(&record(json!({"age": null}))).unwrap(),
            record(json!({"age": null}))
        );
        let err = spec.apply(&record(json!({"age": "old"}))).unwrap_err();
        assert_eq!(
            err,
            TransformError::Uncoercible {
                field: "age".into(),
                kind: FieldKind::Integer
            }
        );
    }

    #[test]
    fn transforms_run_in_declaration_order() {
        let spec = MappingSpec::new("V1", "V2")
            .with_transform(FieldTransform::Rename {
                from: "count".into(),
                to: "total".into(),
            })
            .with_transform(FieldTransform::Retype {
                field: "total".into(),
                into: FieldKind::Integer,
            });
        assert_eq!(
            spec.apply(&record(json!({"count": "7"}))).unwrap(),
            record(json!({"total": 7}))
        );
    }

    #[test]
    fn transform_round_trips_through_its_tagged_form() {
        let json = r#"{ "op": "rename", "from": "name", "to": "fullName" }"#;
        let parsed: FieldTransform = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            FieldTransform::Rename {
                from: "name".into(),
                to: "fullName".into()
            }
        );
    }
}
