//! Request body validation against the entity's column descriptors.

use crate::error::{AppError, FieldErrors};
use crate::schema::{ColumnInfo, ColumnType, ResolvedEntity};
use crate::store::Row;
use serde_json::{Map, Value};

pub const MISSING: &str = "Missing data for required field.";

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Required columns must be present and non-null.
    /// Returns the writable values to store; read-only and unknown keys are dropped.
    pub fn validate(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Row, AppError> {
        let mut errors = FieldErrors::new();
        let mut values = Row::new();
        for col in entity.writable_columns() {
            match body.get(&col.name) {
                None | Some(Value::Null) if col.required => errors.add(&col.name, MISSING),
                None => {}
                Some(v) => match coerce(col, v) {
                    Ok(v) => {
                        values.insert(col.name.clone(), v);
                    }
                    Err(msg) => errors.add(&col.name, msg),
                },
            }
        }
        finish(errors, values)
    }

    /// Validate only the fields present in an update body. A required column may be
    /// omitted but not cleared.
    pub fn validate_partial(entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Row, AppError> {
        let mut errors = FieldErrors::new();
        let mut values = Row::new();
        for col in entity.writable_columns() {
            let Some(v) = body.get(&col.name) else { continue };
            if v.is_null() && col.required {
                errors.add(&col.name, MISSING);
                continue;
            }
            match coerce(col, v) {
                Ok(v) => {
                    values.insert(col.name.clone(), v);
                }
                Err(msg) => errors.add(&col.name, msg),
            }
        }
        finish(errors, values)
    }
}

fn finish(errors: FieldErrors, values: Row) -> Result<Row, AppError> {
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Check one value against its column type and normalise it for storage.
fn coerce(col: &ColumnInfo, v: &Value) -> Result<Value, String> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    match col.ty {
        ColumnType::Integer => {
            let n = match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            n.and_then(|n| i32::try_from(n).ok())
                .map(Value::from)
                .ok_or_else(|| "Not a valid integer.".to_string())
        }
        ColumnType::String(max) => {
            let s = v.as_str().ok_or_else(|| "Not a valid string.".to_string())?;
            if s.chars().count() > max as usize {
                return Err(format!("Longer than maximum length {}.", max));
            }
            Ok(v.clone())
        }
        ColumnType::Text => v
            .as_str()
            .map(|_| v.clone())
            .ok_or_else(|| "Not a valid string.".to_string()),
        ColumnType::Boolean => {
            let b = match v {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(true),
                    Some(0) => Some(false),
                    _ => None,
                },
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(true),
                    "false" | "0" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            b.map(Value::Bool).ok_or_else(|| "Not a valid boolean.".to_string())
        }
        ColumnType::Timestamp => chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap_or_default())
            .map(|_| v.clone())
            .map_err(|_| "Not a valid datetime.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{resolve, CATALOGUE};
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(e) => e,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_requires_natural_key() {
        let reg = resolve(CATALOGUE).unwrap();
        let pet = reg.entity_by_path("pet").unwrap();
        let errors = field_errors(RequestValidator::validate(pet, &body(json!({"animal": "dog"}))).unwrap_err());
        assert_eq!(errors.messages("name"), [MISSING]);

        let errors = field_errors(RequestValidator::validate(pet, &body(json!({"name": null}))).unwrap_err());
        assert!(errors.contains("name"));
    }

    #[test]
    fn every_bad_field_is_reported() {
        let reg = resolve(CATALOGUE).unwrap();
        let toilet = reg.entity_by_path("toilet").unwrap();
        let errors = field_errors(
            RequestValidator::validate(toilet, &body(json!({"pee": "sometimes", "pet_xid": "one", "poo": true})))
                .unwrap_err(),
        );
        assert_eq!(errors.messages("pee"), ["Not a valid boolean."]);
        assert_eq!(errors.messages("pet_xid"), ["Not a valid integer."]);
        assert!(!errors.contains("poo"));
    }

    #[test]
    fn read_only_and_unknown_keys_are_dropped() {
        let reg = resolve(CATALOGUE).unwrap();
        let pet = reg.entity_by_path("pet").unwrap();
        let values = RequestValidator::validate(
            pet,
            &body(json!({"name": "Fido", "xid": 12, "date_created": "x", "colour": "brown", "updated_by": "7"})),
        )
        .unwrap();
        assert_eq!(Value::Object(values), json!({"name": "Fido", "updated_by": 7}));
    }

    #[test]
    fn strings_are_length_checked() {
        let reg = resolve(CATALOGUE).unwrap();
        let thing = reg.entity_by_path("thing").unwrap();
        let long = "x".repeat(256);
        let errors = field_errors(RequestValidator::validate(thing, &body(json!({"name": long}))).unwrap_err());
        assert_eq!(errors.messages("name"), ["Longer than maximum length 255."]);

        // Text columns are unbounded.
        let values =
            RequestValidator::validate(thing, &body(json!({"name": "ok", "description": "y".repeat(5000)}))).unwrap();
        assert!(values.contains_key("description"));
    }

    #[test]
    fn partial_allows_missing_required_but_not_null() {
        let reg = resolve(CATALOGUE).unwrap();
        let person = reg.entity_by_path("person").unwrap();
        assert!(RequestValidator::validate_partial(person, &body(json!({"updated_by": 2}))).is_ok());
        let errors =
            field_errors(RequestValidator::validate_partial(person, &body(json!({"name": null}))).unwrap_err());
        assert_eq!(errors.messages("name"), [MISSING]);
    }
}
