//! Query-parameter filters: each recognised key becomes one column predicate.
//!
//! Integer columns match by equality after stripping every non-digit character; a value
//! left without digits is skipped. Boolean columns match `true`/`false`/`1`/`0`. Every
//! other column is a LIKE match where `*` in the value stands for `%`.
//!
//! Known limitation: the value is not escaped, so a literal `%` or `_` typed by the caller
//! passes through and acts as a LIKE wildcard.

use crate::schema::{ColumnType, ResolvedEntity};
use crate::store::Predicate;
use serde_json::Value;
use std::collections::HashMap;

pub fn build_filters(entity: &ResolvedEntity, params: &HashMap<String, String>) -> Vec<Predicate> {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    let mut predicates = Vec::new();
    for key in keys {
        let raw = &params[key];
        let column_name = key.to_lowercase();
        let Some(column) = entity.column(&column_name) else { continue };
        let predicate = match column.ty {
            ColumnType::Integer => integer_value(raw).map(|n| Predicate::Eq {
                column: column_name,
                value: Value::from(n),
            }),
            ColumnType::Boolean => boolean_value(raw).map(|b| Predicate::Eq {
                column: column_name,
                value: Value::Bool(b),
            }),
            ColumnType::String(_) | ColumnType::Text | ColumnType::Timestamp => Some(Predicate::Like {
                column: column_name,
                pattern: raw.replace('*', "%"),
            }),
        };
        match predicate {
            Some(p) => predicates.push(p),
            None => tracing::warn!(
                entity = %entity.path_segment,
                key = %key,
                value = %raw,
                "filter value not usable for column type, skipping"
            ),
        }
    }
    predicates
}

fn integer_value(raw: &str) -> Option<i32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn boolean_value(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{resolve, Registry, CATALOGUE};
    use serde_json::json;

    fn registry() -> Registry {
        resolve(CATALOGUE).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn wildcard_becomes_like_pattern() {
        let reg = registry();
        let thing = reg.entity_by_path("thing").unwrap();
        let preds = build_filters(thing, &params(&[("name", "Wid*")]));
        assert_eq!(
            preds,
            vec![Predicate::Like {
                column: "name".into(),
                pattern: "Wid%".into()
            }]
        );
    }

    #[test]
    fn integer_value_is_stripped_to_digits() {
        let reg = registry();
        let food = reg.entity_by_path("food").unwrap();
        let preds = build_filters(food, &params(&[("pet_xid", "#4a2")]));
        assert_eq!(
            preds,
            vec![Predicate::Eq {
                column: "pet_xid".into(),
                value: json!(42)
            }]
        );
    }

    #[test]
    fn integer_without_digits_is_skipped() {
        let reg = registry();
        let food = reg.entity_by_path("food").unwrap();
        assert!(build_filters(food, &params(&[("xid", "abc")])).is_empty());
        assert!(build_filters(food, &params(&[("xid", "")])).is_empty());
        assert!(build_filters(food, &params(&[("xid", "99999999999")])).is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored_and_keys_are_case_insensitive() {
        let reg = registry();
        let pet = reg.entity_by_path("pet").unwrap();
        let preds = build_filters(pet, &params(&[("NAME", "Rex"), ("colour", "brown"), ("limit", "5")]));
        assert_eq!(
            preds,
            vec![Predicate::Like {
                column: "name".into(),
                pattern: "Rex".into()
            }]
        );
    }

    #[test]
    fn percent_and_underscore_pass_through() {
        let reg = registry();
        let pet = reg.entity_by_path("pet").unwrap();
        let preds = build_filters(pet, &params(&[("animal", "d_g%*")]));
        assert_eq!(
            preds,
            vec![Predicate::Like {
                column: "animal".into(),
                pattern: "d_g%%".into()
            }]
        );
    }

    #[test]
    fn boolean_filters_use_equality() {
        let reg = registry();
        let toilet = reg.entity_by_path("toilet").unwrap();
        let preds = build_filters(toilet, &params(&[("accident", "FALSE"), ("pee", "maybe")]));
        assert_eq!(
            preds,
            vec![Predicate::Eq {
                column: "accident".into(),
                value: json!(false)
            }]
        );
    }

    #[test]
    fn no_params_means_no_predicates() {
        let reg = registry();
        let stuff = reg.entity_by_path("stuff").unwrap();
        assert!(build_filters(stuff, &HashMap::new()).is_empty());
    }
}
