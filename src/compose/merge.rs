//! Deep merge of compose configuration fragments.
//!
//! Service definitions can be split across several documents (a main file
//! plus overrides pulled in through `include`). [`deep_merge`] folds those
//! fragments together key by key:
//!
//! - mapping into mapping → recurse
//! - sequence into existing sequence → union: base entries first, then every
//!   incoming entry not already present, in first-seen order
//! - `!override` sequence → replaces whatever is at the key, no union, no
//!   dedup against the replaced value
//! - `!reset` mapping → replaces the target with an empty mapping
//! - anything else → the incoming value wins
//!
//! The merge is pure: neither input is modified and the result is an owned
//! deep copy.

use serde_yaml::{Mapping, Sequence, Value};

use super::tags::{TagShape, classify};

/// Merge `incoming` into `base`, returning the merged value.
///
/// When both sides are mappings the merge recurses; for any other pairing
/// the incoming value replaces the base wholesale, which mirrors how a later
/// compose fragment overrides an earlier scalar.
pub fn deep_merge(base: &Value, incoming: &Value) -> Value {
    match (base, incoming) {
        (Value::Mapping(base_map), Value::Mapping(incoming_map)) => {
            Value::Mapping(merge_mappings(base_map, incoming_map))
        }
        _ => incoming.clone(),
    }
}

/// Merge two mappings key by key per the rules above.
pub fn merge_mappings(base: &Mapping, incoming: &Mapping) -> Mapping {
    let mut merged = base.clone();

    for (key, value) in incoming {
        let next = match (merged.get(key), classify(value)) {
            (Some(Value::Mapping(existing)), TagShape::Plain(Value::Mapping(update))) => {
                Value::Mapping(merge_mappings(existing, update))
            }
            (Some(Value::Sequence(existing)), TagShape::Plain(Value::Sequence(update))) => {
                Value::Sequence(union_sequences(existing, update))
            }
            // Override always replaces, regardless of what was there before.
            (_, TagShape::Override(update)) => Value::Sequence(update.clone()),
            (_, TagShape::Reset(_)) => Value::Mapping(Mapping::new()),
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    merged
}

/// Extend `base` with the entries of `incoming` that are not already
/// present, preserving first-seen order.
fn union_sequences(base: &Sequence, incoming: &Sequence) -> Sequence {
    let mut merged = base.clone();
    for item in incoming {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tags::{override_array, reset_marker};

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn str_seq(items: &[&str]) -> Sequence {
        items.iter().map(|s| Value::String((*s).to_string())).collect()
    }

    #[test]
    fn test_sequences_union_in_order() {
        let base = mapping("ports:\n- '80:80'\n- '443:443'\n");
        let incoming = mapping("ports:\n- '443:443'\n- '8080:8080'\n");

        let merged = merge_mappings(&base, &incoming);
        assert_eq!(
            merged.get("ports").unwrap(),
            &Value::Sequence(str_seq(&["80:80", "443:443", "8080:8080"]))
        );
    }

    #[test]
    fn test_union_merge_is_idempotent() {
        let fragment = mapping("networks:\n- net1\n- net2\n");
        let merged = merge_mappings(&fragment, &fragment);
        assert_eq!(Value::Mapping(merged), Value::Mapping(fragment));
    }

    #[test]
    fn test_union_merge_is_associative_in_encounter_order() {
        let a = mapping("volumes:\n- one\n- two\n");
        let b = mapping("volumes:\n- two\n- three\n");
        let c = mapping("volumes:\n- one\n- four\n");

        let pairwise = merge_mappings(&merge_mappings(&a, &b), &c);

        let mut folded = Mapping::new();
        for fragment in [&a, &b, &c] {
            folded = merge_mappings(&folded, fragment);
        }

        assert_eq!(pairwise, folded);
        assert_eq!(
            pairwise.get("volumes").unwrap(),
            &Value::Sequence(str_seq(&["one", "two", "three", "four"]))
        );
    }

    #[test]
    fn test_override_replaces_without_union() {
        let mut base = Mapping::new();
        base.insert("ports".into(), Value::Sequence(str_seq(&["A:B"])));

        let mut incoming = Mapping::new();
        incoming.insert("ports".into(), override_array(str_seq(&["C:D"])));

        let merged = merge_mappings(&base, &incoming);
        assert_eq!(
            merged.get("ports").unwrap(),
            &Value::Sequence(str_seq(&["C:D"]))
        );
    }

    #[test]
    fn test_override_on_missing_key() {
        let base = Mapping::new();
        let mut incoming = Mapping::new();
        incoming.insert("ports".into(), override_array(str_seq(&["C:D"])));

        let merged = merge_mappings(&base, &incoming);
        assert_eq!(
            merged.get("ports").unwrap(),
            &Value::Sequence(str_seq(&["C:D"]))
        );
    }

    #[test]
    fn test_reset_clears_target() {
        let base = mapping("environment:\n  FOO: bar\n");
        let mut incoming = Mapping::new();
        incoming.insert("environment".into(), reset_marker(Mapping::new()));

        let merged = merge_mappings(&base, &incoming);
        assert_eq!(
            merged.get("environment").unwrap(),
            &Value::Mapping(Mapping::new())
        );
    }

    #[test]
    fn test_scalar_later_fragment_wins() {
        let base = mapping("restart: 'no'\nimage: app:1\n");
        let incoming = mapping("restart: always\n");

        let merged = merge_mappings(&base, &incoming);
        assert_eq!(
            merged.get("restart").unwrap(),
            &Value::String("always".into())
        );
        assert_eq!(merged.get("image").unwrap(), &Value::String("app:1".into()));
    }

    #[test]
    fn test_nested_mappings_merge_per_key() {
        // depends_on is a mapping field, so recursive mapping-merge applies:
        // both keys survive, neither replaces the other.
        let base = mapping("depends_on:\n  db:\n    condition: service_healthy\n");
        let incoming = mapping("depends_on:\n  cache:\n    condition: service_started\n");

        let merged = merge_mappings(&base, &incoming);
        let depends_on = merged.get("depends_on").unwrap().as_mapping().unwrap();
        assert_eq!(depends_on.len(), 2);
        assert_eq!(
            depends_on.get("db").unwrap().as_mapping().unwrap().get("condition"),
            Some(&Value::String("service_healthy".into()))
        );
        assert_eq!(
            depends_on.get("cache").unwrap().as_mapping().unwrap().get("condition"),
            Some(&Value::String("service_started".into()))
        );
    }

    #[test]
    fn test_web_service_scenario() {
        let fragment1 = mapping("ports:\n- '80:80'\nnetworks:\n- net1\n");
        let fragment2 = mapping("ports:\n- '443:443'\nrestart: always\n");

        let merged = merge_mappings(&fragment1, &fragment2);
        assert_eq!(
            merged.get("ports").unwrap(),
            &Value::Sequence(str_seq(&["80:80", "443:443"]))
        );
        assert_eq!(
            merged.get("networks").unwrap(),
            &Value::Sequence(str_seq(&["net1"]))
        );
        assert_eq!(
            merged.get("restart").unwrap(),
            &Value::String("always".into())
        );
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let base = mapping("ports:\n- '80:80'\n");
        let incoming = mapping("ports:\n- '443:443'\n");
        let base_before = base.clone();
        let incoming_before = incoming.clone();

        let _ = merge_mappings(&base, &incoming);
        assert_eq!(base, base_before);
        assert_eq!(incoming, incoming_before);
    }

    #[test]
    fn test_deep_merge_non_mapping_inputs() {
        let base = Value::String("old".into());
        let incoming = Value::String("new".into());
        assert_eq!(deep_merge(&base, &incoming), incoming);
    }
}
