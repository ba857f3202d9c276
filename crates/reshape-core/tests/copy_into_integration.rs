//! Integration tests for the standalone coercion entry point
//!
//! These tests copy values between Rust types whose reference depth differs
//! and check the homogeneity rules on loosely typed inputs.


use chrono::{DateTime, Utc};
use reshape_core::{copy_into, IntoValue, Shape, Slot, Value};
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_wrap_and_deref_scalars() {
    let mut wrapped: Option<String> = None;
    copy_into("test".into_value(), &mut wrapped).unwrap();
    assert_eq!(wrapped.as_deref(), Some("test"));

    let mut plain = String::new();
    copy_into(Some("test".to_string()).into_value(), &mut plain).unwrap();
    assert_eq!(plain, "test");

    let mut n: Option<i64> = Some(2);
    copy_into(1i64.into_value(), &mut n).unwrap();
    assert_eq!(n, Some(1));
}

#[test]
fn test_sequences_between_reference_depths() {
    let from = vec!["1 ".to_string(), "2".to_string(), "3".to_string()];

    let mut refs: Vec<Option<String>> = Vec::new();
    copy_into(from.clone().into_value(), &mut refs).unwrap();
    assert_eq!(
        refs,
        from.iter().cloned().map(Some).collect::<Vec<_>>()
    );

    let mut back: Vec<String> = Vec::new();
    copy_into(refs.into_value(), &mut back).unwrap();
    assert_eq!(back, from);
}

#[test]
fn test_referenced_sequence_of_referenced_times() {
    let t1 = test_support::birthdate();
    let t2 = Utc::now();
    let from = Some(vec![Some(t1), Some(t2)]).into_value();

    let mut plain: Vec<DateTime<Utc>> = Vec::new();
    copy_into(from.clone(), &mut plain).unwrap();
    assert_eq!(plain, vec![t1, t2]);

    let mut behind_ref: Option<Vec<DateTime<Utc>>> = None;
    copy_into(from, &mut behind_ref).unwrap();
    assert_eq!(behind_ref, Some(vec![t1, t2]));
}

#[test]
fn test_loose_json_arrays() {
    let mut strings: Vec<String> = Vec::new();
    copy_into(Value::from(json!(["a", "b", "c"])), &mut strings).unwrap();
    assert_eq!(strings, vec!["a", "b", "c"]);

    let mixed = Value::from(json!(["a", 1]));
    assert_eq!(mixed.shape(), Shape::seq(Shape::Any));
    let mut loose: Vec<Value> = Vec::new();
    copy_into(mixed, &mut loose).unwrap();
    assert_eq!(loose, vec![Value::Str("a".to_string()), Value::Int(1)]);

    let mut strict: Vec<String> = Vec::new();
    assert!(copy_into(Value::from(json!(["a", 1])), &mut strict).is_err());
}

#[test]
fn test_mapping_copied_as_is() {
    let mut to: BTreeMap<String, i64> = BTreeMap::new();
    copy_into(Value::from(json!({"a": 1, "b": 2})), &mut to).unwrap();
    assert_eq!(to.get("a"), Some(&1));
    assert_eq!(to.get("b"), Some(&2));

    let mut wrong: BTreeMap<String, String> = BTreeMap::new();
    let err = copy_into(Value::from(json!({"a": 1})), &mut wrong).unwrap_err();
    assert!(err.is_usage());
}

#[test]
fn test_runtime_shaped_slot() {
    let mut slot = Slot::new(Shape::seq(Shape::reference(Shape::Str)));
    assert!(slot.value().is_nil());

    copy_into(vec!["x".to_string()].into_value(), &mut slot).unwrap();
    assert_eq!(
        slot.into_value().to_json(),
        json!(["x"]),
    );
}

#[test]
fn test_absent_values_are_noops() {
    let mut s = "prior".to_string();
    copy_into(Value::nil(), &mut s).unwrap();
    copy_into(None::<String>.into_value(), &mut s).unwrap();
    copy_into(Value::reference(Value::Nil(Shape::Str)), &mut s).unwrap();
    assert_eq!(s, "prior");
}
