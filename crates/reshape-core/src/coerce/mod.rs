//! Coercion/copy engine
//!
//! Writes a produced value into a destination whose static shape may differ
//! from the value's dynamic shape. Differences in reference depth are
//! reconciled one level at a time (wrap a plain value for a reference slot,
//! dereference a reference for a plain slot), sequences are rebuilt element
//! by element, and mappings are accepted as they are or re-tagged when their
//! values are absent or already of the target value shape.
//!
//! The homogenization helpers used by container-producing stages live in
//! [`narrow`] and are re-exported here.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

mod narrow;

pub use narrow::{
    map_keys_homogeneous, map_values_homogeneous, narrow_map, narrow_seq, seq_is_homogeneous,
};

use crate::error::{Error, Result, UsageError};
use crate::resolve::is_absent;
use crate::value::{FromValue, MapKey, Seq, Shape, Value};
use std::collections::BTreeMap;

/// A writable destination with a static shape.
///
/// Implemented for every [`FromValue`] type, so `&mut String`,
/// `&mut Option<Vec<String>>` or `&mut Value` can all be written to, and for
/// [`Slot`] when the shape is only known at runtime.
pub trait Destination {
    /// Shape values must be coerced to before assignment
    fn shape(&self) -> Shape;

    /// Store a value that already conforms to [`Destination::shape`]
    fn assign(&mut self, value: Value) -> Result<()>;
}

impl<T: FromValue> Destination for T {
    fn shape(&self) -> Shape {
        T::shape()
    }

    fn assign(&mut self, value: Value) -> Result<()> {
        *self = T::from_value(value)?;
        Ok(())
    }
}

/// Destination whose shape is only known at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    shape: Shape,
    value: Value,
}

impl Slot {
    /// Create a slot holding the zero value of `shape`
    pub fn new(shape: Shape) -> Self {
        let value = shape.zero_value();
        Self { shape, value }
    }

    /// Create a slot with a prior value
    pub fn with_value(shape: Shape, value: Value) -> Self {
        Self { shape, value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Destination for Slot {
    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn assign(&mut self, value: Value) -> Result<()> {
        self.value = value;
        Ok(())
    }
}

/// Copy `value` into `dest`, coercing it to the destination's shape.
///
/// An absent value is a no-op: the destination keeps its prior value.
pub fn copy_into(value: Value, dest: &mut dyn Destination) -> Result<()> {
    if is_absent(&value) {
        return Ok(());
    }
    let target = dest.shape();
    let coerced = coerce(value, &target)?;
    dest.assign(coerced)
}

/// Produce a value conforming to `target` from `value`.
///
/// At most one reference level is added or stripped at this level; nested
/// elements get their own adjustment.
pub fn coerce(value: Value, target: &Shape) -> Result<Value> {
    match (value, target) {
        (Value::Ref(inner), Shape::Any) => Ok(*inner),
        (Value::Ref(inner), Shape::Ref(pointee)) => {
            Ok(Value::reference(coerce_exact(*inner, pointee)?))
        }
        (value @ Value::Nil(_), target) => coerce_exact(value, target),
        (Value::Ref(inner), target) => {
            log::debug!("dereferencing {} for {} destination", inner.shape(), target);
            coerce_exact(*inner, target)
        }
        (value, Shape::Ref(pointee)) => {
            log::debug!("wrapping {} for {} destination", value.shape(), target);
            Ok(Value::reference(coerce_exact(value, pointee)?))
        }
        (value, target) => coerce_exact(value, target),
    }
}

// No depth adjustment: the value must already match the target's reference depth.
fn coerce_exact(value: Value, target: &Shape) -> Result<Value> {
    match (value, target) {
        (value @ Value::Nil(_), Shape::Any) => Ok(value),
        (Value::Nil(_), target) => Ok(target.zero_value()),
        (value, Shape::Any) => Ok(value),
        (Value::Ref(inner), Shape::Ref(pointee)) => {
            Ok(Value::reference(coerce_exact(*inner, pointee)?))
        }
        (Value::Seq(seq), Shape::Seq(elem)) => coerce_seq(seq, elem),
        (Value::Map(map), Shape::Map(key, value)) => {
            if map.key == **key && map.value == **value {
                Ok(Value::Map(map))
            } else if map.entries.is_empty() {
                Ok(Value::map((**key).clone(), (**value).clone(), map.entries))
            } else if map.key == **key && loose_values_fit(&map.entries, value) {
                let entries = map
                    .entries
                    .into_iter()
                    .map(|(k, v)| -> Result<(MapKey, Value)> {
                        Ok((k, coerce_exact(v, value)?))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()?;
                Ok(Value::map((**key).clone(), (**value).clone(), entries))
            } else {
                let found = Shape::map(map.key, map.value);
                Err(UsageError::UnsupportedCoercion {
                    expected: target.clone(),
                    found,
                }
                .into())
            }
        }
        (Value::Int(n), Shape::UInt) => u64::try_from(n)
            .map(Value::UInt)
            .map_err(|_| Error::conversion(target.to_string(), n.to_string())),
        (Value::UInt(n), Shape::Int) => i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| Error::conversion(target.to_string(), n.to_string())),
        (value, target) => {
            let found = value.shape();
            if found == *target {
                Ok(value)
            } else {
                Err(shape_mismatch(target, found))
            }
        }
    }
}

// A loosely typed mapping is re-tagged when every value is absent or already
// has the target value shape; absent values become zero values.
fn loose_values_fit(entries: &BTreeMap<MapKey, Value>, value: &Shape) -> bool {
    entries
        .values()
        .all(|v| v.is_nil() || v.shape() == *value)
}

fn coerce_seq(seq: Seq, elem: &Shape) -> Result<Value> {
    let items = seq
        .items
        .into_iter()
        .map(|item| coerce(item, elem))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::seq(elem.clone(), items))
}

fn shape_mismatch(expected: &Shape, found: Shape) -> Error {
    UsageError::ShapeMismatch {
        expected: expected.clone(),
        found,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[test]
    fn test_wrap_for_reference_destination() {
        let mut to: Option<String> = None;
        copy_into(s("test"), &mut to).unwrap();
        assert_eq!(to.as_deref(), Some("test"));
    }

    #[test]
    fn test_deref_for_plain_destination() {
        let mut to = String::new();
        copy_into(Value::reference(s("test")), &mut to).unwrap();
        assert_eq!(to, "test");
    }

    #[test]
    fn test_scalar_into_scalar() {
        let mut to = 2i64;
        copy_into(Value::Int(1), &mut to).unwrap();
        assert_eq!(to, 1);
    }

    #[test]
    fn test_only_one_depth_adjustment() {
        let mut slot = Slot::new(Shape::reference(Shape::reference(Shape::Str)));
        let err = copy_into(s("x"), &mut slot).unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_seq_elements_wrapped() {
        let from = vec!["1 ".to_string(), "2".to_string(), "3".to_string()];
        let mut to: Vec<Option<String>> = Vec::new();
        copy_into(crate::IntoValue::into_value(from.clone()), &mut to).unwrap();
        assert_eq!(to.len(), from.len());
        for (i, v) in to.iter().enumerate() {
            assert_eq!(v.as_deref(), Some(from[i].as_str()));
        }
    }

    #[test]
    fn test_seq_elements_dereferenced() {
        let t1 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let from = Value::reference(crate::IntoValue::into_value(vec![Some(t1), Some(t2)]));

        let mut to: Vec<chrono::DateTime<Utc>> = Vec::new();
        copy_into(from.clone(), &mut to).unwrap();
        assert_eq!(to, vec![t1, t2]);

        let mut to_ref: Option<Vec<chrono::DateTime<Utc>>> = None;
        copy_into(from, &mut to_ref).unwrap();
        assert_eq!(to_ref.map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_seq_wrapped_at_sequence_level() {
        let from = Value::seq(Shape::Str, vec![s("1"), s("2")]);
        let mut to: Option<Vec<String>> = None;
        copy_into(from, &mut to).unwrap();
        assert_eq!(to, Some(vec!["1".to_string(), "2".to_string()]));
    }

    #[test]
    fn test_nil_elements_become_zero_or_nil() {
        let from = Value::seq(
            Shape::reference(Shape::Str),
            vec![Value::Nil(Shape::reference(Shape::Str)), Value::reference(s("a"))],
        );
        let plain = coerce(from.clone(), &Shape::seq(Shape::Str)).unwrap();
        assert_eq!(plain, Value::seq(Shape::Str, vec![s(""), s("a")]));

        let refs = coerce(from, &Shape::seq(Shape::reference(Shape::Str))).unwrap();
        assert_eq!(
            refs,
            Value::seq(
                Shape::reference(Shape::Str),
                vec![Value::Nil(Shape::reference(Shape::Str)), Value::reference(s("a"))]
            )
        );
    }

    #[test]
    fn test_absent_is_noop() {
        let mut to = Some("prior".to_string());
        copy_into(Value::Nil(Shape::reference(Shape::Int)), &mut to).unwrap();
        assert_eq!(to.as_deref(), Some("prior"));

        let mut empty: Vec<String> = vec!["keep".to_string()];
        copy_into(Value::Nil(Shape::seq(Shape::Str)), &mut empty).unwrap();
        assert_eq!(empty, vec!["keep"]);
    }

    #[test]
    fn test_any_destination_strips_one_reference() {
        let mut to = Value::nil();
        copy_into(Value::reference(s("x")), &mut to).unwrap();
        assert_eq!(to, s("x"));
    }

    #[test]
    fn test_map_reshaping_unsupported() {
        let map = Value::from(serde_json::json!({"a": 1}));
        let err = coerce(map.clone(), &Shape::map(Shape::Str, Shape::Str)).unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::UnsupportedCoercion { .. })
        ));

        let same = coerce(map.clone(), &Shape::map(Shape::Str, Shape::Int)).unwrap();
        assert_eq!(same, map);

        let loose = Value::from(serde_json::json!({"a": 1, "b": "x"}));
        assert!(coerce(loose, &Shape::map(Shape::Str, Shape::Str)).is_err());

        let empty = Value::map(Shape::Any, Shape::Any, Default::default());
        let typed = coerce(empty, &Shape::map(Shape::Str, Shape::Str)).unwrap();
        assert_eq!(typed.shape(), Shape::map(Shape::Str, Shape::Str));
    }

    #[test]
    fn test_loose_map_values_absent_become_zero() {
        let mut entries = BTreeMap::new();
        entries.insert(MapKey::Str("a".to_string()), Value::nil());
        entries.insert(MapKey::Str("b".to_string()), s("yx"));
        let loose = Value::map(Shape::Str, Shape::Any, entries);

        let mut to: std::collections::HashMap<String, String> = Default::default();
        copy_into(loose.clone(), &mut to).unwrap();
        assert_eq!(to.get("a").map(String::as_str), Some(""));
        assert_eq!(to.get("b").map(String::as_str), Some("yx"));

        let err = coerce(loose, &Shape::map(Shape::Str, Shape::Int)).unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::UnsupportedCoercion { .. })
        ));
    }

    #[test]
    fn test_integer_sign_leniency() {
        assert_eq!(coerce(Value::Int(5), &Shape::UInt).unwrap(), Value::UInt(5));
        assert_eq!(coerce(Value::UInt(7), &Shape::Int).unwrap(), Value::Int(7));

        // Out-of-range magnitudes are bad data, not a wiring mistake
        let err = coerce(Value::Int(-5), &Shape::UInt).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert!(!err.is_usage());
        assert_eq!(err.to_string(), "cannot convert -5 into uint");

        let err = coerce(Value::UInt(u64::MAX), &Shape::Int).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));

        assert!(coerce(Value::Float(1.0), &Shape::Int).unwrap_err().is_usage());
    }

    #[test]
    fn test_dynamic_slot() {
        let mut slot = Slot::with_value(Shape::reference(Shape::Int), Value::nil());
        copy_into(Value::Int(3), &mut slot).unwrap();
        assert_eq!(slot.value(), &Value::reference(Value::Int(3)));
    }
}
