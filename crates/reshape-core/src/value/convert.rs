//! Conversions between Rust types and engine values
//!
//! `Option<T>` plays the role of a reference to `T`, `Vec<T>` of a sequence,
//! `HashMap`/`BTreeMap` of a mapping and [`Value`] of the loosely typed slot.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use super::{MapKey, Record, Shape, Value};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Types with a static shape
pub trait Reflect {
    fn shape() -> Shape;
}

/// Types that can be turned into an engine value
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Types that can be rebuilt from a value already coerced to their shape.
///
/// Scalars accept a nil as their zero value.
pub trait FromValue: Reflect + Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Rust types usable as mapping keys
pub trait KeyType: Sized {
    fn key_shape() -> Shape;
    fn into_key(self) -> MapKey;
    fn from_key(key: MapKey) -> Result<Self>;
}

fn mismatch<T>(expected: &str, found: &Value) -> Result<T> {
    Err(Error::conversion(expected, found.shape().to_string()))
}

impl Reflect for Value {
    fn shape() -> Shape {
        Shape::Any
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

// Records have no static type name, so a bare `Record` slot is loosely typed.
impl Reflect for Record {
    fn shape() -> Shape {
        Shape::Any
    }
}

impl IntoValue for Record {
    fn into_value(self) -> Value {
        Value::Record(self)
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(record) => Ok(record),
            Value::Ref(inner) => Record::from_value(*inner),
            other => mismatch("record", &other),
        }
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl Reflect for $t {
            fn shape() -> Shape {
                Shape::Int
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(n) => <$t>::try_from(n)
                        .map_err(|_| Error::conversion(stringify!($t), n.to_string())),
                    Value::UInt(n) => <$t>::try_from(n)
                        .map_err(|_| Error::conversion(stringify!($t), n.to_string())),
                    Value::Nil(_) => Ok(0),
                    other => mismatch(stringify!($t), &other),
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl Reflect for $t {
            fn shape() -> Shape {
                Shape::UInt
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::UInt(self as u64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::UInt(n) => <$t>::try_from(n)
                        .map_err(|_| Error::conversion(stringify!($t), n.to_string())),
                    Value::Int(n) => <$t>::try_from(n)
                        .map_err(|_| Error::conversion(stringify!($t), n.to_string())),
                    Value::Nil(_) => Ok(0),
                    other => mismatch(stringify!($t), &other),
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl Reflect for $t {
            fn shape() -> Shape {
                Shape::Float
            }
        }

        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::Float(self as f64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float(x) => Ok(x as $t),
                    Value::Nil(_) => Ok(0.0),
                    other => mismatch(stringify!($t), &other),
                }
            }
        }
    )*};
}

impl_float!(f32, f64);

impl Reflect for bool {
    fn shape() -> Shape {
        Shape::Bool
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Nil(_) => Ok(false),
            other => mismatch("bool", &other),
        }
    }
}

impl Reflect for String {
    fn shape() -> Shape {
        Shape::Str
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl Reflect for &str {
    fn shape() -> Shape {
        Shape::Str
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            Value::Nil(_) => Ok(String::new()),
            other => mismatch("string", &other),
        }
    }
}

impl Reflect for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Time
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Time(self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(t) => Ok(t),
            Value::Nil(_) => Ok(DateTime::<Utc>::default()),
            other => mismatch("time", &other),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::reference(T::shape())
    }
}

impl<T: IntoValue + Reflect> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(inner) => Value::reference(inner.into_value()),
            None => Value::Nil(Self::shape()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Nil(_) => Ok(None),
            Value::Ref(inner) => T::from_value(*inner).map(Some),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::seq(T::shape())
    }
}

impl<T: IntoValue + Reflect> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::seq(
            T::shape(),
            self.into_iter().map(IntoValue::into_value).collect(),
        )
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Seq(seq) => seq.items.into_iter().map(T::from_value).collect(),
            Value::Nil(_) => Ok(Vec::new()),
            other => mismatch("sequence", &other),
        }
    }
}

macro_rules! impl_key {
    ($variant:ident, $shape:ident, $($t:ty),*) => {$(
        impl KeyType for $t {
            fn key_shape() -> Shape {
                Shape::$shape
            }

            fn into_key(self) -> MapKey {
                MapKey::$variant(self.into())
            }

            fn from_key(key: MapKey) -> Result<Self> {
                match key {
                    MapKey::$variant(k) => <$t>::try_from(k)
                        .map_err(|_| Error::conversion(stringify!($t), "out of range key")),
                    other => Err(Error::conversion(stringify!($t), other.shape().to_string())),
                }
            }
        }
    )*};
}

impl_key!(Int, Int, i64, i32, i16, i8);
impl_key!(UInt, UInt, u64, u32, u16, u8);
impl_key!(Bool, Bool, bool);
impl_key!(Str, Str, String);

impl<K: KeyType, V: Reflect> Reflect for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::key_shape(), V::shape())
    }
}

impl<K: KeyType, V: IntoValue + Reflect> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::map(
            K::key_shape(),
            V::shape(),
            self.into_iter()
                .map(|(k, v)| (k.into_key(), v.into_value()))
                .collect(),
        )
    }
}

impl<K: KeyType + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V)> { Ok((K::from_key(k)?, V::from_value(v)?)) })
                .collect(),
            Value::Nil(_) => Ok(HashMap::new()),
            other => mismatch("mapping", &other),
        }
    }
}

impl<K: KeyType, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::key_shape(), V::shape())
    }
}

impl<K: KeyType, V: IntoValue + Reflect> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::map(
            K::key_shape(),
            V::shape(),
            self.into_iter()
                .map(|(k, v)| (k.into_key(), v.into_value()))
                .collect(),
        )
    }
}

impl<K: KeyType + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V)> { Ok((K::from_key(k)?, V::from_value(v)?)) })
                .collect(),
            Value::Nil(_) => Ok(BTreeMap::new()),
            other => mismatch("mapping", &other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_is_reference() {
        assert_eq!(
            <Option<String>>::shape(),
            Shape::reference(Shape::Str)
        );
        assert_eq!(
            Some("x".to_string()).into_value(),
            Value::reference(Value::Str("x".to_string()))
        );
        assert_eq!(
            None::<i64>.into_value(),
            Value::Nil(Shape::reference(Shape::Int))
        );
    }

    #[test]
    fn test_integer_range_checked() {
        assert_eq!(i32::from_value(Value::Int(12)).unwrap(), 12);
        assert!(u8::from_value(Value::Int(300)).is_err());
        assert!(u32::from_value(Value::Int(-1)).is_err());
        assert_eq!(u64::from_value(Value::Int(5)).unwrap(), 5);
    }

    #[test]
    fn test_nil_scalars_are_zero() {
        assert_eq!(String::from_value(Value::nil()).unwrap(), "");
        assert_eq!(i64::from_value(Value::nil()).unwrap(), 0);
        assert_eq!(<Option<String>>::from_value(Value::nil()).unwrap(), None);
    }

    #[test]
    fn test_vec_round_trip_shape() {
        let v = vec!["a".to_string(), "b".to_string()].into_value();
        assert_eq!(v.shape(), Shape::seq(Shape::Str));
        let back = <Vec<String>>::from_value(v).unwrap();
        assert_eq!(back, vec!["a", "b"]);
    }

    #[test]
    fn test_map_shapes() {
        let mut m = HashMap::new();
        m.insert(1i64, "one".to_string());
        let v = m.into_value();
        assert_eq!(v.shape(), Shape::map(Shape::Int, Shape::Str));

        let back = <BTreeMap<i32, String>>::from_value(v).unwrap();
        assert_eq!(back.get(&1).map(String::as_str), Some("one"));
    }

    #[test]
    fn test_conversion_mismatch() {
        let err = bool::from_value(Value::Str("yes".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert string into bool");
    }
}
