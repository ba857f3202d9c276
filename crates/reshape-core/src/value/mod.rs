//! Dynamically typed values carried between pipeline stages
//!
//! [`Value`] is a closed tagged variant covering everything the engine moves
//! around: scalars, timestamps, references, sequences, mappings and records.
//! Absence is explicit: [`Value::Nil`] carries the shape of the thing that is
//! missing (a nil reference, a nil sequence, an untyped nil, ...).
//!
//! Rust types enter and leave the value world through the [`IntoValue`] and
//! [`FromValue`] traits; [`Reflect`] gives a type's static [`Shape`].
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

mod convert;
mod json;
mod record;
mod shape;

pub use convert::{FromValue, IntoValue, KeyType, Reflect};
pub use record::{Record, RecordField};
pub use shape::Shape;

use chrono::{DateTime, Timelike, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value of the given shape (nil reference, nil container, untyped nil)
    Nil(Shape),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Time(DateTime<Utc>),
    /// Non-nil reference
    Ref(Box<Value>),
    Seq(Seq),
    Map(Map),
    Record(Record),
}

/// An allocated sequence together with its element shape
#[derive(Debug, Clone, PartialEq)]
pub struct Seq {
    pub elem: Shape,
    pub items: Vec<Value>,
}

/// An allocated mapping together with its key and value shapes
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub key: Shape,
    pub value: Shape,
    pub entries: BTreeMap<MapKey, Value>,
}

/// Mapping keys: the value kinds that are totally ordered
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
}

impl MapKey {
    /// Dynamic shape of the key
    pub fn shape(&self) -> Shape {
        match self {
            MapKey::Bool(_) => Shape::Bool,
            MapKey::Int(_) => Shape::Int,
            MapKey::UInt(_) => Shape::UInt,
            MapKey::Str(_) => Shape::Str,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            MapKey::Bool(b) => Value::Bool(b),
            MapKey::Int(n) => Value::Int(n),
            MapKey::UInt(n) => Value::UInt(n),
            MapKey::Str(s) => Value::Str(s),
        }
    }

    /// Key for a scalar value; `None` for values that cannot key a mapping
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Int(n) => Some(MapKey::Int(*n)),
            Value::UInt(n) => Some(MapKey::UInt(*n)),
            Value::Str(s) => Some(MapKey::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Int(n) => write!(f, "{n}"),
            MapKey::UInt(n) => write!(f, "{n}"),
            MapKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(s)
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::Int(n)
    }
}

impl Value {
    /// Untyped nil
    pub fn nil() -> Self {
        Value::Nil(Shape::Any)
    }

    /// Reference to `value`
    pub fn reference(value: Value) -> Self {
        Value::Ref(Box::new(value))
    }

    /// Sequence with an explicit element shape
    pub fn seq(elem: Shape, items: Vec<Value>) -> Self {
        Value::Seq(Seq { elem, items })
    }

    /// Loosely typed sequence
    pub fn seq_any(items: Vec<Value>) -> Self {
        Value::seq(Shape::Any, items)
    }

    /// Mapping with explicit key and value shapes
    pub fn map(key: Shape, value: Shape, entries: BTreeMap<MapKey, Value>) -> Self {
        Value::Map(Map {
            key,
            value,
            entries,
        })
    }

    /// Dynamic shape of the value
    pub fn shape(&self) -> Shape {
        match self {
            Value::Nil(shape) => shape.clone(),
            Value::Bool(_) => Shape::Bool,
            Value::Int(_) => Shape::Int,
            Value::UInt(_) => Shape::UInt,
            Value::Float(_) => Shape::Float,
            Value::Str(_) => Shape::Str,
            Value::Time(_) => Shape::Time,
            Value::Ref(inner) => Shape::reference(inner.shape()),
            Value::Seq(seq) => Shape::seq(seq.elem.clone()),
            Value::Map(map) => Shape::map(map.key.clone(), map.value.clone()),
            Value::Record(record) => Shape::record(record.name()),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil(_))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

// Renders like a loose `%v`: containers are bracketed, records braced, and
// references are transparent.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil(_) => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => f.write_str(s),
            Value::Time(t) => write_time(f, t),
            Value::Ref(inner) => write!(f, "{inner}"),
            Value::Seq(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("map[")?;
                for (i, (key, value)) in map.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                f.write_str("]")
            }
            Value::Record(record) => {
                f.write_str("{")?;
                for (i, field) in record.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

// Shortest digits, switching to an exponent below 1e-4 and from 1e21 on.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("NaN");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "+Inf" } else { "-Inf" });
    }
    if x == 0.0 {
        return write!(f, "{x}");
    }
    let sci = format!("{x:e}");
    match sci
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)))
    {
        Some((mantissa, exp)) if !(-4..21).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            write!(f, "{mantissa}e{sign}{:02}", exp.abs())
        }
        _ => write!(f, "{x}"),
    }
}

// `YYYY-MM-DD hh:mm:ss[.fraction] +0000 UTC`, trailing fraction zeros dropped
fn write_time(f: &mut fmt::Formatter<'_>, t: &DateTime<Utc>) -> fmt::Result {
    write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S"))?;
    let nanos = t.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        write!(f, ".{}", fraction.trim_end_matches('0'))?;
    }
    write!(f, " {} UTC", t.format("%z"))
}
