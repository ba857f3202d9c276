//! Static type descriptors for engine values
//!
//! A [`Shape`] describes the type a destination expects (its static shape) or
//! the type a produced value actually has (its dynamic shape, see
//! [`Value::shape`]). The coercion engine compares the two to decide how many
//! reference levels to add or strip and how to rebuild sequences.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use super::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type descriptor for values and destinations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Loosely typed; accepts any value
    Any,
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Time,
    /// Optional reference to a value of the inner shape
    Ref(Box<Shape>),
    /// Sequence with the given element shape
    Seq(Box<Shape>),
    /// Mapping with the given key and value shapes
    Map(Box<Shape>, Box<Shape>),
    /// Named record type
    Record(String),
}

impl Shape {
    /// Reference to `inner`
    pub fn reference(inner: Shape) -> Self {
        Shape::Ref(Box::new(inner))
    }

    /// Sequence of `elem`
    pub fn seq(elem: Shape) -> Self {
        Shape::Seq(Box::new(elem))
    }

    /// Mapping from `key` to `value`
    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }

    /// Named record
    pub fn record(name: impl Into<String>) -> Self {
        Shape::Record(name.into())
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Shape::Ref(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Shape::Any)
    }

    /// The referenced shape, if this is a reference
    pub fn pointee(&self) -> Option<&Shape> {
        match self {
            Shape::Ref(inner) => Some(inner),
            _ => None,
        }
    }

    /// Number of reference levels before reaching a non-reference shape
    pub fn ref_depth(&self) -> usize {
        let mut depth = 0;
        let mut shape = self;
        while let Shape::Ref(inner) = shape {
            depth += 1;
            shape = inner;
        }
        depth
    }

    /// The zero value of this shape.
    ///
    /// References, sequences, mappings and records have no allocated zero, so
    /// they yield a typed nil.
    pub fn zero_value(&self) -> Value {
        match self {
            Shape::Bool => Value::Bool(false),
            Shape::Int => Value::Int(0),
            Shape::UInt => Value::UInt(0),
            Shape::Float => Value::Float(0.0),
            Shape::Str => Value::Str(String::new()),
            Shape::Time => Value::Time(DateTime::<Utc>::default()),
            other => Value::Nil(other.clone()),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => write!(f, "any"),
            Shape::Bool => write!(f, "bool"),
            Shape::Int => write!(f, "int"),
            Shape::UInt => write!(f, "uint"),
            Shape::Float => write!(f, "float"),
            Shape::Str => write!(f, "string"),
            Shape::Time => write!(f, "time"),
            Shape::Ref(inner) => write!(f, "*{inner}"),
            Shape::Seq(elem) => write!(f, "[]{elem}"),
            Shape::Map(key, value) => write!(f, "map[{key}]{value}"),
            Shape::Record(name) => write!(f, "{name}"),
        }
    }
}
