//! Built-in transformers for common operations
//!
//! This module provides the stock stages: identity, stringification, string
//! clean-up, money scaling, defaults, inline closures and per-element
//! application over sequences and mappings.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use super::pipeline::{run_pipeline, Pipeline};
use super::types::{TransformFn, Transformer};
use crate::coerce::{map_keys_homogeneous, narrow_map, narrow_seq};
use crate::error::{Error, ErrorSet, Result};
use crate::value::{IntoValue, MapKey, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Characters removed by [`Trim`]
pub const TRIM_CHARS: &[char] = &[' ', '\n', '\t'];

/// Returns its input unchanged. Runs implicitly for empty pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transformer for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        Ok(value)
    }
}

/// Default textual rendering; absence becomes the empty string
#[derive(Debug, Clone, Copy, Default)]
pub struct Stringify;

impl Transformer for Stringify {
    fn name(&self) -> &str {
        "to_string"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        Ok(Value::Str(stringify(value)))
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::Nil(_) => String::new(),
        Value::Str(s) => s,
        other => other.to_string(),
    }
}

/// Stringify, then strip leading and trailing spaces, newlines and tabs
#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl Transformer for Trim {
    fn name(&self) -> &str {
        "trim"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        let s = stringify(value);
        Ok(Value::Str(s.trim_matches(TRIM_CHARS).to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpperCase;

impl Transformer for UpperCase {
    fn name(&self) -> &str {
        "upper_case"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        Ok(Value::Str(stringify(value).to_uppercase()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownCase;

impl Transformer for DownCase {
    fn name(&self) -> &str {
        "down_case"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        Ok(Value::Str(stringify(value).to_lowercase()))
    }
}

/// Reverse a string by characters. Absence passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse;

impl Transformer for Reverse {
    fn name(&self) -> &str {
        "reverse"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        match value {
            Value::Nil(_) => Ok(Value::nil()),
            Value::Str(s) => Ok(Value::Str(s.chars().rev().collect())),
            other => Err(Error::stage(
                self.name(),
                format!("expected a string but got {}", other.shape()),
            )),
        }
    }
}

/// Scale a monetary amount into integer minor units.
///
/// Floats are multiplied by `division` and truncated toward zero; integers
/// are multiplied exactly. Absence passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    pub division: i64,
}

/// Hundredths (cents)
pub const MONEY_100: Money = Money { division: 100 };

impl Money {
    pub fn new(division: i64) -> Self {
        Self { division }
    }
}

impl Transformer for Money {
    fn name(&self) -> &str {
        "money"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        match value {
            Value::Nil(_) => Ok(Value::nil()),
            Value::Float(x) => Ok(Value::Int((x * self.division as f64) as i64)),
            Value::Int(n) => n.checked_mul(self.division).map(Value::Int).ok_or_else(|| {
                Error::stage(self.name(), format!("{n} x {} overflows", self.division))
            }),
            Value::UInt(n) => i64::try_from(n)
                .ok()
                .and_then(|n| n.checked_mul(self.division))
                .map(Value::Int)
                .ok_or_else(|| {
                    Error::stage(self.name(), format!("{n} x {} overflows", self.division))
                }),
            other => Err(Error::stage(
                self.name(),
                format!("expected a number but got {}", other.shape()),
            )),
        }
    }
}

/// Substitute a fixed value for absence
#[derive(Debug, Clone, PartialEq)]
pub struct OrDefault {
    value: Value,
}

impl OrDefault {
    pub fn new(value: impl IntoValue) -> Self {
        Self {
            value: value.into_value(),
        }
    }
}

impl Transformer for OrDefault {
    fn name(&self) -> &str {
        "default"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        if value.is_nil() {
            Ok(self.value.clone())
        } else {
            Ok(value)
        }
    }
}

/// Inline transformer built from a closure
pub struct By {
    name: String,
    f: Box<TransformFn>,
}

impl By {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: "by".to_string(),
            f: Box::new(f),
        }
    }

    /// Name the closure for logs and errors
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Transformer for By {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, value: Value) -> Result<Value> {
        (self.f)(value).map_err(Error::Custom)
    }
}

impl fmt::Debug for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("By").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Apply a nested pipeline to every element of a sequence or every value of
/// a mapping.
///
/// Elements are processed independently: failures are collected into an
/// [`ErrorSet`] keyed by index (or mapping key) and returned together. Keys
/// of a mapping that mixes key kinds carry the kind, as in `1 (int)`, so that
/// `1` and `"1"` stay apart. On success the produced container is narrowed to
/// the elements' common shape; a mapping whose values are partly absent
/// keeps a loose value shape and is re-tagged when copied into a typed
/// mapping, with absent values written as zero values.
/// Absence passes through; any other non-container input is an error.
#[derive(Debug, Clone, Default)]
pub struct Each {
    pipeline: Pipeline,
}

impl Each {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

impl Transformer for Each {
    fn name(&self) -> &str {
        "each"
    }

    fn transform(&self, value: Value) -> Result<Value> {
        match value {
            Value::Nil(_) => Ok(Value::nil()),
            Value::Seq(seq) => {
                let mut errors = ErrorSet::new();
                let mut items = Vec::with_capacity(seq.items.len());
                for (index, item) in seq.items.into_iter().enumerate() {
                    match run_pipeline(item, &self.pipeline) {
                        Ok(produced) => items.push(produced),
                        Err(err) if err.is_usage() => return Err(err),
                        Err(err) => {
                            errors.insert(index.to_string(), err);
                            items.push(Value::nil());
                        }
                    }
                }
                errors.into_result()?;
                Ok(narrow_seq(items))
            }
            Value::Map(map) => {
                let qualify = !map_keys_homogeneous(&map.entries);
                let mut errors = ErrorSet::new();
                let mut entries: BTreeMap<MapKey, Value> = BTreeMap::new();
                for (key, item) in map.entries {
                    match run_pipeline(item, &self.pipeline) {
                        Ok(produced) => {
                            entries.insert(key, produced);
                        }
                        Err(err) if err.is_usage() => return Err(err),
                        Err(err) => errors.insert(error_key(&key, qualify), err),
                    }
                }
                errors.into_result()?;
                Ok(narrow_map(entries))
            }
            other => Err(Error::stage(
                self.name(),
                format!("must be a sequence or mapping but got {}", other.shape()),
            )),
        }
    }
}

fn error_key(key: &MapKey, qualify: bool) -> String {
    if qualify {
        format!("{key} ({})", key.shape())
    } else {
        key.to_string()
    }
}

/// Identity stage
pub fn copy() -> Identity {
    Identity
}

/// Textual rendering stage
pub fn to_string() -> Stringify {
    Stringify
}

/// Fixed fallback for absent values
pub fn or_default(value: impl IntoValue) -> OrDefault {
    OrDefault::new(value)
}

/// Inline closure stage
pub fn by<F>(f: F) -> By
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    By::new(f)
}

/// Per-element stage over the given pipeline
pub fn each(pipeline: Pipeline) -> Each {
    Each::new(pipeline)
}
