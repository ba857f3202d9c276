//! Core types for the transformation pipeline
//!
//! This module defines the contract every pipeline stage satisfies and the
//! optional self-transform hook a caller can attach to a pipeline.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::value::{Record, Value};
use std::fmt;

/// A single pipeline stage.
///
/// Stages are stateless and shared between calls, so they must not keep
/// call-specific data in their own fields. The input is already resolved:
/// it is never a reference, and absence arrives as an untyped nil.
pub trait Transformer: Send + Sync {
    /// Name used in logs and stage errors
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn transform(&self, value: Value) -> Result<Value>;
}

/// Signature of inline transformer closures
pub type TransformFn = dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync;

/// Self-transform capability attached to a pipeline.
///
/// Before the stages run, the hook is offered the (non-absent) source value.
/// If it claims the value, its output replaces the source as the working
/// value. This lets domain types contribute a default representation.
pub trait Transformable: Send + Sync {
    /// `None` when the hook does not apply to `value`
    fn represent(&self, value: &Value) -> Option<Result<Value>>;
}

impl<F> Transformable for F
where
    F: Fn(&Value) -> Option<Result<Value>> + Send + Sync,
{
    fn represent(&self, value: &Value) -> Option<Result<Value>> {
        self(value)
    }
}

/// Hook that applies to records of one type name
pub struct RecordHook {
    record: String,
    represent: Box<dyn Fn(&Record) -> Result<Value> + Send + Sync>,
}

impl RecordHook {
    pub fn new<F>(record: impl Into<String>, represent: F) -> Self
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            record: record.into(),
            represent: Box::new(represent),
        }
    }
}

impl Transformable for RecordHook {
    fn represent(&self, value: &Value) -> Option<Result<Value>> {
        match value {
            Value::Record(record) if record.name() == self.record => {
                Some((self.represent)(record))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for RecordHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHook")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
