//! Indirection resolution
//!
//! Every pipeline run and every coercion starts by resolving its input, so
//! absence is always an explicit `None` rather than a nil value threaded
//! through the stages.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use crate::value::Value;

/// Unwrap all reference levels of `value`.
///
/// Returns `None` when the value is absent: a nil reference at any level, a
/// nil sequence or mapping, or an untyped nil. Scalars, records and allocated
/// containers (even empty ones) are returned unchanged.
pub fn resolve(value: Value) -> Option<Value> {
    match value {
        Value::Nil(_) => None,
        Value::Ref(inner) => resolve(*inner),
        other => Some(other),
    }
}

/// Borrowing variant of [`resolve`]
pub fn resolve_ref(value: &Value) -> Option<&Value> {
    match value {
        Value::Nil(_) => None,
        Value::Ref(inner) => resolve_ref(inner),
        other => Some(other),
    }
}

/// Whether `value` resolves to nothing
pub fn is_absent(value: &Value) -> bool {
    resolve_ref(value).is_none()
}

/// Resolve, substituting an untyped nil for absence
pub(crate) fn resolve_or_nil(value: Value) -> Value {
    resolve(value).unwrap_or_else(Value::nil)
}
