//! Error types for the Reshape core library
//!
//! This module defines the error handling system for the engine, using
//! thiserror for the error enums and anyhow for failures raised by
//! caller-supplied transformers.
//!
//! Failures fall into three groups:
//!
//! - **Usage errors** ([`UsageError`]): mistakes in the calling code, such as
//!   binding a field the record does not have. They halt the current
//!   operation and are never collected into an [`ErrorSet`].
//! - **Stage errors** ([`Error::Stage`], [`Error::Custom`]): a transformer
//!   rejected its input. The pipeline stops and surfaces the error unmodified.
//! - **Aggregate errors** ([`Error::Aggregate`]): independent sibling
//!   operations (record fields, sequence elements, mapping values) failed and
//!   were collected under their keys.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use crate::value::Shape;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use thiserror::Error;

/// Main error type for Reshape operations
#[derive(Error, Debug)]
pub enum Error {
    /// A transformer stage rejected its input
    #[error("{stage}: {message}")]
    Stage { stage: String, message: String },

    /// Failure raised by caller-supplied code (inline transformers, hooks)
    #[error(transparent)]
    Custom(#[from] anyhow::Error),

    /// An engine value could not be turned into the requested Rust type
    #[error("cannot convert {found} into {expected}")]
    Conversion { expected: String, found: String },

    /// Failures of independent fields or elements, keyed by their name
    #[error(transparent)]
    Aggregate(ErrorSet),

    /// Programmer error; correct calling code never sees one
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a stage error for the named transformer
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a custom error from a plain message
    pub fn custom(message: impl fmt::Display) -> Self {
        Error::Custom(anyhow::anyhow!("{}", message))
    }

    /// Create a conversion error
    pub fn conversion(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::Conversion {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether this error reports a mistake in the calling code
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// The nested error set, if this is an aggregate error
    pub fn as_aggregate(&self) -> Option<&ErrorSet> {
        match self {
            Error::Aggregate(set) => Some(set),
            _ => None,
        }
    }
}

impl From<ErrorSet> for Error {
    fn from(set: ErrorSet) -> Self {
        Error::Aggregate(set)
    }
}

/// Mistakes in the calling code
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    /// The bound field does not belong to the record
    #[error("field `{field}` not found in record `{record}`")]
    FieldNotFound { record: String, field: String },

    /// More than one field matches the reference at the same embedding depth
    #[error("field `{field}` is ambiguous in record `{record}`")]
    AmbiguousField { record: String, field: String },

    /// An index path does not address a field
    #[error("invalid field path {path:?} in record `{record}`")]
    InvalidFieldPath { record: String, path: Vec<usize> },

    /// Field mapping was asked to read from something that is not a record
    #[error("must be a record but got {found}")]
    NotARecord { found: Shape },

    /// A value cannot be assigned to a destination of another shape
    #[error("cannot assign {found} to {expected}")]
    ShapeMismatch { expected: Shape, found: Shape },

    /// Mapping reshaping is not performed by the coercion engine
    #[error("cannot coerce {found} into {expected}: mapping coercion is not supported")]
    UnsupportedCoercion { expected: Shape, found: Shape },
}

/// Keyed collection of failures from independent sub-operations.
///
/// Keys are field names, sequence indices or mapping keys. Values are leaf
/// errors or nested sets (as [`Error::Aggregate`]). Rendering is
/// deterministic: keys are sorted ascending regardless of insertion order.
#[derive(Debug, Default)]
pub struct ErrorSet {
    errors: BTreeMap<String, Error>,
}

impl ErrorSet {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error under a key, replacing any previous error for it
    pub fn insert(&mut self, key: impl Into<String>, error: impl Into<Error>) {
        self.errors.insert(key.into(), error.into());
    }

    /// Get the error recorded for a key
    pub fn get(&self, key: &str) -> Option<&Error> {
        self.errors.get(key)
    }

    /// Whether an error is recorded for a key
    pub fn contains_key(&self, key: &str) -> bool {
        self.errors.contains_key(key)
    }

    /// Number of recorded errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// An empty set means success
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Keys in rendering order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Entries in rendering order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Error> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise the set as an aggregate error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate(self))
        }
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return Ok(());
        }

        for (i, (key, error)) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match error {
                Error::Aggregate(nested) => write!(f, "{key}: ({nested})")?,
                other => write!(f, "{key}: {other}")?,
            }
        }
        f.write_str(".")
    }
}

impl std::error::Error for ErrorSet {}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = (&'a String, &'a Error);
    type IntoIter = btree_map::Iter<'a, String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for ErrorSet {
    type Item = (String, Error);
    type IntoIter = btree_map::IntoIter<String, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<(String, Error)> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = (String, Error)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

// Nested sets serialize as nested objects, leaves as their message.
impl Serialize for ErrorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (key, error) in &self.errors {
            match error {
                Error::Aggregate(nested) => map.serialize_entry(key, nested)?,
                other => map.serialize_entry(key, &other.to_string())?,
            }
        }
        map.end()
    }
}
