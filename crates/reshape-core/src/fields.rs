//! Record field mapping
//!
//! [`transform_fields`] runs one pipeline per bound field of a source record
//! and writes each result into its own destination. Fields are independent:
//! a failing field does not stop the others, and failures are reported
//! together as an [`ErrorSet`] keyed by field name.
//!
//! Fields are referenced by name (optionally narrowed by shape) or by index
//! path, so a field promoted from an embedded record and the embedded record
//! itself are always distinguishable.
//!
//! # Examples
//!
//! ```
//! use reshape_core::fields::{transform_fields, FieldBinding};
//! use reshape_core::transformer::{built_in, Pipeline};
//! use reshape_core::{Record, Value};
//!
//! let source = Value::Record(
//!     Record::new("Person")
//!         .with_field("FirstName", " John ")
//!         .with_field("Age", 30i64),
//! );
//!
//! let mut first_name = String::new();
//! let mut age: Option<String> = None;
//!
//! transform_fields(
//!     &source,
//!     vec![
//!         FieldBinding::new("FirstName", &mut first_name).add_stage(built_in::Trim),
//!         FieldBinding::new("Age", &mut age).add_stage(built_in::to_string()),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(first_name, "John");
//! assert_eq!(age.as_deref(), Some("30"));
//! ```
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use crate::coerce::Destination;
use crate::error::{Error, ErrorSet, Result, UsageError};
use crate::resolve::resolve_ref;
use crate::transformer::{transform, Pipeline, Transformer};
use crate::value::{Record, RecordField, Shape, Value};
use std::fmt;

/// Identifies one field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// Field name, searched breadth-first through embedded records; the
    /// optional shape must match the field's dynamic shape
    Name { name: String, shape: Option<Shape> },
    /// Field indices from the outer record down; every index but the last
    /// must select an embedded record
    Path(Vec<usize>),
}

impl FieldRef {
    pub fn name(name: impl Into<String>) -> Self {
        FieldRef::Name {
            name: name.into(),
            shape: None,
        }
    }

    /// Name plus the shape the field must have
    pub fn typed(name: impl Into<String>, shape: Shape) -> Self {
        FieldRef::Name {
            name: name.into(),
            shape: Some(shape),
        }
    }

    pub fn path(indices: impl IntoIterator<Item = usize>) -> Self {
        FieldRef::Path(indices.into_iter().collect())
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::name(name)
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldRef::name(name)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name { name, shape: None } => f.write_str(name),
            FieldRef::Name {
                name,
                shape: Some(shape),
            } => write!(f, "{name} ({shape})"),
            FieldRef::Path(path) => write!(f, "{path:?}"),
        }
    }
}

/// One field of the source record bound to a destination and a pipeline
pub struct FieldBinding<'a> {
    field: FieldRef,
    dest: &'a mut dyn Destination,
    pipeline: Pipeline,
    optional: bool,
}

impl<'a> FieldBinding<'a> {
    /// Bind a field to a destination with an identity pipeline
    pub fn new(field: impl Into<FieldRef>, dest: &'a mut dyn Destination) -> Self {
        Self {
            field: field.into(),
            dest,
            pipeline: Pipeline::new(),
            optional: false,
        }
    }

    /// Replace the binding's pipeline
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Append a stage to the binding's pipeline
    pub fn add_stage<T: Transformer + 'static>(mut self, stage: T) -> Self {
        self.pipeline = self.pipeline.add_stage(stage);
        self
    }

    /// Log failures of this field instead of reporting them
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn field(&self) -> &FieldRef {
        &self.field
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for FieldBinding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .field("dest", &self.dest.shape())
            .field("pipeline", &self.pipeline)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Bind `field` to `dest` through `pipeline`
pub fn field<'a>(
    field: impl Into<FieldRef>,
    dest: &'a mut dyn Destination,
    pipeline: Pipeline,
) -> FieldBinding<'a> {
    FieldBinding::new(field, dest).pipeline(pipeline)
}

/// Run every binding against the source record.
///
/// An absent source (nil reference or untyped nil) is a successful no-op.
/// A source that is not a record, or a binding whose field cannot be
/// located, is a usage error and aborts the call. Other failures are
/// collected under the field's name; failures of optional bindings are only
/// logged.
pub fn transform_fields(source: &Value, bindings: Vec<FieldBinding<'_>>) -> Result<()> {
    let record = match resolve_ref(source) {
        None => return Ok(()),
        Some(Value::Record(record)) => record,
        Some(other) => {
            return Err(UsageError::NotARecord {
                found: other.shape(),
            }
            .into())
        }
    };

    let span = tracing::debug_span!(
        "transform_fields",
        record = record.name(),
        bindings = bindings.len()
    );
    let _enter = span.enter();

    let mut errors = ErrorSet::new();
    for binding in bindings {
        let FieldBinding {
            field,
            dest,
            pipeline,
            optional,
        } = binding;

        let target = locate(record, &field)?;
        match transform(target.value.clone(), dest, &pipeline) {
            Ok(()) => {}
            Err(err) if err.is_usage() => return Err(err),
            Err(err) if optional => {
                log::warn!("Optional field '{}' failed: {}", target.name, err);
            }
            Err(err) => {
                tracing::debug!(field = %target.name, error = %err, "field transformation failed");
                errors.insert(target.name.clone(), err);
            }
        }
    }

    errors.into_result()
}

/// Find the field a reference designates
pub fn locate<'r>(record: &'r Record, field: &FieldRef) -> Result<&'r RecordField> {
    match field {
        FieldRef::Name { name, shape } => find_by_name(record, name, shape.as_ref())?
            .ok_or_else(|| not_found(record, name)),
        FieldRef::Path(path) => find_by_path(record, path).ok_or_else(|| {
            Error::from(UsageError::InvalidFieldPath {
                record: record.name().to_string(),
                path: path.clone(),
            })
        }),
    }
}

fn not_found(record: &Record, name: &str) -> Error {
    UsageError::FieldNotFound {
        record: record.name().to_string(),
        field: name.to_string(),
    }
    .into()
}

// Breadth-first by embedding depth: a shallower field hides deeper ones, and
// two matches at the same depth are ambiguous. Nil embedded references are
// skipped.
fn find_by_name<'r>(
    record: &'r Record,
    name: &str,
    shape: Option<&Shape>,
) -> Result<Option<&'r RecordField>> {
    let mut level: Vec<&'r Record> = vec![record];

    while !level.is_empty() {
        let mut found: Option<&'r RecordField> = None;
        let mut next = Vec::new();

        for current in &level {
            for candidate in current.fields() {
                if candidate.name == name
                    && shape.map_or(true, |shape| candidate.value.shape() == *shape)
                {
                    if found.is_some() {
                        return Err(UsageError::AmbiguousField {
                            record: record.name().to_string(),
                            field: name.to_string(),
                        }
                        .into());
                    }
                    found = Some(candidate);
                }
                if candidate.embedded {
                    if let Some(Value::Record(inner)) = resolve_ref(&candidate.value) {
                        next.push(inner);
                    }
                }
            }
        }

        if found.is_some() {
            return Ok(found);
        }
        level = next;
    }

    Ok(None)
}

fn find_by_path<'r>(record: &'r Record, path: &[usize]) -> Option<&'r RecordField> {
    let (last, parents) = path.split_last()?;
    let mut current = record;
    for &index in parents {
        let field = current.fields().get(index)?;
        if !field.embedded {
            return None;
        }
        current = resolve_ref(&field.value)?.as_record()?;
    }
    current.fields().get(*last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::built_in;

    fn person() -> Record {
        let base = Record::new("Base").with_field("ID", 7i64);
        Record::new("Person")
            .with_embedded("Base", base)
            .with_field("Name", "Ann")
    }

    #[test]
    fn test_locate_promoted_and_embedded() {
        let record = person();
        assert_eq!(locate(&record, &"ID".into()).unwrap().name, "ID");
        assert_eq!(locate(&record, &"Base".into()).unwrap().name, "Base");
        assert_eq!(locate(&record, &FieldRef::path([0])).unwrap().name, "Base");
        assert_eq!(locate(&record, &FieldRef::path([0, 0])).unwrap().name, "ID");
        assert_eq!(locate(&record, &FieldRef::path([1])).unwrap().name, "Name");
    }

    #[test]
    fn test_shallow_field_hides_promoted() {
        let base = Record::new("Base").with_field("ID", 7i64);
        let record = Record::new("Item")
            .with_embedded("Base", Some(base))
            .with_field("ID", "item-1");

        let shallow = locate(&record, &"ID".into()).unwrap();
        assert_eq!(shallow.value, Value::Str("item-1".to_string()));

        let deep = locate(&record, &FieldRef::typed("ID", Shape::Int)).unwrap();
        assert_eq!(deep.value, Value::Int(7));
    }

    #[test]
    fn test_same_depth_is_ambiguous() {
        let a = Record::new("A").with_field("ID", 1i64);
        let b = Record::new("B").with_field("ID", 2i64);
        let record = Record::new("Both").with_embedded("A", a).with_embedded("B", b);

        let err = locate(&record, &"ID".into()).unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::AmbiguousField { .. })
        ));
        assert_eq!(locate(&record, &FieldRef::path([1, 0])).unwrap().value, Value::Int(2));
    }

    #[test]
    fn test_invalid_paths() {
        let record = person();
        for path in [vec![], vec![5], vec![1, 0], vec![0, 3]] {
            let err = locate(&record, &FieldRef::Path(path)).unwrap_err();
            assert!(matches!(
                err,
                Error::Usage(UsageError::InvalidFieldPath { .. })
            ));
        }
    }

    #[test]
    fn test_nil_embedded_is_skipped() {
        let record = Record::new("Person")
            .with_embedded("Base", None::<Record>)
            .with_field("Name", "Ann");
        let err = locate(&record, &"ID".into()).unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::FieldNotFound { .. })));
    }

    #[test]
    fn test_absent_source_is_noop() {
        let mut name = "prior".to_string();
        transform_fields(
            &Value::Nil(Shape::reference(Shape::record("Person"))),
            vec![FieldBinding::new("Name", &mut name)],
        )
        .unwrap();
        assert_eq!(name, "prior");
    }

    #[test]
    fn test_non_record_source() {
        let mut name = String::new();
        let err = transform_fields(
            &Value::Int(3),
            vec![FieldBinding::new("Name", &mut name)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Usage(UsageError::NotARecord { .. })));
    }

    #[test]
    fn test_unknown_field_aborts() {
        let source = Value::Record(person());
        let mut name = String::new();
        let mut other = String::new();
        let err = transform_fields(
            &source,
            vec![
                FieldBinding::new("Nope", &mut other),
                FieldBinding::new("Name", &mut name),
            ],
        )
        .unwrap_err();
        assert!(err.is_usage());
        assert_eq!(name, "");
    }

    #[test]
    fn test_optional_failure_is_not_reported() {
        let source = Value::Record(person());
        let mut id = String::new();
        let mut name = String::new();
        transform_fields(
            &source,
            vec![
                FieldBinding::new("ID", &mut id).add_stage(built_in::Reverse).optional(),
                FieldBinding::new("Name", &mut name).add_stage(built_in::UpperCase),
            ],
        )
        .unwrap();
        assert_eq!(id, "");
        assert_eq!(name, "ANN");
    }

    #[test]
    fn test_binding_debug() {
        let mut n = 0i64;
        let binding = field("ID", &mut n, Pipeline::new()).optional();
        assert!(binding.is_optional());
        assert_eq!(binding.field(), &FieldRef::name("ID"));
        assert!(format!("{binding:?}").contains("Int"));
    }
}
