//! Record values: named, ordered collections of fields
//!
//! A field may be *embedded*: its value is itself a record (or a reference to
//! one) whose fields are promoted into the enclosing record for lookup.

use super::{FromValue, IntoValue, Value};
use crate::error::{Error, Result};

/// A named record instance
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<RecordField>,
}

/// One field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub value: Value,
    /// Anonymous field whose own fields are promoted
    pub embedded: bool,
}

impl Record {
    /// Create an empty record of the given type name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a regular field
    pub fn with_field(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.push(name, value.into_value(), false);
        self
    }

    /// Append an embedded field; `value` should be a record or a reference to one
    pub fn with_embedded(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.push(name, value.into_value(), true);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value, embedded: bool) {
        self.fields.push(RecordField {
            name: name.into(),
            value,
            embedded,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of a direct (non-promoted) field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Move a direct field's value out and convert it.
    ///
    /// The field is left as an untyped nil. Used by hand-written
    /// [`FromValue`] implementations of record types.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T> {
        let record_name = &self.name;
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::conversion(format!("field `{name}`"), record_name.clone()))?;
        let value = std::mem::replace(&mut field.value, Value::nil());
        T::from_value(value)
    }
}
