//! Interop with `serde_json` documents
//!
//! Arrays and objects are narrowed the same way `each` narrows its output,
//! so `["a", "b"]` becomes a string sequence and `["a", 1]` a loosely typed
//! one.

use super::{MapKey, Value};
use crate::coerce::{narrow_map, narrow_seq};
use serde_json::{Map as JsonMap, Number, Value as Json};

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::nil(),
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => number_to_value(&n),
            Json::String(s) => Value::Str(s),
            Json::Array(items) => narrow_seq(items.into_iter().map(Value::from).collect()),
            Json::Object(object) => narrow_map(
                object
                    .into_iter()
                    .map(|(k, v)| (MapKey::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::UInt(u)
    } else {
        Value::Float(n.as_f64().unwrap_or_default())
    }
}

impl Value {
    /// Render as a JSON document.
    ///
    /// References are transparent, records become objects with embedded
    /// fields flattened, non-string mapping keys are stringified, timestamps
    /// use RFC 3339 and non-finite floats become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Nil(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::Number((*n).into()),
            Value::UInt(n) => Json::Number((*n).into()),
            Value::Float(x) => Number::from_f64(*x).map(Json::Number).unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Time(t) => Json::String(t.to_rfc3339()),
            Value::Ref(inner) => inner.to_json(),
            Value::Seq(seq) => Json::Array(seq.items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Record(record) => {
                let mut object = JsonMap::new();
                for field in record.fields() {
                    match (field.embedded, field.value.to_json()) {
                        (true, Json::Object(inner)) => object.extend(inner),
                        (true, Json::Null) => {}
                        (_, json) => {
                            object.insert(field.name.clone(), json);
                        }
                    }
                }
                Json::Object(object)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Record, Shape};
    use serde_json::json;

    #[test]
    fn test_arrays_are_narrowed() {
        let v = Value::from(json!(["a", "b", "c"]));
        assert_eq!(v.shape(), Shape::seq(Shape::Str));

        let mixed = Value::from(json!(["a", 1]));
        assert_eq!(mixed.shape(), Shape::seq(Shape::Any));
    }

    #[test]
    fn test_objects_are_string_keyed() {
        let v = Value::from(json!({"a": 1, "b": 2}));
        assert_eq!(v.shape(), Shape::map(Shape::Str, Shape::Int));
    }

    #[test]
    fn test_record_to_json_flattens_embedded() {
        let base = Record::new("Base").with_field("ID", 1i64);
        let record = Record::new("User")
            .with_embedded("Base", Some(base))
            .with_field("Name", "Ann")
            .with_field("Nick", None::<String>);

        assert_eq!(
            Value::Record(record).to_json(),
            json!({"ID": 1, "Name": "Ann", "Nick": null})
        );
    }
}
