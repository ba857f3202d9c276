//! Homogeneity narrowing for produced containers
//!
//! A stage that builds a container from per-element results does not know
//! the element type up front. These helpers inspect the results and narrow
//! the container's element (or key/value) shape only when every entry shares
//! the same dynamic shape. A single entry is always homogeneous; an empty
//! container never is.

use crate::value::{MapKey, Shape, Value};
use std::collections::BTreeMap;

/// Whether every item has the dynamic shape of the first one
pub fn seq_is_homogeneous(items: &[Value]) -> bool {
    match items.split_first() {
        Some((first, rest)) => {
            let shape = first.shape();
            rest.iter().all(|item| item.shape() == shape)
        }
        None => false,
    }
}

/// Whether every key has the shape of the first key
pub fn map_keys_homogeneous(entries: &BTreeMap<MapKey, Value>) -> bool {
    all_same(entries.keys().map(MapKey::shape))
}

/// Whether every value has the dynamic shape of the first value
pub fn map_values_homogeneous(entries: &BTreeMap<MapKey, Value>) -> bool {
    all_same(entries.values().map(Value::shape))
}

fn all_same(mut shapes: impl Iterator<Item = Shape>) -> bool {
    match shapes.next() {
        Some(first) => shapes.all(|shape| shape == first),
        None => false,
    }
}

/// Build a sequence from produced items, narrowing the element shape when
/// the items are homogeneous and falling back to [`Shape::Any`] otherwise
pub fn narrow_seq(items: Vec<Value>) -> Value {
    let elem = if seq_is_homogeneous(&items) {
        items[0].shape()
    } else {
        Shape::Any
    };
    Value::seq(elem, items)
}

/// Build a mapping from produced entries; key and value shapes narrow
/// independently of each other
pub fn narrow_map(entries: BTreeMap<MapKey, Value>) -> Value {
    let key = match entries.keys().next() {
        Some(first) if map_keys_homogeneous(&entries) => first.shape(),
        _ => Shape::Any,
    };
    let value = match entries.values().next() {
        Some(first) if map_values_homogeneous(&entries) => first.shape(),
        _ => Shape::Any,
    };
    Value::map(key, value, entries)
}
