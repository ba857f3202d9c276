//! Reshape Core - Value transformation engine
//!
//! This crate moves data from one shape to another: a source value is run
//! through a pipeline of transformer stages and the result is copied into a
//! typed destination, with automatic reconciliation of reference depth
//! between what was produced and what the destination holds.
//!
//! # Main Components
//!
//! - **Values**: A closed dynamic value model with explicit absence and
//!   static shapes for Rust types
//! - **Coercion**: Copying produced values into destinations of another shape
//! - **Pipelines**: Ordered transformer stages with an optional self-transform hook
//! - **Field Mapping**: Per-field pipelines over records with aggregated errors
//! - **Error Handling**: Error types using `thiserror` and `anyhow`
//!
//! # Example
//!
//! ```
//! use reshape_core::transformer::built_in;
//! use reshape_core::{transform, Pipeline, Result};
//!
//! fn example() -> Result<()> {
//!     let pipeline = Pipeline::new()
//!         .add_stage(built_in::to_string())
//!         .add_stage(built_in::Reverse);
//!
//!     let mut out: Option<String> = None;
//!     transform(1200i64, &mut out, &pipeline)?;
//!     assert_eq!(out.as_deref(), Some("0021"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod coerce;
pub mod error;
pub mod fields;
pub mod resolve;
pub mod transformer;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, ErrorSet, Result, UsageError};
pub use value::{
    // Value model
    FromValue, IntoValue, KeyType, MapKey, Record, RecordField, Reflect, Shape, Value,
};

pub use coerce::{coerce, copy_into, narrow_map, narrow_seq, Destination, Slot};
pub use fields::{transform_fields, FieldBinding, FieldRef};
pub use resolve::{is_absent, resolve};
pub use transformer::{
    run_pipeline, transform, Pipeline, RecordHook, Transformable, Transformer,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
