//! Value transformation pipelines
//!
//! A [`Pipeline`] is an ordered list of [`Transformer`] stages. Running it
//! resolves the source value, optionally lets a [`Transformable`] hook
//! replace it, then threads it through every stage; [`transform`] finally
//! copies the result into a typed destination.
//!
//! # Module Organization
//!
//! - [`types`] - The stage contract and the self-transform hook
//! - [`pipeline`] - Pipeline construction and execution
//! - [`built_in`] - Stock stages
//!
//! # Examples
//!
//! ```
//! use reshape_core::transformer::{built_in, transform, Pipeline};
//!
//! let pipeline = Pipeline::new()
//!     .add_stage(built_in::Trim)
//!     .add_stage(built_in::Reverse);
//!
//! let mut out = String::new();
//! transform("foobar   ", &mut out, &pipeline).unwrap();
//! assert_eq!(out, "raboof");
//! ```
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub mod pipeline;
pub mod types;


pub use pipeline::{run_pipeline, transform, Pipeline};
pub use types::{RecordHook, TransformFn, Transformable, Transformer};
