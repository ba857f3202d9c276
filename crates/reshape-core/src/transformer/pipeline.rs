//! Transformation pipeline implementation
//!
//! This module contains the pipeline executor: it resolves the source value,
//! offers it to the optional self-transform hook, threads it through the
//! stages in order and, for [`transform`], copies the result into a
//! destination.
//!
//! Copyright (c) 2025 Reshape Team
//! Licensed under the Apache-2.0 license

use super::built_in::Identity;
use super::types::{Transformable, Transformer};
use crate::coerce::{copy_into, Destination};
use crate::error::Result;
use crate::resolve::resolve_or_nil;
use crate::value::{IntoValue, Value};
use std::fmt;
use std::sync::Arc;

static IDENTITY: Identity = Identity;

/// An ordered list of stages plus an optional self-transform hook.
///
/// A pipeline with no stages behaves as a single identity stage. Pipelines
/// are cheap to clone; stages are shared.
#[derive(Clone, Default)]
pub struct Pipeline {
    /// Stages in execution order
    stages: Vec<Arc<dyn Transformer>>,
    /// Hook offered the source before the first stage
    hook: Option<Arc<dyn Transformable>>,
}

impl Pipeline {
    /// Create an empty (identity) pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn add_stage<T: Transformer + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append a stage that is shared with other pipelines
    pub fn add_shared_stage(mut self, stage: Arc<dyn Transformer>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append several shared stages
    pub fn add_stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Transformer>>,
    {
        self.stages.extend(stages);
        self
    }

    /// Attach a self-transform hook
    pub fn with_hook<H: Transformable + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Number of explicitly added stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline runs only the implicit identity stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Run the pipeline; see [`run_pipeline`]
    pub fn run(&self, source: impl IntoValue) -> Result<Value> {
        run_pipeline(source, self)
    }

    fn effective_stages(&self) -> Box<dyn Iterator<Item = &(dyn Transformer + 'static)> + '_> {
        if self.stages.is_empty() {
            let identity: &(dyn Transformer + 'static) = &IDENTITY;
            Box::new(std::iter::once(identity))
        } else {
            Box::new(self.stages.iter().map(|stage| &**stage))
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|stage| stage.name()).collect();
        f.debug_struct("Pipeline")
            .field("stages", &names)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Thread `source` through the pipeline and return the last stage's output.
///
/// Every stage receives the fully resolved output of the previous one, so an
/// absent input reaches the stages as an untyped nil. The hook is consulted
/// only for a present source. The first failing stage aborts the run and its
/// error is returned unchanged.
pub fn run_pipeline(source: impl IntoValue, pipeline: &Pipeline) -> Result<Value> {
    let mut working = resolve_or_nil(source.into_value());

    if let Some(hook) = &pipeline.hook {
        if !working.is_nil() {
            if let Some(represented) = hook.represent(&working) {
                log::trace!("self-transform hook claimed {}", working.shape());
                working = resolve_or_nil(represented?);
            }
        }
    }

    let mut stages = pipeline.effective_stages().peekable();
    while let Some(stage) = stages.next() {
        log::trace!("running stage `{}` on {}", stage.name(), working.shape());
        let output = stage.transform(working)?;
        if stages.peek().is_none() {
            return Ok(output);
        }
        working = resolve_or_nil(output);
    }

    Ok(working)
}

/// Run the pipeline and copy the result into `dest`.
///
/// An absent result leaves the destination untouched.
pub fn transform(
    source: impl IntoValue,
    dest: &mut dyn Destination,
    pipeline: &Pipeline,
) -> Result<()> {
    let result = run_pipeline(source, pipeline)?;
    copy_into(result, dest)
}
