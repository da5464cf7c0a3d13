// API module for core-full: one-call pipeline runs
use crate::context::load_pipeline_spec;
use crate::pipeline::register_all;
use std::path::Path;
use std::sync::Arc;
use streamcast_core::error::AggregateError;
use streamcast_core::pipeline::{PipelineBuilder, PipelineSpec, Registry};
use streamcast_core::Result;
use tracing::debug;

/// Registry with every kind this crate and the core provide
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    register_all(&mut registry);
    registry
}

/// Build the pipeline, copy everything, then close it.
///
/// The pipeline is closed even when the copy fails; in that case the copy
/// error comes first, followed by any close errors.
pub fn run(registry: Arc<Registry>, spec: &PipelineSpec) -> Result<u64> {
    let mut pipeline = PipelineBuilder::new(registry).build(spec)?;

    let copied = pipeline.copy();
    let closed = pipeline.close();

    match (copied, closed) {
        (Ok(transferred), Ok(())) => Ok(transferred),
        (Ok(_), Err(err)) | (Err(err), Ok(())) => Err(err),
        (Err(copy_err), Err(close_err)) => {
            let mut errors = AggregateError::new();
            errors.push(copy_err);
            errors.push(close_err);
            Err(errors.into())
        }
    }
}

/// Load the document at `path` and run it against [`default_registry`]
pub fn run_file(path: impl AsRef<Path>) -> Result<u64> {
    debug!("Running pipeline document {}", path.as_ref().display());
    let spec = load_pipeline_spec(path)?;
    run(Arc::new(default_registry()), &spec)
}
