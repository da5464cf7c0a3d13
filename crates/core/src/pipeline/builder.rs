// Pipeline builder resolving a declarative spec into live endpoints
use super::core::Pipeline;
use super::registry::{Registry, StageResult};
use super::spec::{PipelineSpec, Spec};
use crate::config::constants::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::error::{AggregateError, Result, StreamError};
use crate::stream::{Sink, Source};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds pipelines from specs using the registered constructors.
///
/// Either every component is opened and handed over in a [`Pipeline`], or
/// everything opened during the attempt is closed again before the error is
/// returned. Unwind close failures are reported after the triggering error.
pub struct PipelineBuilder {
    registry: Arc<Registry>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build the pipeline
    pub fn build(&self, spec: &PipelineSpec) -> Result<Pipeline> {
        let buffer_size = validate_buffer_size(spec.buffer_size)?;
        let registry = self.registry.as_ref();

        let mut input = registry.open_source(&spec.input).inspect_err(|err| {
            warn!("failed to open input: {err}");
        })?;

        let mut output = match registry.open_sink(&spec.output) {
            Ok(output) => output,
            Err(err) => {
                warn!("failed to open output: {err}");
                let mut closes = AggregateError::new();
                closes.record(input.close());
                return Err(closes.with_cause(err));
            }
        };

        let mut reader = match fold_decoders(registry, &spec.decoder, input) {
            Ok(reader) => reader,
            Err(failure) => {
                let (err, mut partial) = failure.into_parts();
                warn!("decoder chain failed, unwinding: {err}");
                let mut closes = AggregateError::new();
                closes.record(partial.close());
                closes.record(output.close());
                return Err(closes.with_cause(err));
            }
        };

        let writer = match fold_encoders(registry, &spec.encoder, output) {
            Ok(writer) => writer,
            Err(failure) => {
                let (err, mut partial) = failure.into_parts();
                warn!("encoder chain failed, unwinding: {err}");
                let mut closes = AggregateError::new();
                closes.record(reader.close());
                closes.record(partial.close());
                return Err(closes.with_cause(err));
            }
        };

        let decoders = stage_kinds(&spec.decoder);
        let encoders = stage_kinds(&spec.encoder);
        info!(
            "pipeline built: {} decoder(s) [{}], {} encoder(s) [{}]",
            decoders.len(),
            decoders.join(", "),
            encoders.len(),
            encoders.join(", ")
        );

        Ok(Pipeline::new(reader, writer)
            .with_stages(decoders, encoders)
            .with_buffer_size(buffer_size))
    }
}

/// Apply decoder stages left to right; stage `i` wraps the result of stage `i - 1`
fn fold_decoders(
    registry: &Registry,
    specs: &[Spec],
    source: Box<dyn Source>,
) -> StageResult<Box<dyn Source>> {
    specs.iter().enumerate().try_fold(source, |inner, (index, spec)| {
        debug!("decoder stage {index}");
        registry.wrap_decoder(spec, inner)
    })
}

/// Apply encoder stages left to right; stage `i` wraps the result of stage `i - 1`
fn fold_encoders(
    registry: &Registry,
    specs: &[Spec],
    sink: Box<dyn Sink>,
) -> StageResult<Box<dyn Sink>> {
    specs.iter().enumerate().try_fold(sink, |inner, (index, spec)| {
        debug!("encoder stage {index}");
        registry.wrap_encoder(spec, inner)
    })
}

fn stage_kinds(specs: &[Spec]) -> Vec<String> {
    specs
        .iter()
        .filter_map(|spec| spec.kind().ok().map(str::to_string))
        .collect()
}

fn validate_buffer_size(size: Option<usize>) -> Result<usize> {
    match size {
        None => Ok(DEFAULT_BUFFER_SIZE),
        Some(size) if size == 0 || size > MAX_BUFFER_SIZE => Err(StreamError::config(format!(
            "buffer_size must be between 1 and {MAX_BUFFER_SIZE}, got {size}"
        ))),
        Some(size) => Ok(size),
    }
}
