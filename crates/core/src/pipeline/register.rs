// Registration of the built-in combinators
use super::registry::Registry;
use super::spec::Spec;
use crate::config::constants::{CAT, FAN_OUT, SEQUENTIAL_CONCAT, TEE};
use crate::error::{Result, StreamError};
use crate::stream::{FanOutSink, SequentialSource, Sink, Source};

/// Register `sequential-concat` / `fan-out` and their `cat` / `tee` aliases
pub fn register_builtin(registry: &mut Registry) {
    registry.register_source(SEQUENTIAL_CONCAT, open_sequential);
    registry.register_source(CAT, open_sequential);
    registry.register_sink(FAN_OUT, open_fan_out);
    registry.register_sink(TEE, open_fan_out);
}

/// Source opener for a sequential concatenation of child sources
pub fn open_sequential(spec: &Spec, registry: &Registry) -> Result<Box<dyn Source>> {
    let children = spec.children()?;
    if children.is_empty() {
        return Err(StreamError::config(format!(
            "no input set in '{}'",
            spec.kind()?
        )));
    }
    let sources = registry.open_sources(&children)?;
    Ok(Box::new(SequentialSource::new(sources)?))
}

/// Sink opener for a fan-out over child sinks
pub fn open_fan_out(spec: &Spec, registry: &Registry) -> Result<Box<dyn Sink>> {
    let children = spec.children()?;
    if children.is_empty() {
        return Err(StreamError::config(format!(
            "no output set in '{}'",
            spec.kind()?
        )));
    }
    let sinks = registry.open_sinks(&children)?;
    Ok(Box::new(FanOutSink::new(sinks)?))
}
