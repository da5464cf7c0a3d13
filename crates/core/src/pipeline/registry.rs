// Kind registry mapping discriminators to endpoint constructors
use super::spec::Spec;
use crate::error::{AggregateError, Namespace, Result, StreamError};
use crate::stream::{Sink, Source};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Opens a source from its spec. Composite kinds resolve children through the registry.
pub type SourceOpener = Box<dyn Fn(&Spec, &Registry) -> Result<Box<dyn Source>> + Send + Sync>;

/// Opens a sink from its spec
pub type SinkOpener = Box<dyn Fn(&Spec, &Registry) -> Result<Box<dyn Sink>> + Send + Sync>;

/// Wraps a source in a decoder stage
pub type DecoderWrapper =
    Box<dyn Fn(&Spec, Box<dyn Source>) -> StageResult<Box<dyn Source>> + Send + Sync>;

/// Wraps a sink in an encoder stage
pub type EncoderWrapper =
    Box<dyn Fn(&Spec, Box<dyn Sink>) -> StageResult<Box<dyn Sink>> + Send + Sync>;

/// Result of a stage wrapper: on failure the unconsumed inner endpoint is handed back
pub type StageResult<T> = std::result::Result<T, StageFailure<T>>;

/// A stage wrapper failure together with the inner endpoint it was given
pub struct StageFailure<T> {
    pub error: StreamError,
    pub inner: T,
}

impl<T> StageFailure<T> {
    pub fn new(error: impl Into<StreamError>, inner: T) -> Self {
        Self {
            error: error.into(),
            inner,
        }
    }

    pub fn into_parts(self) -> (StreamError, T) {
        (self.error, self.inner)
    }
}

impl<T> std::fmt::Debug for StageFailure<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Registry of source, sink, decoder and encoder constructors.
///
/// Populate it once, then share it (typically behind an `Arc`) read-only.
/// Registering a name twice in one namespace replaces the earlier entry.
#[derive(Default)]
pub struct Registry {
    sources: IndexMap<String, SourceOpener>,
    sinks: IndexMap<String, SinkOpener>,
    decoders: IndexMap<String, DecoderWrapper>,
    encoders: IndexMap<String, EncoderWrapper>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in combinators
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        super::register::register_builtin(&mut registry);
        registry
    }

    /// Register a source opener. Returns `true` when an earlier entry was replaced.
    pub fn register_source<F>(&mut self, name: impl Into<String>, opener: F) -> bool
    where
        F: Fn(&Spec, &Registry) -> Result<Box<dyn Source>> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.sources.insert(name.clone(), Box::new(opener)).is_some();
        log_registration(Namespace::Source, &name, replaced);
        replaced
    }

    /// Register a sink opener. Returns `true` when an earlier entry was replaced.
    pub fn register_sink<F>(&mut self, name: impl Into<String>, opener: F) -> bool
    where
        F: Fn(&Spec, &Registry) -> Result<Box<dyn Sink>> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.sinks.insert(name.clone(), Box::new(opener)).is_some();
        log_registration(Namespace::Sink, &name, replaced);
        replaced
    }

    /// Register a decoder stage. Returns `true` when an earlier entry was replaced.
    pub fn register_decoder<F>(&mut self, name: impl Into<String>, wrapper: F) -> bool
    where
        F: Fn(&Spec, Box<dyn Source>) -> StageResult<Box<dyn Source>> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.decoders.insert(name.clone(), Box::new(wrapper)).is_some();
        log_registration(Namespace::Decoder, &name, replaced);
        replaced
    }

    /// Register an encoder stage. Returns `true` when an earlier entry was replaced.
    pub fn register_encoder<F>(&mut self, name: impl Into<String>, wrapper: F) -> bool
    where
        F: Fn(&Spec, Box<dyn Sink>) -> StageResult<Box<dyn Sink>> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.encoders.insert(name.clone(), Box::new(wrapper)).is_some();
        log_registration(Namespace::Encoder, &name, replaced);
        replaced
    }

    pub fn resolve_source(&self, name: &str) -> Result<&SourceOpener> {
        self.sources
            .get(name)
            .ok_or_else(|| StreamError::unknown_kind(Namespace::Source, name))
    }

    pub fn resolve_sink(&self, name: &str) -> Result<&SinkOpener> {
        self.sinks
            .get(name)
            .ok_or_else(|| StreamError::unknown_kind(Namespace::Sink, name))
    }

    pub fn resolve_decoder(&self, name: &str) -> Result<&DecoderWrapper> {
        self.decoders
            .get(name)
            .ok_or_else(|| StreamError::unknown_kind(Namespace::Decoder, name))
    }

    pub fn resolve_encoder(&self, name: &str) -> Result<&EncoderWrapper> {
        self.encoders
            .get(name)
            .ok_or_else(|| StreamError::unknown_kind(Namespace::Encoder, name))
    }

    /// Resolve `spec`'s kind and open the source
    pub fn open_source(&self, spec: &Spec) -> Result<Box<dyn Source>> {
        let kind = spec.kind()?;
        let opener = self.resolve_source(kind)?;
        debug!("opening source '{kind}'");
        opener(spec, self)
    }

    /// Resolve `spec`'s kind and open the sink
    pub fn open_sink(&self, spec: &Spec) -> Result<Box<dyn Sink>> {
        let kind = spec.kind()?;
        let opener = self.resolve_sink(kind)?;
        debug!("opening sink '{kind}'");
        opener(spec, self)
    }

    /// Resolve `spec`'s kind and wrap `inner` in the decoder stage
    pub fn wrap_decoder(&self, spec: &Spec, inner: Box<dyn Source>) -> StageResult<Box<dyn Source>> {
        let wrapper = match spec.kind().and_then(|kind| self.resolve_decoder(kind)) {
            Ok(wrapper) => wrapper,
            Err(err) => return Err(StageFailure::new(err, inner)),
        };
        debug!("wrapping decoder '{}'", spec.kind().unwrap_or_default());
        wrapper(spec, inner)
    }

    /// Resolve `spec`'s kind and wrap `inner` in the encoder stage
    pub fn wrap_encoder(&self, spec: &Spec, inner: Box<dyn Sink>) -> StageResult<Box<dyn Sink>> {
        let wrapper = match spec.kind().and_then(|kind| self.resolve_encoder(kind)) {
            Ok(wrapper) => wrapper,
            Err(err) => return Err(StageFailure::new(err, inner)),
        };
        debug!("wrapping encoder '{}'", spec.kind().unwrap_or_default());
        wrapper(spec, inner)
    }

    /// Open every child source in order. On failure the children opened so
    /// far are closed in reverse order and their close errors are attached.
    pub fn open_sources(&self, specs: &[Spec]) -> Result<Vec<Box<dyn Source>>> {
        let mut opened: Vec<Box<dyn Source>> = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.open_source(spec) {
                Ok(source) => opened.push(source),
                Err(err) => {
                    let mut closes = AggregateError::new();
                    for mut source in opened.into_iter().rev() {
                        closes.record(source.close());
                    }
                    return Err(closes.with_cause(err));
                }
            }
        }
        Ok(opened)
    }

    /// Open every child sink in order, unwinding like [`Registry::open_sources`]
    pub fn open_sinks(&self, specs: &[Spec]) -> Result<Vec<Box<dyn Sink>>> {
        let mut opened: Vec<Box<dyn Sink>> = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.open_sink(spec) {
                Ok(sink) => opened.push(sink),
                Err(err) => {
                    let mut closes = AggregateError::new();
                    for mut sink in opened.into_iter().rev() {
                        closes.record(sink.close());
                    }
                    return Err(closes.with_cause(err));
                }
            }
        }
        Ok(opened)
    }

    /// Check if a kind is registered in a namespace
    pub fn contains(&self, namespace: Namespace, name: &str) -> bool {
        match namespace {
            Namespace::Source => self.sources.contains_key(name),
            Namespace::Sink => self.sinks.contains_key(name),
            Namespace::Decoder => self.decoders.contains_key(name),
            Namespace::Encoder => self.encoders.contains_key(name),
        }
    }

    /// Registered names of a namespace, in registration order
    pub fn names(&self, namespace: Namespace) -> Vec<&str> {
        match namespace {
            Namespace::Source => self.sources.keys().map(String::as_str).collect(),
            Namespace::Sink => self.sinks.keys().map(String::as_str).collect(),
            Namespace::Decoder => self.decoders.keys().map(String::as_str).collect(),
            Namespace::Encoder => self.encoders.keys().map(String::as_str).collect(),
        }
    }

    /// Get the number of registered constructors across all namespaces
    pub fn len(&self) -> usize {
        self.sources.len() + self.sinks.len() + self.decoders.len() + self.encoders.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn log_registration(namespace: Namespace, name: &str, replaced: bool) {
    if replaced {
        warn!("{namespace} kind '{name}' registered twice, replacing earlier entry");
    } else {
        debug!("registered {namespace} kind '{name}'");
    }
}
