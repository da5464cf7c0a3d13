// streamcast core - pipeline composition only
// Concrete endpoints and codec stages live in core-full

pub mod config;
pub mod error;
pub mod net;
pub mod pipeline;
pub mod stream;

// Re-export core types
pub use error::{AggregateError, Namespace, Result, StreamError};
pub use net::AuthenticatedChannel;
pub use pipeline::{Pipeline, PipelineBuilder, PipelineSpec, Registry, Spec};
pub use stream::{FanOutSink, SequentialSource, Sink, Source};
