// Pipeline stages and registration for core-full

pub mod flate;
pub mod lzw;
pub mod register;
pub mod snappy;

// Re-export commonly used types from core
pub use streamcast_core::pipeline::{Pipeline, PipelineBuilder, PipelineSpec, Registry, Spec};

pub use flate::{FlateSink, FlateSource, Format};
pub use lzw::{LzwSink, LzwSource};
pub use snappy::{SnappySink, SnappySource};
pub use register::{register_all, register_stages};
