/// Context module for core-full: loading pipeline documents
pub mod config;

pub use config::{load_pipeline_spec, read_pipeline_spec};
