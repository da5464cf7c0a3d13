pub mod api;
pub mod context;
pub mod error;
pub mod io;
pub mod pipeline;

// Re-export commonly used types
pub use api::{default_registry, run, run_file};
pub use context::{load_pipeline_spec, read_pipeline_spec};
pub use error::EndpointError;
pub use pipeline::register_all;
