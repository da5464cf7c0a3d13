// Pipeline module - composition logic only
// Concrete endpoints are registered by core-full

pub mod builder;
pub mod core;
pub mod register;
pub mod registry;
pub mod spec;

// Re-export core types
pub use builder::*;
pub use self::core::*;
pub use register::*;
pub use registry::*;
pub use spec::*;
