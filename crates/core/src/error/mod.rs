/// Centralized error handling for streamcast
pub mod aggregate;
pub mod stream;

pub use aggregate::AggregateError;
pub use stream::{Namespace, Result, StreamError};
