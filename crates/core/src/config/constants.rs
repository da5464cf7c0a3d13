//! Constants for streamcast

/// Copy buffer size used when a pipeline spec does not set one
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Upper bound accepted for a configured copy buffer
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Read size used while receiving a token preamble
pub const HANDSHAKE_READ_SIZE: usize = 4 * 1024;

/// Field holding the kind discriminator of a spec node
pub const KIND_FIELD: &str = "kind";

/// Field holding the child list of a composite spec node
pub const CHILD_FIELD: &str = "child";

/// Kind names of the built-in combinators
pub const SEQUENTIAL_CONCAT: &str = "sequential-concat";
pub const FAN_OUT: &str = "fan-out";

/// Short aliases accepted for the built-in combinators
pub const CAT: &str = "cat";
pub const TEE: &str = "tee";
