// Network channel wrappers

pub mod channel;

pub use channel::{AuthenticatedChannel, Handshake};
