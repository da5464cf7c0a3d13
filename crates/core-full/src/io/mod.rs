// Operating-system endpoints: files, standard streams and tcp connections

pub mod local;
pub mod stdio;
pub mod tcp;

pub use local::{open_local_sink, open_local_source};
pub use stdio::{open_stdin, open_stdout};
pub use tcp::{open_tcp_sink, open_tcp_source, TcpConfig, TcpRole};

use streamcast_core::pipeline::Registry;

pub const LOCAL: &str = "local";
pub const STDIN: &str = "stdin";
pub const STDOUT: &str = "stdout";
pub const TCP: &str = "tcp";

/// Register every endpoint kind in this module
pub fn register_endpoints(registry: &mut Registry) {
    registry.register_source(LOCAL, open_local_source);
    registry.register_sink(LOCAL, open_local_sink);

    registry.register_source(STDIN, open_stdin);
    registry.register_sink(STDOUT, open_stdout);

    registry.register_source(TCP, open_tcp_source);
    registry.register_sink(TCP, open_tcp_sink);
}
