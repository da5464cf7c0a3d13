// Failures raised while opening operating-system endpoints
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why an endpoint could not be opened.
///
/// Openers wrap these in `StreamError::Construction` so the kind that failed
/// is reported alongside the cause.
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("cannot open '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("no peer accepted on {addr}: {source}")]
    Accept {
        addr: String,
        #[source]
        source: io::Error,
    },
}

impl EndpointError {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Underlying I/O failure
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::File { source, .. }
            | Self::Connect { source, .. }
            | Self::Listen { source, .. }
            | Self::Accept { source, .. } => source,
        }
    }
}
