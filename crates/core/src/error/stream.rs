/// Unified error type for streamcast
use super::aggregate::AggregateError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Registry namespace a kind is resolved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Source,
    Sink,
    Decoder,
    Encoder,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Source => "source",
            Namespace::Sink => "sink",
            Namespace::Decoder => "decoder",
            Namespace::Encoder => "encoder",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StreamError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(io::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown {namespace} kind '{kind}'")]
    UnknownKind { namespace: Namespace, kind: String },

    // Opener or stage wrapper failures
    #[error("Failed to construct '{kind}': {source}")]
    Construction {
        kind: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // Token handshake
    #[error("Authentication failed: {0}")]
    Authentication(String),

    // Multi-child operations
    #[error("Partial write: {accepted}/{requested}")]
    PartialWrite { accepted: usize, requested: usize },

    #[error("Fan-out write accepted {accepted}/{requested} bytes: {errors}")]
    FanOut {
        accepted: usize,
        requested: usize,
        errors: AggregateError,
    },

    #[error("{0}")]
    Aggregate(AggregateError),

    // Copy loop
    #[error("Copy failed after {transferred} bytes: {source}")]
    Copy {
        transferred: u64,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using StreamError
pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    /// Create an invalid config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unknown kind error
    pub fn unknown_kind(namespace: Namespace, kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            namespace,
            kind: kind.into(),
        }
    }

    /// Create a construction error for `kind`
    pub fn construction(
        kind: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Construction {
            kind: kind.into(),
            source: source.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Whether this error, or any error it aggregates, is an authentication failure
    pub fn is_authentication(&self) -> bool {
        match self {
            Self::Authentication(_) => true,
            Self::Aggregate(errors) | Self::FanOut { errors, .. } => {
                errors.iter().any(StreamError::is_authentication)
            }
            Self::Copy { source, .. } => {
                Self::from_io_ref(source).is_some_and(StreamError::is_authentication)
            }
            _ => false,
        }
    }

    /// Recover a `StreamError` carried inside an `io::Error`, if any
    pub fn from_io_ref(err: &io::Error) -> Option<&StreamError> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<StreamError>())
    }
}

impl From<AggregateError> for StreamError {
    fn from(errors: AggregateError) -> Self {
        Self::Aggregate(errors)
    }
}

// An io::Error that carries a StreamError payload is unwrapped so that
// errors crossing the Read/Write boundary are never double-wrapped.
impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        if StreamError::from_io_ref(&err).is_none() {
            return Self::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<StreamError>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Self::Io(io::Error::new(kind, other)),
            None => Self::Io(io::Error::from(kind)),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(inner) => inner,
            StreamError::Authentication(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            StreamError::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            StreamError::PartialWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, err),
            other => io::Error::other(other),
        }
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
