// Fan-out duplication to sinks ("tee")
use super::Sink;
use crate::error::{AggregateError, Result, StreamError};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Replicates every write to all owned sinks.
///
/// Every child is offered every write even when an earlier child failed.
/// A write succeeds only when all children accept the whole buffer. Otherwise
/// the returned `io::Error` carries [`StreamError::FanOut`], holding both the
/// per-child failures (in child order) and `accepted`, the smallest count any
/// child took. Callers must inspect the error, not only the count: a
/// conforming child may already hold bytes that a lagging sibling does not.
pub struct FanOutSink {
    children: Vec<Box<dyn Sink>>,
}

impl FanOutSink {
    pub fn new(children: Vec<Box<dyn Sink>>) -> Result<Self> {
        if children.is_empty() {
            return Err(StreamError::config("fan-out sink needs at least one child"));
        }
        Ok(Self { children })
    }

    /// Number of owned children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Write for FanOutSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let requested = buf.len();
        let mut accepted = requested;
        let mut errors = AggregateError::new();

        for (index, child) in self.children.iter_mut().enumerate() {
            let result = loop {
                match child.write(buf) {
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    other => break other,
                }
            };
            match result {
                Ok(n) if n == requested => {}
                Ok(n) => {
                    warn!("fan-out child {index} accepted {n}/{requested} bytes");
                    accepted = accepted.min(n);
                    errors.push(StreamError::PartialWrite {
                        accepted: n,
                        requested,
                    });
                }
                Err(err) => {
                    warn!("fan-out child {index} failed: {err}");
                    accepted = 0;
                    errors.push(err);
                }
            }
        }

        if errors.is_empty() {
            Ok(requested)
        } else {
            Err(StreamError::FanOut {
                accepted,
                requested,
                errors,
            }
            .into())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut errors = AggregateError::new();
        for child in &mut self.children {
            errors.record(child.flush());
        }
        errors.into_result().map_err(io::Error::from)
    }
}

impl Sink for FanOutSink {
    fn close(&mut self) -> Result<()> {
        let mut errors = AggregateError::new();
        for child in &mut self.children {
            errors.record(child.close());
        }
        debug!(
            "closed {} fan-out sinks ({} errors)",
            self.children.len(),
            errors.len()
        );
        errors.into_result()
    }
}
