// Sequential concatenation of sources ("cat")
use super::Source;
use crate::error::{AggregateError, Result, StreamError};
use std::io::{self, Read};
use tracing::{debug, trace};

/// Presents several owned sources as one, read in declaration order.
///
/// A single `read` keeps filling the caller's buffer across child
/// boundaries; end of data is reported only after the last child ends.
/// The cursor only moves forward.
///
/// When a child fails after some bytes were already placed in the buffer,
/// those bytes are returned and the error is reported by the next `read`,
/// before any further child is touched.
pub struct SequentialSource {
    children: Vec<Box<dyn Source>>,
    cursor: usize,
    pending: Option<io::Error>,
}

impl SequentialSource {
    pub fn new(children: Vec<Box<dyn Source>>) -> Result<Self> {
        if children.is_empty() {
            return Err(StreamError::config("sequential source needs at least one child"));
        }
        Ok(Self {
            children,
            cursor: 0,
            pending: None,
        })
    }

    /// Number of owned children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of the child currently being read
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every child has reported end of data
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.children.len()
    }
}

impl Read for SequentialSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let mut filled = 0;
        while filled < buf.len() && self.cursor < self.children.len() {
            match self.children[self.cursor].read(&mut buf[filled..]) {
                Ok(0) => {
                    trace!("child {} of {} exhausted", self.cursor, self.children.len());
                    self.cursor += 1;
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if filled == 0 => return Err(err),
                Err(err) => {
                    self.pending = Some(err);
                    break;
                }
            }
        }
        Ok(filled)
    }
}

impl Source for SequentialSource {
    fn close(&mut self) -> Result<()> {
        let mut errors = AggregateError::new();
        for child in &mut self.children {
            errors.record(child.close());
        }
        debug!(
            "closed {} concatenated sources ({} errors)",
            self.children.len(),
            errors.len()
        );
        errors.into_result()
    }
}
