// Pipeline - owns the resolved endpoint chains and drives the copy

use crate::config::constants::DEFAULT_BUFFER_SIZE;
use crate::error::{AggregateError, Result, StreamError};
use crate::stream::{Sink, Source};
use std::io::{self, Read, Write};
use tracing::{debug, info, warn};

/// A fully resolved source → sink chain.
///
/// The reader is the outermost decoder stage (or the raw source) and owns
/// everything beneath it; the writer likewise for encoders. Each stage closes
/// itself before its inner endpoint, so closing the reader then the writer
/// walks decoders outermost to innermost, the raw source, encoders outermost
/// to innermost, and finally the raw sink.
pub struct Pipeline {
    reader: Box<dyn Source>,
    writer: Box<dyn Sink>,
    decoders: Vec<String>,
    encoders: Vec<String>,
    buffer_size: usize,
    closed: bool,
}

impl Pipeline {
    pub fn new(reader: Box<dyn Source>, writer: Box<dyn Sink>) -> Self {
        Self {
            reader,
            writer,
            decoders: Vec::new(),
            encoders: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            closed: false,
        }
    }

    /// Record the kinds of the applied stages, innermost first
    pub fn with_stages(mut self, decoders: Vec<String>, encoders: Vec<String>) -> Self {
        self.decoders = decoders;
        self.encoders = encoders;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// The active reader: last decoder stage, or the raw source
    pub fn reader(&mut self) -> &mut dyn Source {
        self.reader.as_mut()
    }

    /// The active writer: last encoder stage, or the raw sink
    pub fn writer(&mut self) -> &mut dyn Sink {
        self.writer.as_mut()
    }

    pub fn decoder_kinds(&self) -> &[String] {
        &self.decoders
    }

    pub fn encoder_kinds(&self) -> &[String] {
        &self.encoders
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drain the reader into the writer until end of data.
    ///
    /// Returns the total byte count. On failure the error carries the number
    /// of bytes fully handed to the writer before it; nothing is retried or
    /// rolled back.
    pub fn copy(&mut self) -> Result<u64> {
        if self.closed {
            return Err(StreamError::config("pipeline is closed"));
        }

        let mut buf = vec![0u8; self.buffer_size];
        let mut transferred: u64 = 0;
        loop {
            let n = match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(copy_failure(transferred, source)),
            };
            if let Err(source) = self.writer.write_all(&buf[..n]) {
                return Err(copy_failure(transferred, source));
            }
            transferred += n as u64;
        }

        if let Err(source) = self.writer.flush() {
            return Err(copy_failure(transferred, source));
        }
        info!("copied {transferred} bytes");
        Ok(transferred)
    }

    /// Close every endpoint. Only the first call does anything; later calls return `Ok(())`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut errors = AggregateError::new();
        errors.record(self.reader.close());
        errors.record(self.writer.close());

        if errors.is_empty() {
            debug!("pipeline closed");
        } else {
            warn!("pipeline closed with {} error(s): {errors}", errors.len());
        }
        errors.into_result()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if !self.closed {
            warn!("pipeline dropped without close, closing now");
            if let Err(err) = self.close() {
                warn!("close on drop failed: {err}");
            }
        }
    }
}

fn copy_failure(transferred: u64, source: io::Error) -> StreamError {
    warn!("copy failed after {transferred} bytes: {source}");
    StreamError::Copy {
        transferred,
        source,
    }
}
