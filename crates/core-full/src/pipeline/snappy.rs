// Snappy stages backed by snap, using the framed stream format
use snap::{read::FrameDecoder, write::FrameEncoder};
use std::io::{self, Read, Write};
use streamcast_core::error::AggregateError;
use streamcast_core::pipeline::StageResult;
use streamcast_core::{Result, Sink, Source};
use tracing::debug;

pub const SNAPPY: &str = "snappy";

/// Decompressing source stage
pub struct SnappySource {
    decoder: FrameDecoder<Box<dyn Source>>,
}

impl SnappySource {
    pub fn new(inner: Box<dyn Source>) -> Self {
        Self {
            decoder: FrameDecoder::new(inner),
        }
    }
}

impl Read for SnappySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read(buf)
    }
}

impl Source for SnappySource {
    fn close(&mut self) -> Result<()> {
        debug!("Closing snappy decoder");
        self.decoder.get_mut().close()
    }
}

/// Compressing sink stage. Writes are buffered into frames; closing emits the
/// last frame before closing the inner sink.
pub struct SnappySink {
    encoder: FrameEncoder<Box<dyn Sink>>,
}

impl SnappySink {
    pub fn new(inner: Box<dyn Sink>) -> Self {
        Self {
            encoder: FrameEncoder::new(inner),
        }
    }
}

impl Write for SnappySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl Sink for SnappySink {
    fn close(&mut self) -> Result<()> {
        debug!("Closing snappy encoder");
        let mut errors = AggregateError::new();
        errors.record(self.encoder.flush());
        errors.record(self.encoder.get_mut().close());
        errors.into_result()
    }
}

pub fn wrap_decoder(inner: Box<dyn Source>) -> StageResult<Box<dyn Source>> {
    Ok(Box::new(SnappySource::new(inner)))
}

pub fn wrap_encoder(inner: Box<dyn Sink>) -> StageResult<Box<dyn Sink>> {
    Ok(Box::new(SnappySink::new(inner)))
}
