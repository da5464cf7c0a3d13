// LZW stages backed by weezl: LSB bit order, 8-bit literals
use std::io::{self, BufRead, BufReader, Write};
use streamcast_core::error::AggregateError;
use streamcast_core::pipeline::StageResult;
use streamcast_core::{Result, Sink, Source};
use tracing::debug;
use weezl::{decode, encode, BitOrder, LzwError, LzwStatus};

pub const LZW: &str = "lzw";

const LITERAL_WIDTH: u8 = 8;
const SCRATCH_SIZE: usize = 4096;

fn invalid(err: LzwError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("lzw: {err}"))
}

/// Decompressing source stage
pub struct LzwSource {
    decoder: decode::Decoder,
    inner: BufReader<Box<dyn Source>>,
    done: bool,
}

impl LzwSource {
    pub fn new(inner: Box<dyn Source>) -> Self {
        Self {
            decoder: decode::Decoder::new(BitOrder::Lsb, LITERAL_WIDTH),
            inner: BufReader::new(inner),
            done: false,
        }
    }
}

impl io::Read for LzwSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.done {
            let input = self.inner.fill_buf()?;
            let at_end = input.is_empty();
            let result = self.decoder.decode_bytes(input, buf);
            self.inner.consume(result.consumed_in);

            match result.status.map_err(invalid)? {
                LzwStatus::Done => self.done = true,
                LzwStatus::Ok | LzwStatus::NoProgress => {
                    let stalled = result.consumed_in == 0 && result.consumed_out == 0;
                    if stalled && at_end {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "lzw stream ended without an end code",
                        ));
                    }
                    if stalled {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "lzw decoder made no progress",
                        ));
                    }
                }
            }
            if result.consumed_out > 0 {
                return Ok(result.consumed_out);
            }
        }
        Ok(0)
    }
}

impl Source for LzwSource {
    fn close(&mut self) -> Result<()> {
        debug!("Closing lzw decoder");
        self.inner.get_mut().close()
    }
}

/// Compressing sink stage. Closing emits the end code, then closes the inner sink.
pub struct LzwSink {
    encoder: encode::Encoder,
    inner: Box<dyn Sink>,
    scratch: Vec<u8>,
    finished: bool,
}

impl LzwSink {
    pub fn new(inner: Box<dyn Sink>) -> Self {
        Self {
            encoder: encode::Encoder::new(BitOrder::Lsb, LITERAL_WIDTH),
            inner,
            scratch: vec![0; SCRATCH_SIZE],
            finished: false,
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.encoder.finish();
        loop {
            let result = self.encoder.encode_bytes(&[], &mut self.scratch);
            self.inner.write_all(&self.scratch[..result.consumed_out])?;
            let status = result.status.map_err(invalid)?;
            if matches!(status, LzwStatus::Done) || result.consumed_out == 0 {
                break;
            }
        }
        self.finished = true;
        Ok(())
    }
}

impl Write for LzwSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "lzw encoder already finished",
            ));
        }
        let mut consumed = 0;
        while consumed < buf.len() {
            let result = self.encoder.encode_bytes(&buf[consumed..], &mut self.scratch);
            consumed += result.consumed_in;
            self.inner.write_all(&self.scratch[..result.consumed_out])?;
            result.status.map_err(invalid)?;
            if result.consumed_in == 0 && result.consumed_out == 0 {
                break;
            }
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Sink for LzwSink {
    fn close(&mut self) -> Result<()> {
        debug!("Closing lzw encoder");
        let mut errors = AggregateError::new();
        errors.record(self.finish());
        errors.record(self.inner.close());
        errors.into_result()
    }
}

pub fn wrap_decoder(inner: Box<dyn Source>) -> StageResult<Box<dyn Source>> {
    Ok(Box::new(LzwSource::new(inner)))
}

pub fn wrap_encoder(inner: Box<dyn Sink>) -> StageResult<Box<dyn Sink>> {
    Ok(Box::new(LzwSink::new(inner)))
}
