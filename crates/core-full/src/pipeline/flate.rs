// Deflate, zlib and gzip stages backed by flate2
use flate2::{read, write, Compression};
use serde::Deserialize;
use std::io::{self, Read, Write};
use streamcast_core::error::AggregateError;
use streamcast_core::pipeline::{Spec, StageFailure, StageResult};
use streamcast_core::{Result, Sink, Source, StreamError};
use tracing::debug;

pub const DEFLATE: &str = "deflate";
/// Alias of `deflate`
pub const FLATE: &str = "flate";
pub const ZLIB: &str = "zlib";
pub const GZIP: &str = "gzip";

/// Container format around the deflate stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Deflate,
    Zlib,
    Gzip,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Deflate, Format::Zlib, Format::Gzip];

    pub fn kind(&self) -> &'static str {
        match self {
            Format::Deflate => DEFLATE,
            Format::Zlib => ZLIB,
            Format::Gzip => GZIP,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EncoderConfig {
    #[serde(default)]
    level: Option<u32>,
}

/// Compression level from the encoder spec, flate2's default when unset
fn compression(spec: &Spec) -> Result<Compression> {
    let config: EncoderConfig = spec.decode()?;
    match config.level {
        None => Ok(Compression::default()),
        Some(level) if level <= 9 => Ok(Compression::new(level)),
        Some(level) => Err(StreamError::config(format!(
            "compression level {level} is out of range 0-9"
        ))),
    }
}

enum Decoder {
    Deflate(read::DeflateDecoder<Box<dyn Source>>),
    Zlib(read::ZlibDecoder<Box<dyn Source>>),
    // Concatenated gzip members decode as one stream
    Gzip(read::MultiGzDecoder<Box<dyn Source>>),
}

/// Decompressing source stage
pub struct FlateSource {
    decoder: Decoder,
}

impl FlateSource {
    pub fn new(format: Format, inner: Box<dyn Source>) -> Self {
        let decoder = match format {
            Format::Deflate => Decoder::Deflate(read::DeflateDecoder::new(inner)),
            Format::Zlib => Decoder::Zlib(read::ZlibDecoder::new(inner)),
            Format::Gzip => Decoder::Gzip(read::MultiGzDecoder::new(inner)),
        };
        Self { decoder }
    }

    pub fn format(&self) -> Format {
        match self.decoder {
            Decoder::Deflate(_) => Format::Deflate,
            Decoder::Zlib(_) => Format::Zlib,
            Decoder::Gzip(_) => Format::Gzip,
        }
    }

    fn inner_mut(&mut self) -> &mut Box<dyn Source> {
        match &mut self.decoder {
            Decoder::Deflate(decoder) => decoder.get_mut(),
            Decoder::Zlib(decoder) => decoder.get_mut(),
            Decoder::Gzip(decoder) => decoder.get_mut(),
        }
    }
}

impl Read for FlateSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.decoder {
            Decoder::Deflate(decoder) => decoder.read(buf),
            Decoder::Zlib(decoder) => decoder.read(buf),
            Decoder::Gzip(decoder) => decoder.read(buf),
        }
    }
}

impl Source for FlateSource {
    fn close(&mut self) -> Result<()> {
        debug!("Closing {} decoder", self.format().kind());
        self.inner_mut().close()
    }
}

enum Encoder {
    Deflate(write::DeflateEncoder<Box<dyn Sink>>),
    Zlib(write::ZlibEncoder<Box<dyn Sink>>),
    Gzip(write::GzEncoder<Box<dyn Sink>>),
}

/// Compressing sink stage.
///
/// Closing writes the stream trailer before closing the inner sink. The inner
/// sink is closed even when the trailer cannot be written.
pub struct FlateSink {
    encoder: Encoder,
    finished: bool,
}

impl FlateSink {
    pub fn new(format: Format, level: Compression, inner: Box<dyn Sink>) -> Self {
        let encoder = match format {
            Format::Deflate => Encoder::Deflate(write::DeflateEncoder::new(inner, level)),
            Format::Zlib => Encoder::Zlib(write::ZlibEncoder::new(inner, level)),
            Format::Gzip => Encoder::Gzip(write::GzEncoder::new(inner, level)),
        };
        Self {
            encoder,
            finished: false,
        }
    }

    pub fn format(&self) -> Format {
        match self.encoder {
            Encoder::Deflate(_) => Format::Deflate,
            Encoder::Zlib(_) => Format::Zlib,
            Encoder::Gzip(_) => Format::Gzip,
        }
    }

    /// Write the remaining compressed data and trailer
    fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        match &mut self.encoder {
            Encoder::Deflate(encoder) => encoder.try_finish()?,
            Encoder::Zlib(encoder) => encoder.try_finish()?,
            Encoder::Gzip(encoder) => encoder.try_finish()?,
        }
        self.finished = true;
        Ok(())
    }

    fn inner_mut(&mut self) -> &mut Box<dyn Sink> {
        match &mut self.encoder {
            Encoder::Deflate(encoder) => encoder.get_mut(),
            Encoder::Zlib(encoder) => encoder.get_mut(),
            Encoder::Gzip(encoder) => encoder.get_mut(),
        }
    }
}

impl Write for FlateSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("{} encoder already finished", self.format().kind()),
            ));
        }
        match &mut self.encoder {
            Encoder::Deflate(encoder) => encoder.write(buf),
            Encoder::Zlib(encoder) => encoder.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.encoder {
            Encoder::Deflate(encoder) => encoder.flush(),
            Encoder::Zlib(encoder) => encoder.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl Sink for FlateSink {
    fn close(&mut self) -> Result<()> {
        debug!("Closing {} encoder", self.format().kind());
        let mut errors = AggregateError::new();
        errors.record(self.finish());
        errors.record(self.inner_mut().close());
        errors.into_result()
    }
}

/// Decoder wrapper for `format`
pub fn wrap_decoder(format: Format, inner: Box<dyn Source>) -> StageResult<Box<dyn Source>> {
    Ok(Box::new(FlateSource::new(format, inner)))
}

/// Encoder wrapper for `format`; an invalid `level` hands `inner` back unconsumed
pub fn wrap_encoder(
    format: Format,
    spec: &Spec,
    inner: Box<dyn Sink>,
) -> StageResult<Box<dyn Sink>> {
    match compression(spec) {
        Ok(level) => Ok(Box::new(FlateSink::new(format, level, inner))),
        Err(err) => Err(StageFailure::new(err, inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert_eq!(compression(&Spec::new(GZIP)).unwrap(), Compression::default());
        assert_eq!(
            compression(&Spec::new(GZIP).with("level", 9)).unwrap(),
            Compression::best()
        );
        assert!(matches!(
            compression(&Spec::new(GZIP).with("level", 10)),
            Err(StreamError::Config(_))
        ));
    }

    #[test]
    fn test_close_finishes_stream_once() {
        let mut sink = FlateSink::new(Format::Zlib, Compression::fast(), Box::new(Vec::new()));
        sink.write_all(b"abc").unwrap();
        sink.close().unwrap();

        assert!(sink.write(b"more").is_err());
        sink.close().unwrap();
    }

    #[test]
    fn test_format_kinds() {
        let kinds: Vec<&str> = Format::ALL.iter().map(Format::kind).collect();
        assert_eq!(kinds, [DEFLATE, ZLIB, GZIP]);
    }
}
