// Stream endpoints and combinators
// Source = readable + closable, Sink = writable + closable

pub mod cat;
pub mod tee;

pub use cat::SequentialSource;
pub use tee::FanOutSink;

use crate::error::Result;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::net::{Shutdown, TcpStream};

/// Readable, closable byte-producing endpoint.
///
/// End of data is `Ok(0)` from `read` on a non-empty buffer.
pub trait Source: Read + Send {
    /// Release the endpoint and everything it owns
    fn close(&mut self) -> Result<()>;
}

/// Writable, closable byte-consuming endpoint
pub trait Sink: Write + Send {
    /// Flush and release the endpoint and everything it owns
    fn close(&mut self) -> Result<()>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

// In-memory endpoints

impl<T: AsRef<[u8]> + Send> Source for Cursor<T> {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Source for &'static [u8] {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Source for io::Empty {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for io::Sink {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// Operating system endpoints

impl Source for File {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for File {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        Ok(())
    }
}

impl Source for io::Stdin {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for io::Stdout {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        Ok(())
    }
}

impl Source for TcpStream {
    fn close(&mut self) -> Result<()> {
        shutdown(self, Shutdown::Read)
    }
}

impl Sink for TcpStream {
    fn close(&mut self) -> Result<()> {
        self.flush()?;
        shutdown(self, Shutdown::Write)
    }
}

// A peer that already hung up is not a close failure.
fn shutdown(stream: &TcpStream, how: Shutdown) -> Result<()> {
    match stream.shutdown(how) {
        Err(err) if err.kind() != io::ErrorKind::NotConnected => Err(err.into()),
        _ => Ok(()),
    }
}
