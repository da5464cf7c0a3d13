//! Token-authenticated byte channel.
//!
//! Both ends share a token. The writing side sends it verbatim before any
//! application bytes; the reading side consumes exactly that many bytes,
//! compares them, and only then releases data. There is no length prefix on
//! the wire: the token length is configuration.

use crate::config::constants::HANDSHAKE_READ_SIZE;
use crate::error::{AggregateError, Result, StreamError};
use crate::stream::{Sink, Source};
use std::io::{self, Read, Write};
use std::ops::Range;
use tracing::{debug, warn};

/// Handshake progress for one direction of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// `position` token bytes have been sent or received so far
    Pending { position: usize },
    Established,
    /// The peer presented a different token; no data will ever be released
    Rejected,
}

/// Wraps one connection so application bytes are preceded by a shared token.
///
/// Inbound and outbound handshakes progress independently, so the same
/// channel type serves as a source leaf, a sink leaf, or both. An empty
/// token makes the channel a transparent passthrough.
pub struct AuthenticatedChannel<C> {
    conn: C,
    token: Vec<u8>,
    inbound: Handshake,
    outbound: Handshake,
    buffer: Vec<u8>,
    filled: usize,
    // application bytes that arrived in the same read as the token tail
    retained: Range<usize>,
}

impl<C> AuthenticatedChannel<C> {
    pub fn new(conn: C, token: impl Into<Vec<u8>>) -> Self {
        let token = token.into();
        let initial = if token.is_empty() {
            Handshake::Established
        } else {
            Handshake::Pending { position: 0 }
        };
        let buffer = if token.is_empty() {
            Vec::new()
        } else {
            vec![0; token.len().max(HANDSHAKE_READ_SIZE)]
        };
        Self {
            conn,
            token,
            inbound: initial,
            outbound: initial,
            buffer,
            filled: 0,
            retained: 0..0,
        }
    }

    /// A channel without a token
    pub fn passthrough(conn: C) -> Self {
        Self::new(conn, Vec::new())
    }

    pub fn inbound(&self) -> Handshake {
        self.inbound
    }

    pub fn outbound(&self) -> Handshake {
        self.outbound
    }

    pub fn token_len(&self) -> usize {
        self.token.len()
    }

    pub fn get_ref(&self) -> &C {
        &self.conn
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

fn rejected() -> io::Error {
    StreamError::authentication("authorized token doesn't match").into()
}

impl<C: Read> AuthenticatedChannel<C> {
    /// Drive the inbound handshake to completion
    fn accept(&mut self) -> io::Result<()> {
        let want = self.token.len();
        loop {
            match self.inbound {
                Handshake::Established => return Ok(()),
                Handshake::Rejected => return Err(rejected()),
                Handshake::Pending { position } if position < want => {
                    let n = self.conn.read(&mut self.buffer[self.filled..])?;
                    if n == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("connection closed after {position}/{want} token bytes"),
                        ));
                    }
                    self.filled += n;
                    self.inbound = Handshake::Pending {
                        position: self.filled.min(want),
                    };
                }
                Handshake::Pending { .. } => {
                    if self.buffer[..want] != self.token[..] {
                        warn!("inbound token mismatch, rejecting channel");
                        self.inbound = Handshake::Rejected;
                        self.buffer = Vec::new();
                        self.filled = 0;
                        return Err(rejected());
                    }
                    self.retained = want..self.filled;
                    self.inbound = Handshake::Established;
                    debug!(
                        "inbound handshake established, {} bytes retained",
                        self.retained.len()
                    );
                }
            }
        }
    }
}

impl<C: Write> AuthenticatedChannel<C> {
    /// Send whatever part of the token has not been sent yet
    fn present(&mut self) -> io::Result<()> {
        while let Handshake::Pending { position } = self.outbound {
            let n = self.conn.write(&self.token[position..])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("failed to send token after {position}/{} bytes", self.token.len()),
                ));
            }
            let position = position + n;
            self.outbound = if position >= self.token.len() {
                debug!("outbound handshake established");
                Handshake::Established
            } else {
                Handshake::Pending { position }
            };
        }
        Ok(())
    }
}

impl<C: Read> Read for AuthenticatedChannel<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.accept()?;

        if !self.retained.is_empty() {
            let n = buf.len().min(self.retained.len());
            let start = self.retained.start;
            buf[..n].copy_from_slice(&self.buffer[start..start + n]);
            self.retained.start += n;
            if self.retained.is_empty() {
                self.buffer = Vec::new();
            }
            return Ok(n);
        }

        self.conn.read(buf)
    }
}

impl<C: Write> Write for AuthenticatedChannel<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.present()?;
        self.conn.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.present()?;
        self.conn.flush()
    }
}

impl<C: Source> Source for AuthenticatedChannel<C> {
    fn close(&mut self) -> Result<()> {
        Source::close(&mut self.conn)
    }
}

// A cleanly closed writer has sent the token, even without payload
impl<C: Sink> Sink for AuthenticatedChannel<C> {
    fn close(&mut self) -> Result<()> {
        let presented = self.present();
        let mut errors = AggregateError::new();
        errors.record(presented);
        errors.record(Sink::close(&mut self.conn));
        errors.into_result()
    }
}
