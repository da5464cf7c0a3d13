// Shared instrumented endpoints for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use streamcast_core::pipeline::{StageFailure, register_builtin};
use streamcast_core::{Registry, Result, Sink, Source, StreamError};

/// Route library logs to the test output; `RUST_LOG` selects the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ordered event log shared between a test and the endpoints it builds
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }
}

/// Byte buffer observable after its sink has been moved into a pipeline
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

/// Named shared buffers, created on first use
#[derive(Clone, Default)]
pub struct Buffers(Arc<Mutex<HashMap<String, SharedBuffer>>>);

impl Buffers {
    pub fn get(&self, name: &str) -> SharedBuffer {
        self.0
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

pub struct MemorySource {
    name: String,
    data: Cursor<Vec<u8>>,
    journal: Journal,
    fail_close: bool,
}

impl MemorySource {
    pub fn new(name: &str, data: &[u8], journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            data: Cursor::new(data.to_vec()),
            journal: journal.clone(),
            fail_close: false,
        }
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Source for MemorySource {
    fn close(&mut self) -> Result<()> {
        self.journal.log(format!("close {}", self.name));
        if self.fail_close {
            return Err(io::Error::other(format!("{} close failed", self.name)).into());
        }
        Ok(())
    }
}

pub struct MemorySink {
    name: String,
    buffer: SharedBuffer,
    journal: Journal,
    accept: Option<usize>,
    fail_write: bool,
    fail_close: bool,
}

impl MemorySink {
    pub fn new(name: &str, buffer: &SharedBuffer, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            buffer: buffer.clone(),
            journal: journal.clone(),
            accept: None,
            fail_write: false,
            fail_close: false,
        }
    }

    /// Accept at most `limit` bytes per write
    pub fn accepting(mut self, limit: usize) -> Self {
        self.accept = Some(limit);
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_write {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("{} write failed", self.name),
            ));
        }
        let n = self.accept.map_or(buf.len(), |limit| limit.min(buf.len()));
        self.buffer.0.lock().unwrap().extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for MemorySink {
    fn close(&mut self) -> Result<()> {
        self.journal.log(format!("close {}", self.name));
        if self.fail_close {
            return Err(io::Error::other(format!("{} close failed", self.name)).into());
        }
        Ok(())
    }
}

/// Identity decoder stage that journals its reads and close
pub struct TracedSource {
    name: String,
    inner: Box<dyn Source>,
    journal: Journal,
}

impl Read for TracedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.journal.log(format!("read {}", self.name));
        self.inner.read(buf)
    }
}

impl Source for TracedSource {
    fn close(&mut self) -> Result<()> {
        self.journal.log(format!("close {}", self.name));
        self.inner.close()
    }
}

/// Encoder stage that XORs every byte with `key`; applying it twice is the identity
pub struct XorSink {
    name: String,
    key: u8,
    inner: Box<dyn Sink>,
    journal: Journal,
}

impl Write for XorSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mapped: Vec<u8> = buf.iter().map(|b| b ^ self.key).collect();
        self.inner.write(&mapped)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Sink for XorSink {
    fn close(&mut self) -> Result<()> {
        self.journal.log(format!("close {}", self.name));
        self.inner.close()
    }
}

pub fn xor(data: &[u8], key: u8) -> Vec<u8> {
    data.iter().map(|b| b ^ key).collect()
}

/// Registry with the built-in combinators plus instrumented test kinds:
///
/// - source `memory` { name, data, fail_close }
/// - sink `memory` { name, fail_write, fail_close, accept }
/// - decoder `traced` { name } / `broken`
/// - encoder `xor` { name, key } / `broken`
pub fn test_registry(journal: &Journal, buffers: &Buffers) -> Registry {
    let mut registry = Registry::new();
    register_builtin(&mut registry);

    let j = journal.clone();
    registry.register_source("memory", move |spec, _| {
        let name: String = spec.require("name")?;
        let data: String = spec.field("data")?.unwrap_or_default();
        j.log(format!("open {name}"));
        let mut source = MemorySource::new(&name, data.as_bytes(), &j);
        if spec.field::<bool>("fail_close")?.unwrap_or(false) {
            source = source.failing_close();
        }
        Ok(Box::new(source))
    });

    let j = journal.clone();
    let b = buffers.clone();
    registry.register_sink("memory", move |spec, _| {
        let name: String = spec.require("name")?;
        if spec.field::<bool>("fail_open")?.unwrap_or(false) {
            return Err(StreamError::construction(
                "memory",
                format!("{name} unavailable"),
            ));
        }
        j.log(format!("open {name}"));
        let mut sink = MemorySink::new(&name, &b.get(&name), &j);
        if spec.field::<bool>("fail_write")?.unwrap_or(false) {
            sink = sink.failing_writes();
        }
        if spec.field::<bool>("fail_close")?.unwrap_or(false) {
            sink = sink.failing_close();
        }
        if let Some(limit) = spec.field::<usize>("accept")? {
            sink = sink.accepting(limit);
        }
        Ok(Box::new(sink))
    });

    let j = journal.clone();
    registry.register_decoder("traced", move |spec, inner| {
        let name: String = match spec.require("name") {
            Ok(name) => name,
            Err(err) => return Err(StageFailure::new(err, inner)),
        };
        j.log(format!("wrap {name}"));
        Ok(Box::new(TracedSource {
            name,
            inner,
            journal: j.clone(),
        }))
    });

    registry.register_decoder("broken", |_, inner| {
        Err(StageFailure::new(
            StreamError::construction("broken", "decoder refused"),
            inner,
        ))
    });

    let j = journal.clone();
    registry.register_encoder("xor", move |spec, inner| {
        let parsed = spec
            .require::<String>("name")
            .and_then(|name| Ok((name, spec.require::<u8>("key")?)));
        let (name, key) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return Err(StageFailure::new(err, inner)),
        };
        j.log(format!("wrap {name}"));
        Ok(Box::new(XorSink {
            name,
            key,
            inner,
            journal: j.clone(),
        }))
    });

    registry.register_encoder("broken", |_, inner| {
        Err(StageFailure::new(
            StreamError::construction("broken", "encoder refused"),
            inner,
        ))
    });

    registry
}
