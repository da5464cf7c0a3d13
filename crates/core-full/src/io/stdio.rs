// Standard input and output endpoints
use std::io;
use streamcast_core::pipeline::{Registry, Spec};
use streamcast_core::{Result, Sink, Source};

pub fn open_stdin(_spec: &Spec, _registry: &Registry) -> Result<Box<dyn Source>> {
    Ok(Box::new(io::stdin()))
}

pub fn open_stdout(_spec: &Spec, _registry: &Registry) -> Result<Box<dyn Sink>> {
    Ok(Box::new(io::stdout()))
}
