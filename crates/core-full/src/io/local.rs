// Local file endpoints
use super::LOCAL;
use crate::error::EndpointError;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use streamcast_core::pipeline::{Registry, Spec};
use streamcast_core::{Result, Sink, Source, StreamError};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct LocalConfig {
    #[serde(alias = "name")]
    path: PathBuf,
    /// Sink only: append instead of truncating
    #[serde(default)]
    append: bool,
}

/// Open `path` for reading
pub fn open_local_source(spec: &Spec, _registry: &Registry) -> Result<Box<dyn Source>> {
    let config: LocalConfig = spec.decode()?;
    let file = File::open(&config.path)
        .map_err(|err| StreamError::construction(LOCAL, EndpointError::file(&config.path, err)))?;

    debug!("Opened {} for reading", config.path.display());
    Ok(Box::new(file))
}

/// Create (or truncate) `path` for writing, or append when `append` is set
pub fn open_local_sink(spec: &Spec, _registry: &Registry) -> Result<Box<dyn Sink>> {
    let config: LocalConfig = spec.decode()?;
    let mut options = OpenOptions::new();
    if config.append {
        options.append(true).create(true);
    } else {
        options.write(true).create(true).truncate(true);
    }

    let file = options
        .open(&config.path)
        .map_err(|err| StreamError::construction(LOCAL, EndpointError::file(&config.path, err)))?;

    debug!(
        "Opened {} for writing (append: {})",
        config.path.display(),
        config.append
    );
    Ok(Box::new(file))
}
