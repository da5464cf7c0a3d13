/// Pipeline document loading
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use streamcast_core::pipeline::PipelineSpec;
use streamcast_core::{Result, StreamError};
use tracing::debug;

/// Load a JSON pipeline document from `path`.
///
/// A missing or unreadable file and a malformed document are both
/// configuration errors.
pub fn load_pipeline_spec(path: impl AsRef<Path>) -> Result<PipelineSpec> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        StreamError::config(format!("cannot read {}: {err}", path.display()))
    })?;

    let spec = read_pipeline_spec(BufReader::new(file))?;
    debug!("Loaded pipeline document {}", path.display());
    Ok(spec)
}

/// Parse a JSON pipeline document from any reader
pub fn read_pipeline_spec<R: Read>(reader: R) -> Result<PipelineSpec> {
    PipelineSpec::from_reader(reader)
}
