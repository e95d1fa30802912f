mod chart;
mod json;

pub use chart::ChartSink;
pub use json::JsonSink;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::config::{OutputFormat, WatchConfig};
use crate::error::WatchError;
use crate::metrics::Series;

/// Final destination of a collected series. Called once per run.
pub trait ResultSink {
    fn persist(&self, series: Series) -> Result<PathBuf, WatchError>;
}

pub fn sink_for(config: &WatchConfig) -> Box<dyn ResultSink + Send + Sync> {
    let path = config.output_path();
    match config.format {
        OutputFormat::Json => Box::new(JsonSink::new(path)),
        OutputFormat::Png => Box::new(ChartSink::new(path)),
    }
}

/// Creates an empty temp file next to `path` carrying the same extension, so
/// encoders that look at the file name still pick the right format.
fn staging_file(path: &Path) -> Result<NamedTempFile, WatchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    Builder::new()
        .prefix(".proc-watch-")
        .suffix(&suffix)
        .tempfile_in(&dir)
        .map_err(|err| WatchError::sink(path, err))
}

/// Moves a fully written staging file over `path`.
fn commit(staged: NamedTempFile, path: &Path) -> Result<PathBuf, WatchError> {
    staged
        .persist(path)
        .map_err(|err| WatchError::sink(path, err.error))?;
    Ok(path.to_path_buf())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<PathBuf, WatchError> {
    let mut staged = staging_file(path)?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|err| WatchError::sink(path, err))?;
    commit(staged, path)
}
