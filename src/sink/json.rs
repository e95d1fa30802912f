use std::path::PathBuf;

use log::info;

use super::{write_atomically, ResultSink};
use crate::error::WatchError;
use crate::metrics::Series;

pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSink { path: path.into() }
    }
}

impl ResultSink for JsonSink {
    fn persist(&self, series: Series) -> Result<PathBuf, WatchError> {
        let bytes = serde_json::to_vec(&series)
            .map_err(|err| WatchError::sink(&self.path, format!("couldn't encode records: {}", err)))?;
        let path = write_atomically(&self.path, &bytes)?;
        info!("wrote {} samples to {}", series.len(), path.display());
        Ok(path)
    }
}
