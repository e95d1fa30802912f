use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum WatchError {
    /// Bad command line input; nothing was collected.
    Usage(String),
    ProcessNotFound(u32),
    /// The watched process itself could not be read on a tick.
    StatsUnavailable { pid: u32, reason: String },
    /// A child could not be read. Tolerated by the stats source, never fatal.
    ChildStatsUnavailable { pid: u32 },
    Sink { path: PathBuf, reason: String },
    /// The collection task panicked or was torn down before handing back its series.
    Collector(String),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchError::Usage(msg) => write!(f, "{}", msg),
            WatchError::ProcessNotFound(pid) => {
                write!(f, "couldn't find process for pid {}", pid)
            }
            WatchError::StatsUnavailable { pid, reason } => {
                write!(f, "couldn't read usage of process {}: {}", pid, reason)
            }
            WatchError::ChildStatsUnavailable { pid } => {
                write!(f, "child process {} did not report usage", pid)
            }
            WatchError::Sink { path, reason } => {
                write!(f, "couldn't save records to {}: {}", path.display(), reason)
            }
            WatchError::Collector(reason) => write!(f, "collection task failed: {}", reason),
        }
    }
}

impl std::error::Error for WatchError {}

impl WatchError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WatchError::ChildStatsUnavailable { .. })
    }

    pub(crate) fn sink(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        WatchError::Sink {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
