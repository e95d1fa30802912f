use log::debug;

use super::probe::ProcessProbe;
use super::types::ProcessUsage;
use crate::error::WatchError;

/// Usage readings for one resolved target process, optionally summed with
/// its direct children.
pub struct ProcessStatsSource<P> {
    probe: P,
    pid: u32,
}

impl<P: ProcessProbe> ProcessStatsSource<P> {
    /// Fails with [`WatchError::ProcessNotFound`] if `pid` is not a live process.
    pub fn resolve(mut probe: P, pid: u32) -> Result<Self, WatchError> {
        if !probe.refresh(pid) || probe.usage(pid).is_none() {
            return Err(WatchError::ProcessNotFound(pid));
        }
        Ok(ProcessStatsSource { probe, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn sample(&mut self, include_children: bool) -> Result<ProcessUsage, WatchError> {
        if !self.probe.refresh(self.pid) {
            return Err(WatchError::StatsUnavailable {
                pid: self.pid,
                reason: "process has exited".to_string(),
            });
        }

        let mut usage = self
            .probe
            .usage(self.pid)
            .ok_or_else(|| WatchError::StatsUnavailable {
                pid: self.pid,
                reason: "process no longer reports cpu or memory usage".to_string(),
            })?;

        if include_children {
            // Children are re-listed on every tick; any of them may exit mid-read.
            for child in self.probe.children(self.pid) {
                match self.child_usage(child) {
                    Ok(child_usage) => usage.accumulate(child_usage),
                    Err(err) if !err.is_fatal() => debug!("skipping child: {}", err),
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(usage)
    }

    fn child_usage(&self, child: u32) -> Result<ProcessUsage, WatchError> {
        self.probe
            .usage(child)
            .ok_or(WatchError::ChildStatsUnavailable { pid: child })
    }
}
