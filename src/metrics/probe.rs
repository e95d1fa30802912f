use log::debug;
use sysinfo::{Pid, System};

use super::types::ProcessUsage;

/// Read access to the OS process table.
pub trait ProcessProbe: Send {
    /// Refreshes the process table. Returns `false` once `pid` has exited.
    fn refresh(&mut self, pid: u32) -> bool;

    /// Usage as of the last refresh, `None` if the process cannot report.
    fn usage(&self, pid: u32) -> Option<ProcessUsage>;

    /// Direct children as of the last refresh.
    fn children(&self, pid: u32) -> Vec<u32>;
}

pub struct SysinfoProbe {
    system: System,
    total_memory: u64,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        let total_memory = system.total_memory();
        // CPU usage is a delta between two refreshes; the first one only primes the counters.
        system.refresh_processes();
        debug!("sysinfo probe ready, total memory {} bytes", total_memory);
        SysinfoProbe {
            system,
            total_memory,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn refresh(&mut self, pid: u32) -> bool {
        // `refresh_process` keeps stale entries for exited pids and has its own
        // CPU baseline, so every tick goes through the full table primed in `new`.
        self.system.refresh_processes();
        self.system.process(Pid::from_u32(pid)).is_some()
    }

    fn usage(&self, pid: u32) -> Option<ProcessUsage> {
        let process = self.system.process(Pid::from_u32(pid))?;
        let mem = if self.total_memory > 0 {
            process.memory() as f64 / self.total_memory as f64
        } else {
            0.0
        };
        Some(ProcessUsage {
            cpu: process.cpu_usage() as f64 / 100.0,
            mem,
        })
    }

    fn children(&self, pid: u32) -> Vec<u32> {
        let parent = Pid::from_u32(pid);
        self.system
            .processes()
            .iter()
            .filter(|(_, process)| process.parent() == Some(parent))
            // Linux threads show up as entries whose parent is the owning process.
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(child, _)| child.as_u32())
            .collect()
    }
}
