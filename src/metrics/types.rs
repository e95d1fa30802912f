use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instantaneous usage of one process, both as fractions.
///
/// `cpu` is relative to a single core, so a process saturating four cores
/// reports 4.0. `mem` is relative to total system memory.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProcessUsage {
    pub cpu: f64,
    pub mem: f64,
}

impl ProcessUsage {
    pub fn new(cpu: f64, mem: f64) -> Self {
        ProcessUsage { cpu, mem }
    }

    pub fn accumulate(&mut self, other: ProcessUsage) {
        self.cpu += other.cpu;
        self.mem += other.mem;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub cpu: f64,
    pub mem: f64,
}

/// Time-ordered samples stored as three index-aligned columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesColumns")]
pub struct Series {
    times: Vec<DateTime<Utc>>,
    cpu: Vec<f64>,
    mem: Vec<f64>,
}

#[derive(Deserialize)]
struct SeriesColumns {
    times: Vec<DateTime<Utc>>,
    cpu: Vec<f64>,
    mem: Vec<f64>,
}

impl TryFrom<SeriesColumns> for Series {
    type Error = String;

    fn try_from(columns: SeriesColumns) -> Result<Self, Self::Error> {
        let SeriesColumns { times, cpu, mem } = columns;
        if times.len() != cpu.len() || times.len() != mem.len() {
            return Err(format!(
                "misaligned series: {} times, {} cpu, {} mem",
                times.len(),
                cpu.len(),
                mem.len()
            ));
        }
        Ok(Series { times, cpu, mem })
    }
}

impl Series {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn cpu(&self) -> &[f64] {
        &self.cpu
    }

    pub fn mem(&self) -> &[f64] {
        &self.mem
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.times.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.times
            .iter()
            .zip(self.cpu.iter().zip(self.mem.iter()))
            .map(|(timestamp, (cpu, mem))| Sample {
                timestamp: *timestamp,
                cpu: *cpu,
                mem: *mem,
            })
    }
}

/// Append-only builder for a [`Series`]. Consumed by [`SampleAccumulator::into_series`]
/// so nothing can be appended after the series has been handed off.
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    series: Series,
}

impl SampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, timestamp: DateTime<Utc>, cpu: f64, mem: f64) {
        self.series.times.push(timestamp);
        self.series.cpu.push(cpu);
        self.series.mem.push(mem);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_series(self) -> Series {
        self.series
    }
}
