mod probe;
mod sampler;
mod source;
mod types;

pub use probe::{ProcessProbe, SysinfoProbe};
pub use sampler::{CollectionLoop, Termination, WatchReport, WatchState};
pub use source::ProcessStatsSource;
pub use types::{ProcessUsage, Sample, SampleAccumulator, Series};
