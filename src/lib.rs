mod app;
pub mod config;
mod error;
pub mod metrics;
pub mod sink;

pub use app::run;
pub use config::{Cli, OutputFormat, WatchConfig};
pub use error::WatchError;
pub use metrics::{
    CollectionLoop, ProcessProbe, ProcessStatsSource, ProcessUsage, Sample, SampleAccumulator,
    Series, SysinfoProbe, Termination, WatchReport, WatchState,
};
pub use sink::{ChartSink, JsonSink, ResultSink};
