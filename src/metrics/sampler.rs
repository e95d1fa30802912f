use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::select;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::probe::ProcessProbe;
use super::source::ProcessStatsSource;
use super::types::{SampleAccumulator, Series};
use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::sink::ResultSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Running,
    Finalizing,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The configured duration elapsed.
    Deadline,
    /// The interrupt future resolved first.
    Interrupted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Deadline => write!(f, "duration elapsed"),
            Termination::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchReport {
    pub termination: Termination,
    pub samples: usize,
    pub output: PathBuf,
    /// Every state the loop passed through, starting with `Idle`.
    pub states: Vec<WatchState>,
}

/// Polls a [`ProcessStatsSource`] on a fixed interval until the deadline or
/// an interrupt, then hands the collected series to a [`ResultSink`] once.
pub struct CollectionLoop<P> {
    source: ProcessStatsSource<P>,
    interval: Duration,
    duration: Duration,
    include_children: bool,
    states: Vec<WatchState>,
}

impl<P> CollectionLoop<P>
where
    P: ProcessProbe + 'static,
{
    pub fn new(config: &WatchConfig, source: ProcessStatsSource<P>) -> Self {
        CollectionLoop {
            source,
            interval: config.interval,
            duration: config.duration,
            include_children: config.include_children,
            states: vec![WatchState::Idle],
        }
    }

    fn transition(states: &mut Vec<WatchState>, pid: u32, next: WatchState) {
        debug!(
            "collection loop for pid {}: {:?} -> {:?}",
            pid,
            states.last().copied().unwrap_or(WatchState::Idle),
            next
        );
        states.push(next);
    }

    /// Runs to completion. Consuming `self` makes a second finalization impossible.
    pub async fn run<S, F>(self, sink: &S, interrupt: F) -> Result<WatchReport, WatchError>
    where
        S: ResultSink + ?Sized,
        F: Future<Output = ()>,
    {
        let pid = self.source.pid();
        let mut states = self.states;
        let cancel = CancellationToken::new();
        info!(
            "watching pid {} every {:?} for {:?} (children: {})",
            pid, self.interval, self.duration, self.include_children
        );

        let mut collector = tokio::spawn(collect(
            self.source,
            self.interval,
            self.include_children,
            cancel.clone(),
        ));
        Self::transition(&mut states, pid, WatchState::Running);

        let stop = select! {
            _ = sleep(self.duration) => Stop::Deadline,
            _ = interrupt => Stop::Interrupted,
            finished = &mut collector => Stop::CollectorExited(finished),
        };

        let (termination, collected) = match stop {
            Stop::Deadline => (Termination::Deadline, stop_collector(&cancel, collector).await),
            Stop::Interrupted => (
                Termination::Interrupted,
                stop_collector(&cancel, collector).await,
            ),
            // The task only returns on its own after a fatal read.
            Stop::CollectorExited(finished) => (Termination::Deadline, flatten(finished)),
        };
        let series = collected?;

        Self::transition(&mut states, pid, WatchState::Finalizing);
        info!(
            "watch of pid {} finished ({}), {} samples collected",
            pid,
            termination,
            series.len()
        );
        let samples = series.len();
        let output = sink.persist(series)?;
        Self::transition(&mut states, pid, WatchState::Done);

        Ok(WatchReport {
            termination,
            samples,
            output,
            states,
        })
    }
}

enum Stop {
    Deadline,
    Interrupted,
    CollectorExited(Result<Result<Series, WatchError>, JoinError>),
}

async fn stop_collector(
    cancel: &CancellationToken,
    collector: JoinHandle<Result<Series, WatchError>>,
) -> Result<Series, WatchError> {
    cancel.cancel();
    flatten(collector.await)
}

fn flatten(finished: Result<Result<Series, WatchError>, JoinError>) -> Result<Series, WatchError> {
    match finished {
        Ok(result) => result,
        Err(join_err) => Err(WatchError::Collector(join_err.to_string())),
    }
}

/// Single writer of the accumulator. Returns the series by value once cancelled.
async fn collect<P: ProcessProbe>(
    mut source: ProcessStatsSource<P>,
    period: Duration,
    include_children: bool,
    cancel: CancellationToken,
) -> Result<Series, WatchError> {
    let started = Instant::now();
    let started_wall = Utc::now();
    let mut accumulator = SampleAccumulator::new();

    // First tick one period after start, like a ticker.
    let mut ticker = interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            biased;
            _ = cancel.cancelled() => {
                break;
            }
            tick = ticker.tick() => {
                let usage = source.sample(include_children)?;
                let timestamp = wall_clock(started_wall, tick.duration_since(started));
                debug!(
                    "pid {} cpu {:.4} mem {:.4} at {}",
                    source.pid(),
                    usage.cpu,
                    usage.mem,
                    timestamp
                );
                accumulator.append(timestamp, usage.cpu, usage.mem);
            }
        }
    }

    Ok(accumulator.into_series())
}

fn wall_clock(start: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    match chrono::Duration::from_std(offset) {
        Ok(delta) => start + delta,
        Err(_) => Utc::now(),
    }
}
