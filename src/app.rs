use log::{info, warn};

use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::metrics::{CollectionLoop, ProcessStatsSource, SysinfoProbe, WatchReport};
use crate::sink::sink_for;

/// Watches the configured process with the OS probe until the duration
/// elapses or Ctrl-C is received, then writes the configured artifact.
pub async fn run(config: WatchConfig) -> Result<WatchReport, WatchError> {
    config.validate()?;

    let probe = tokio::task::spawn_blocking(SysinfoProbe::new)
        .await
        .map_err(|err| WatchError::Collector(err.to_string()))?;
    let source = ProcessStatsSource::resolve(probe, config.pid)?;
    let sink = sink_for(&config);

    CollectionLoop::new(&config, source)
        .run(sink.as_ref(), interrupted())
        .await
}

async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received interrupt, finishing early"),
        Err(err) => {
            warn!("couldn't listen for interrupts: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
