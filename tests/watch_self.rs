use std::fs;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proc_watch::{
    CollectionLoop, JsonSink, OutputFormat, ProcessStatsSource, Series, SysinfoProbe,
    Termination, WatchConfig, WatchError,
};
use tempfile::TempDir;

fn own_config(dir: &TempDir) -> WatchConfig {
    let mut config = WatchConfig::new(std::process::id());
    config.interval = Duration::from_millis(50);
    config.duration = Duration::from_millis(320);
    config.output = dir.path().join("self");
    config.format = OutputFormat::Json;
    config
}

#[tokio::test]
async fn watching_this_process_writes_aligned_json() {
    let dir = TempDir::new().expect("temp dir");
    let config = own_config(&dir);

    let source = ProcessStatsSource::resolve(SysinfoProbe::new(), config.pid).expect("self resolves");
    let sink = JsonSink::new(config.output_path());
    let report = CollectionLoop::new(&config, source)
        .run(&sink, std::future::pending())
        .await
        .expect("watch succeeds");

    assert_eq!(report.termination, Termination::Deadline);
    assert_eq!(report.output, dir.path().join("self.json"));
    assert!(report.samples >= 1 && report.samples <= 7, "samples: {}", report.samples);

    let series: Series = serde_json::from_slice(&fs::read(&report.output).unwrap()).unwrap();
    assert_eq!(series.len(), report.samples);
    assert_eq!(series.cpu().len(), series.len());
    assert_eq!(series.mem().len(), series.len());
    for pair in series.times().windows(2) {
        assert!(pair[0] < pair[1]);
    }
    for sample in series.iter() {
        assert!(sample.cpu >= 0.0);
        assert!(sample.mem > 0.0 && sample.mem < 1.0);
    }
}

#[tokio::test]
async fn missing_process_is_reported_before_collecting() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = own_config(&dir);
    config.pid = u32::MAX - 1;

    let err = proc_watch::run(config).await.unwrap_err();
    assert!(matches!(err, WatchError::ProcessNotFound(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn invalid_config_is_a_usage_error() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = own_config(&dir);
    config.interval = Duration::ZERO;

    let err = proc_watch::run(config).await.unwrap_err();
    assert!(matches!(err, WatchError::Usage(_)));
}

#[cfg(unix)]
#[test]
fn exited_target_is_fatal_without_children() {
    let mut child = Command::new("sleep").arg("0.3").spawn().expect("spawn sleep");
    let pid = child.id();
    let mut source = ProcessStatsSource::resolve(SysinfoProbe::new(), pid).expect("child resolves");

    child.wait().expect("sleep exits");

    let err = source.sample(false).unwrap_err();
    assert!(
        matches!(err, WatchError::StatsUnavailable { pid: p, .. } if p == pid),
        "unexpected: {:?}",
        err
    );
}

#[test]
fn first_sample_without_children_reports_cpu() {
    let mut source =
        ProcessStatsSource::resolve(SysinfoProbe::new(), std::process::id()).expect("self resolves");

    let stop = Arc::new(AtomicBool::new(false));
    let spinner = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut x: u64 = 0;
            while !stop.load(Ordering::Relaxed) {
                x = x.wrapping_mul(31).wrapping_add(7);
            }
            x
        })
    };
    thread::sleep(Duration::from_millis(500));

    let usage = source.sample(false).expect("self samples");
    stop.store(true, Ordering::Relaxed);
    spinner.join().expect("spinner joins");

    assert!(usage.cpu > 0.2, "first cpu sample was {}", usage.cpu);
}
