use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use plotters::prelude::*;

use super::{commit, staging_file, ResultSink};
use crate::error::WatchError;
use crate::metrics::Series;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 512;
const CPU_COLOR: RGBColor = BLUE;
const MEM_COLOR: RGBColor = RED;

/// Renders the series as a PNG line chart.
pub struct ChartSink {
    path: PathBuf,
}

impl ChartSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ChartSink { path: path.into() }
    }
}

impl ResultSink for ChartSink {
    fn persist(&self, series: Series) -> Result<PathBuf, WatchError> {
        let staged = staging_file(&self.path)?;
        render(&series, staged.path()).map_err(|err| {
            WatchError::sink(&self.path, format!("couldn't render chart: {}", err))
        })?;
        let path = commit(staged, &self.path)?;
        info!("plotted {} samples to {}", series.len(), path.display());
        Ok(path)
    }
}

/// Seconds since the first sample, one entry per sample.
fn elapsed_seconds(series: &Series) -> Vec<f64> {
    let Some(start) = series.first_timestamp() else {
        return Vec::new();
    };
    series
        .times()
        .iter()
        .map(|t| (*t - start).num_milliseconds() as f64 / 1000.0)
        .collect()
}

fn y_upper_bound(series: &Series) -> f64 {
    let peak = series
        .cpu()
        .iter()
        .chain(series.mem().iter())
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    (peak * 1.1).max(1.0)
}

fn render(series: &Series, target: &Path) -> Result<(), Box<dyn Error>> {
    let start = series.first_timestamp().unwrap_or_else(Utc::now);
    let offsets = elapsed_seconds(series);
    let x_max = offsets.last().copied().unwrap_or(0.0).max(1.0);
    let y_max = y_upper_bound(series);

    let root = BitMapBackend::new(target, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let label_time = |secs: &f64| {
        (start + chrono::Duration::milliseconds((*secs * 1000.0).round() as i64))
            .format("%H:%M:%S")
            .to_string()
    };
    let label_percent = |value: &f64| format!("{:.0}%", value * 100.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Process usage", ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Metric in %")
        .x_labels(8)
        .x_label_formatter(&label_time)
        .y_label_formatter(&label_percent)
        .draw()?;

    if !series.is_empty() {
        for (name, values, color) in [
            ("CPU", series.cpu(), CPU_COLOR),
            ("Memory", series.mem(), MEM_COLOR),
        ] {
            let points: Vec<(f64, f64)> = offsets
                .iter()
                .copied()
                .zip(values.iter().copied())
                .collect();
            chart
                .draw_series(
                    AreaSeries::new(points, 0.0, color.mix(0.25).filled())
                        .border_style(color.stroke_width(2)),
                )?
                .label(name)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.6).filled())
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SampleAccumulator;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn assert_png_without_staging(dir: &TempDir, path: &Path) {
        let bytes = fs::read(path).unwrap();
        assert!(bytes.starts_with(&PNG_SIGNATURE), "not a png: {}", path.display());
        let staged = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".proc-watch-"))
            .count();
        assert_eq!(staged, 0);
    }

    fn series(values: &[(i64, f64, f64)]) -> Series {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let mut acc = SampleAccumulator::new();
        for (ms, cpu, mem) in values {
            acc.append(start + Duration::milliseconds(*ms), *cpu, *mem);
        }
        acc.into_series()
    }

    #[test]
    fn offsets_start_at_zero() {
        let s = series(&[(0, 0.1, 0.1), (500, 0.2, 0.1), (2000, 0.3, 0.1)]);
        assert_eq!(elapsed_seconds(&s), vec![0.0, 0.5, 2.0]);
        assert!(elapsed_seconds(&Series::default()).is_empty());
    }

    #[test]
    fn y_axis_keeps_room_for_multi_core_cpu() {
        assert_eq!(y_upper_bound(&Series::default()), 1.0);
        assert_eq!(y_upper_bound(&series(&[(0, 0.4, 0.2)])), 1.0);

        let bound = y_upper_bound(&series(&[(0, 3.0, 0.2), (1000, 1.0, 0.2)]));
        assert!((bound - 3.3).abs() < 1e-9);
    }

    #[test]
    fn chart_of_a_populated_series_is_a_png() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("record.png");
        let s = series(&[(0, 0.1, 0.05), (1000, 1.8, 0.06), (2000, 0.4, 0.07)]);

        let path = ChartSink::new(&target).persist(s).unwrap();
        assert_eq!(path, target);
        assert_png_without_staging(&dir, &path);
    }

    #[test]
    fn chart_of_an_empty_series_is_a_png() {
        let dir = TempDir::new().unwrap();
        let path = ChartSink::new(dir.path().join("empty.png"))
            .persist(Series::default())
            .unwrap();
        assert_png_without_staging(&dir, &path);
    }
}
