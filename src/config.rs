// src/config.rs

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::error::WatchError;

pub const DEFAULT_OUTPUT: &str = "record";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[value(alias = "chart")]
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Png => "png",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "proc-watch",
    version,
    about = "Record a process' CPU and memory usage over time"
)]
pub struct Cli {
    /// Id of the process to watch
    pub pid: String,

    /// Output file name, the extension is added from the format
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// JSON output format, same as `--format json`
    #[arg(short, long, conflicts_with = "format")]
    pub json: bool,

    /// Don't add the process' children usage
    #[arg(short, long)]
    pub no_children: bool,

    /// Interval between two polls (e.g. 500ms, 1s, 1m)
    #[arg(short, long, default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Duration of the watch (e.g. 30s, 1h30m, 24h)
    #[arg(short, long, default_value = "24h", value_parser = parse_duration)]
    pub duration: Duration,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Settings for one watch run, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub pid: u32,
    pub interval: Duration,
    pub duration: Duration,
    pub include_children: bool,
    pub output: PathBuf,
    pub format: OutputFormat,
}

impl WatchConfig {
    pub fn new(pid: u32) -> Self {
        WatchConfig {
            pid,
            interval: DEFAULT_INTERVAL,
            duration: DEFAULT_DURATION,
            include_children: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: OutputFormat::Png,
        }
    }

    /// `<output>.<ext>`, appended to the whole base name.
    pub fn output_path(&self) -> PathBuf {
        let mut name = OsString::from(self.output.as_os_str());
        name.push(".");
        name.push(self.format.extension());
        PathBuf::from(name)
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.pid == 0 {
            return Err(WatchError::Usage("invalid PID: 0".to_string()));
        }
        if self.interval.is_zero() {
            return Err(WatchError::Usage(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(WatchError::Usage("output name must not be empty".to_string()));
        }
        Ok(())
    }
}

impl TryFrom<Cli> for WatchConfig {
    type Error = WatchError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let pid = cli
            .pid
            .trim()
            .parse::<u32>()
            .map_err(|_| WatchError::Usage(format!("invalid PID: {}", cli.pid)))?;

        let config = WatchConfig {
            pid,
            interval: cli.interval,
            duration: cli.duration,
            include_children: !cli.no_children,
            output: cli.output,
            format: if cli.json {
                OutputFormat::Json
            } else {
                cli.format
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parses durations such as `300ms`, `1.5s` or `1h30m`.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
/// `0` is allowed, any other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {:?}: expected a number", input));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", input))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            "" => return Err(format!("missing unit in duration {:?}", input)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, input)),
        };
        rest = &rest[unit_len..];
        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration {:?} is out of range", input));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
