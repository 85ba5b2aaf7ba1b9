//! Runtime configuration and service-wide constants.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

// constants (used as defaults)
/// Recency window applied when a query or stream omits `window_minutes`.
pub const DEFAULT_WINDOW_MINUTES: i64 = 5;
/// Upper bound on a single GeoIP lookup; lookups exceeding it degrade to an
/// unresolved record instead of stalling ingestion.
pub const GEO_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);
/// How often the retention sweeper wakes up when retention is enabled.
pub const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Websocket close code sent when stream parameters violate policy.
pub const WS_POLICY_VIOLATION: u16 = 1008;
/// Default location of the GeoLite2 City database, matching the layout the
/// collectors ship with.
pub const DEFAULT_GEOIP_PATH: &str = "./data/GeoLite2-City.mmdb";

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Command-line configuration for the attack feed service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "attack_globe",
    about = "Ingests attack-traffic events, enriches them with GeoIP data, and streams them live to watchers of a victim address"
)]
pub struct Config {
    /// Address to bind the HTTP listener on.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener on.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Path to a MaxMind GeoLite2 City database (.mmdb). When absent, the
    /// default path is tried and the service runs without enrichment if no
    /// database is found there.
    #[arg(long)]
    pub geoip: Option<PathBuf>,

    /// Sweep retained events older than this many minutes. 0 disables the
    /// sweeper and keeps every event for the process lifetime.
    #[arg(long, default_value_t = 0)]
    pub retention_minutes: i64,

    /// Minimum log level to display.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            geoip: None,
            retention_minutes: 0,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
