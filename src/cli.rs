// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every broker flag can also be supplied through an `MQTT_<FLAG>`
//! environment variable; an explicit flag wins over the environment.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `mqtt-exec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mqtt-exec",
    version,
    about = "Run commands when messages arrive on MQTT topics.",
    long_about = None
)]
pub struct CliArgs {
    /// Broker address, e.g. `tcp://localhost:1883`.
    #[arg(long, env = "MQTT_HOST", default_value = "tcp://localhost:1883")]
    pub host: String,

    /// MQTT client id.
    #[arg(long = "cid", env = "MQTT_CID", default_value = "mqtt-exec")]
    pub client_id: String,

    /// Broker username. Credentials are only sent when this is non-empty.
    #[arg(long, env = "MQTT_USERNAME", default_value = "")]
    pub username: String,

    /// Broker password.
    #[arg(long, env = "MQTT_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Default QoS for entries that do not request one (0, 1 or 2).
    #[arg(
        long,
        env = "MQTT_QOS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub qos: u8,

    /// Path to the entries config file (TOML).
    #[arg(long, env = "MQTT_CONFIG", value_name = "PATH", default_value = "config.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MQTT_EXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print entries, but don't connect to the broker.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
