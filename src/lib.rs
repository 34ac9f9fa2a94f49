// src/lib.rs

pub mod bus;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::{BrokerSettings, MqttBus};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dispatch::Registrar;
use crate::errors::{DispatchError, Result};
use crate::exec::ProcessRunner;
use crate::types::DeliveryQuality;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - entries + registrar
/// - MQTT connection and subscriptions
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let default_quality = DeliveryQuality::from_level(args.qos).ok_or_else(|| {
        DispatchError::ConfigError(format!("--qos must be 0, 1 or 2 (got {})", args.qos))
    })?;

    let registrar = Registrar::from_config(&cfg, Arc::new(ProcessRunner::new()), default_quality);

    if args.dry_run {
        print_dry_run(&registrar, default_quality);
        return Ok(());
    }

    if cfg.is_empty() {
        info!("there is no entry. stop.");
        return Ok(());
    }

    let settings = BrokerSettings::from_args(&args)?;
    let mut bus = MqttBus::connect(&settings).await?;

    let loaded = registrar.register_all(&mut bus).await?;
    info!(entries = loaded, "waiting for messages");

    tokio::signal::ctrl_c().await?;
    info!("interrupt received; disconnecting");

    bus.disconnect().await
}

/// Simple dry-run output: print entries and how they would be subscribed.
fn print_dry_run(registrar: &Registrar, default_quality: DeliveryQuality) {
    println!("mqtt-exec dry-run");
    println!("  default qos = {}", default_quality.level());
    println!();

    let entries = registrar.entries();
    println!("entries ({}):", entries.len());
    for entry in entries {
        let command = entry.command();
        println!("  - {}", entry.name());
        println!("      topic: {}", entry.topic());
        println!("      qos: {}", entry.delivery_quality(default_quality).level());
        println!("      command: {command}");
        if let Some(ref dir) = command.working_directory {
            println!("      working_directory: {}", dir.display());
        }
        if entry.allow_concurrent() {
            println!("      allow_concurrent: true");
        }
    }

    debug!("dry-run complete (no connection)");
}
