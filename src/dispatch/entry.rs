// src/dispatch/entry.rs

use crate::config::EntryConfig;
use crate::exec::CommandSpec;
use crate::types::DeliveryQuality;

use super::guard::ExecutionGuard;

/// One topic -> command binding, plus its run-state.
///
/// Everything except the guard is fixed at construction; entries are shared
/// between handler tasks as `Arc<Entry>`.
#[derive(Debug)]
pub struct Entry {
    name: String,
    topic: String,
    command: CommandSpec,
    qos_hint: Option<u8>,
    guard: ExecutionGuard,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        command: CommandSpec,
        allow_concurrent: bool,
        qos_hint: Option<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            command,
            qos_hint,
            guard: ExecutionGuard::new(allow_concurrent),
        }
    }

    pub fn from_config(name: &str, cfg: &EntryConfig) -> Self {
        let mut command = CommandSpec::new(cfg.command.clone()).with_args(cfg.args.iter().cloned());
        command.working_directory = cfg.working_directory.clone();
        Self::new(name, cfg.topic.clone(), command, cfg.allow_concurrent, cfg.qos)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn allow_concurrent(&self) -> bool {
        self.guard.allow_concurrent()
    }

    /// The QoS to subscribe with, given the process-wide default.
    pub fn delivery_quality(&self, default: DeliveryQuality) -> DeliveryQuality {
        DeliveryQuality::resolve(self.qos_hint, default)
    }

    pub fn guard(&self) -> &ExecutionGuard {
        &self.guard
    }
}
