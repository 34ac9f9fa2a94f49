// src/dispatch/registrar.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::{Delivery, Handler, HandlerFuture, MessageBus};
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::CommandRunner;
use crate::types::DeliveryQuality;

use super::entry::Entry;
use super::handler::handle_trigger;

/// Owns the loaded entries and binds each one to its topic on a bus.
pub struct Registrar {
    entries: Vec<Arc<Entry>>,
    runner: Arc<dyn CommandRunner>,
    default_quality: DeliveryQuality,
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("entries", &self.entries)
            .field("default_quality", &self.default_quality)
            .finish_non_exhaustive()
    }
}

impl Registrar {
    pub fn new(
        entries: Vec<Entry>,
        runner: Arc<dyn CommandRunner>,
        default_quality: DeliveryQuality,
    ) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
            runner,
            default_quality,
        }
    }

    pub fn from_config(
        cfg: &ConfigFile,
        runner: Arc<dyn CommandRunner>,
        default_quality: DeliveryQuality,
    ) -> Self {
        let entries = cfg
            .entry
            .iter()
            .map(|(name, entry)| Entry::from_config(name, entry))
            .collect();
        Self::new(entries, runner, default_quality)
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&Arc<Entry>> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Subscribe every entry on `bus`. Stops at the first failed subscription.
    pub async fn register_all<B>(&self, bus: &mut B) -> Result<usize>
    where
        B: MessageBus + ?Sized,
    {
        for entry in &self.entries {
            let quality = entry.delivery_quality(self.default_quality);
            bus.subscribe(entry.topic(), quality, self.handler_for(entry))
                .await?;
            info!(
                entry = %entry.name(),
                topic = %entry.topic(),
                %quality,
                "an entry was loaded"
            );
        }
        Ok(self.entries.len())
    }

    /// Bus callback for one entry. The payload is ignored: every delivery is
    /// a trigger.
    pub fn handler_for(&self, entry: &Arc<Entry>) -> Handler {
        let entry = Arc::clone(entry);
        let runner = Arc::clone(&self.runner);

        Arc::new(move |delivery: Delivery| {
            let entry = Arc::clone(&entry);
            let runner = Arc::clone(&runner);
            let fut: HandlerFuture = Box::pin(async move {
                debug!(
                    entry = %entry.name(),
                    topic = %delivery.topic,
                    bytes = delivery.payload.len(),
                    "message received"
                );
                handle_trigger(&entry, runner.as_ref()).await;
            });
            fut
        })
    }
}
