use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use mqtt_exec::bus::{Handler, MessageBus, TopicRouter};
use mqtt_exec::errors::{DispatchError, Result};
use mqtt_exec::types::DeliveryQuality;

/// In-process bus: subscriptions go into a `TopicRouter`, and `publish`
/// dispatches straight to the matching handlers.
#[derive(Debug, Default)]
pub struct LocalBus {
    router: TopicRouter,
    rejected: HashSet<String>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `subscribe` fail for `filter`, like a broker returning a failure
    /// SUBACK.
    pub fn reject(mut self, filter: &str) -> Self {
        self.rejected.insert(filter.to_string());
        self
    }

    pub fn subscriptions(&self) -> Vec<(String, DeliveryQuality)> {
        self.router
            .subscriptions()
            .map(|(f, q)| (f.to_string(), q))
            .collect()
    }

    /// Deliver a message; handlers run on their own tasks.
    pub fn publish(&self, topic: &str, payload: &[u8]) -> Vec<JoinHandle<()>> {
        self.router.dispatch(topic, payload)
    }

    /// Deliver a message and wait for every handler to return.
    pub async fn publish_and_wait(&self, topic: &str, payload: &[u8]) {
        for handle in self.publish(topic, payload) {
            handle.await.expect("handler task panicked");
        }
    }
}

impl MessageBus for LocalBus {
    fn subscribe<'a>(
        &'a mut self,
        filter: &'a str,
        quality: DeliveryQuality,
        handler: Handler,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.rejected.contains(filter) {
                return Err(DispatchError::BusError(format!(
                    "broker rejected subscription to '{filter}'"
                )));
            }
            self.router.add(filter, quality, handler);
            Ok(())
        })
    }
}
