// src/bus/mod.rs

//! Message bus collaborator.
//!
//! The dispatcher only needs one capability from a bus: "call this handler
//! for every message on this topic filter". [`MessageBus`] captures that so
//! the registrar can be driven by the MQTT client in production and by an
//! in-process bus in tests.
//!
//! - [`router`] owns the filter -> handler table and MQTT wildcard matching.
//! - [`mqtt`] is the `rumqttc`-backed implementation.

pub mod mqtt;
pub mod router;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Result;
use crate::types::DeliveryQuality;

pub use mqtt::{BrokerAddress, BrokerSettings, MqttBus, parse_broker_address};
pub use router::{TopicRouter, is_valid_filter, topic_matches};

/// One message as handed to a handler. The payload is opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Per-subscription callback. Invoked once per delivered message.
pub type Handler = Arc<dyn Fn(Delivery) -> HandlerFuture + Send + Sync>;

pub trait MessageBus: Send {
    /// Register `handler` for `filter` and ask the bus to deliver matching
    /// messages at `quality`.
    ///
    /// Resolves once the subscription is in effect.
    fn subscribe<'a>(
        &'a mut self,
        filter: &'a str,
        quality: DeliveryQuality,
        handler: Handler,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
