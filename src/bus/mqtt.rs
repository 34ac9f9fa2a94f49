// src/bus/mqtt.rs

//! MQTT implementation of [`MessageBus`] on top of `rumqttc`.
//!
//! `rumqttc` only makes progress while its `EventLoop` is polled. After the
//! initial CONNACK, a background pump task owns the event loop and:
//! - routes every incoming PUBLISH through the shared [`TopicRouter`],
//! - forwards the packet id of each caller-issued SUBSCRIBE and its SUBACK so
//!   `subscribe` can confirm its own request,
//! - re-subscribes all filters when the broker reconnects us without a
//!   resumed session,
//! - keeps polling after connection errors, which makes `rumqttc` reconnect.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, SubAck,
    SubscribeReasonCode, Transport,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

use super::router::TopicRouter;
use super::{Handler, MessageBus};
use crate::cli::CliArgs;
use crate::errors::{DispatchError, Result};
use crate::types::DeliveryQuality;

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TLS_PORT: u16 = 8883;
const REQUEST_CAPACITY: usize = 64;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SUBACK_TIMEOUT: Duration = Duration::from_secs(10);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_QUIESCE: Duration = Duration::from_millis(250);

/// Everything needed to open a broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub client_id: String,
    /// `(username, password)`; omitted from CONNECT when `None`.
    pub credentials: Option<(String, String)>,
    pub keep_alive: Duration,
}

impl BrokerSettings {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let address = parse_broker_address(&args.host)?;
        // rumqttc panics on these instead of returning an error.
        if args.client_id.is_empty() || args.client_id.starts_with(' ') {
            return Err(DispatchError::ConfigError(format!(
                "invalid MQTT client id '{}'",
                args.client_id
            )));
        }
        let credentials = if args.username.is_empty() {
            None
        } else {
            Some((args.username.clone(), args.password.clone()))
        };

        Ok(Self {
            host: address.host,
            port: address.port,
            tls: address.tls,
            client_id: args.client_id.clone(),
            credentials,
            keep_alive: Duration::from_secs(30),
        })
    }
}

/// A parsed `--host` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

/// Parse a broker address such as `tcp://localhost:1883` or `ssl://[::1]`.
///
/// `tcp://`, `mqtt://` or no scheme select plain TCP on port 1883 by default;
/// `ssl://`, `tls://` and `mqtts://` select TLS on port 8883. IPv6 literals
/// must be bracketed and are returned without the brackets.
pub fn parse_broker_address(addr: &str) -> Result<BrokerAddress> {
    let trimmed = addr.trim();
    let (rest, tls) = match trimmed.split_once("://") {
        Some(("tcp" | "mqtt", rest)) => (rest, false),
        Some(("ssl" | "tls" | "mqtts", rest)) => (rest, true),
        Some((scheme, _)) => {
            return Err(DispatchError::ConfigError(format!(
                "unsupported broker scheme '{scheme}' in '{addr}' \
                 (expected tcp://, mqtt://, ssl://, tls:// or mqtts://)"
            )));
        }
        None => (trimmed, false),
    };
    let rest = rest.trim_end_matches('/');

    let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or_else(|| {
            DispatchError::ConfigError(format!("unterminated IPv6 address in '{addr}'"))
        })?;
        match after {
            "" => (host, None),
            _ => match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => {
                    return Err(DispatchError::ConfigError(format!(
                        "unexpected '{after}' after IPv6 address in '{addr}'"
                    )));
                }
            },
        }
    } else {
        match rest.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (rest, None),
        }
    };

    let port = match port {
        Some(port) => port.parse::<u16>().map_err(|e| {
            DispatchError::ConfigError(format!("invalid broker port '{port}' in '{addr}': {e}"))
        })?,
        None if tls => DEFAULT_TLS_PORT,
        None => DEFAULT_PORT,
    };

    if host.is_empty() {
        return Err(DispatchError::ConfigError(format!(
            "missing broker host in '{addr}'"
        )));
    }

    Ok(BrokerAddress {
        host: host.to_string(),
        port,
        tls,
    })
}

/// What the event pump reports back to a pending `subscribe`.
#[derive(Debug)]
enum SubscribeEvent {
    /// A caller-issued SUBSCRIBE was written with this packet id.
    Sent(u16),
    Acked(SubAck),
}

pub struct MqttBus {
    client: AsyncClient,
    router: Arc<RwLock<TopicRouter>>,
    subscribe_rx: mpsc::Receiver<SubscribeEvent>,
    pump: JoinHandle<()>,
}

impl MqttBus {
    /// Open a session and wait for the broker to accept it.
    ///
    /// Connection refusal or an unreachable broker is returned as an error;
    /// only after a successful CONNACK does the background pump take over.
    pub async fn connect(settings: &BrokerSettings) -> Result<Self> {
        let mut options = MqttOptions::new(
            settings.client_id.clone(),
            settings.host.clone(),
            settings.port,
        );
        options.set_keep_alive(settings.keep_alive);
        if settings.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        if let Some((username, password)) = &settings.credentials {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        info!(host = %settings.host, port = settings.port, tls = settings.tls, client_id = %settings.client_id, "connecting to broker");
        timeout(CONNECT_TIMEOUT, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| {
                DispatchError::BusError(format!(
                    "no CONNACK from {}:{} within {:?}",
                    settings.host, settings.port, CONNECT_TIMEOUT
                ))
            })??;
        info!("connected to broker");

        let router = Arc::new(RwLock::new(TopicRouter::new()));
        let (subscribe_tx, subscribe_rx) = mpsc::channel(REQUEST_CAPACITY);
        let pump = tokio::spawn(pump_events(
            eventloop,
            client.clone(),
            Arc::clone(&router),
            subscribe_tx,
        ));

        Ok(Self {
            client,
            router,
            subscribe_rx,
            pump,
        })
    }

    /// Send DISCONNECT and give the pump a short window to flush it.
    pub async fn disconnect(mut self) -> Result<()> {
        self.client.disconnect().await?;
        if timeout(DISCONNECT_QUIESCE, &mut self.pump).await.is_err() {
            debug!("event loop still running after disconnect; aborting it");
            self.pump.abort();
        }
        Ok(())
    }
}

impl MessageBus for MqttBus {
    fn subscribe<'a>(
        &'a mut self,
        filter: &'a str,
        quality: DeliveryQuality,
        handler: Handler,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.router
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .add(filter, quality, handler);

            drain_stale(&mut self.subscribe_rx);
            self.client.subscribe(filter, quality.into()).await?;

            let ack = timeout(SUBACK_TIMEOUT, await_own_suback(&mut self.subscribe_rx, filter))
                .await
                .map_err(|_| {
                    DispatchError::BusError(format!(
                        "no SUBACK for '{filter}' within {SUBACK_TIMEOUT:?}"
                    ))
                })??;

            debug!(filter, %quality, pkid = ack.pkid, "subscription acknowledged");
            Ok(())
        })
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<()> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                return Err(DispatchError::BusError(format!(
                    "broker refused connection: {:?}",
                    ack.code
                )));
            }
            other => trace!(?other, "event before CONNACK"),
        }
    }
}

/// Drop events left over from earlier requests, e.g. a SUBACK that arrived
/// after its `subscribe` call had already timed out.
fn drain_stale(rx: &mut mpsc::Receiver<SubscribeEvent>) {
    while let Ok(event) = rx.try_recv() {
        trace!(?event, "discarding stale subscribe event");
    }
}

/// Wait for the SUBACK that answers the next caller-issued SUBSCRIBE and
/// fail if the broker rejected it.
async fn await_own_suback(
    rx: &mut mpsc::Receiver<SubscribeEvent>,
    filter: &str,
) -> Result<SubAck> {
    let mut own_pkid = None;

    while let Some(event) = rx.recv().await {
        match event {
            SubscribeEvent::Sent(pkid) if own_pkid.is_none() => own_pkid = Some(pkid),
            SubscribeEvent::Acked(ack) if Some(ack.pkid) == own_pkid => {
                if ack.return_codes.contains(&SubscribeReasonCode::Failure) {
                    return Err(DispatchError::BusError(format!(
                        "broker rejected subscription to '{filter}'"
                    )));
                }
                return Ok(ack);
            }
            other => trace!(?other, filter, "ignoring subscribe event for another request"),
        }
    }

    Err(DispatchError::BusError(
        "MQTT event loop stopped before SUBACK".to_string(),
    ))
}

/// Tells SUBSCRIBE/SUBACK traffic issued by [`resubscribe`] apart from
/// caller-issued subscriptions.
///
/// Requests leave the client queue in order, so the next `n` outgoing
/// SUBSCRIBE packets after `expect_resubscribes(n)` are the pump's own.
#[derive(Debug, Default)]
struct SubscribeTracker {
    resubscribes_unsent: usize,
    resubscribe_pkids: HashSet<u16>,
}

impl SubscribeTracker {
    fn expect_resubscribes(&mut self, n: usize) {
        self.resubscribes_unsent += n;
    }

    /// Returns the packet id when the SUBSCRIBE belongs to a caller.
    fn on_outgoing(&mut self, pkid: u16) -> Option<u16> {
        if self.resubscribes_unsent > 0 {
            self.resubscribes_unsent -= 1;
            self.resubscribe_pkids.insert(pkid);
            None
        } else {
            Some(pkid)
        }
    }

    /// Returns the SUBACK when it answers a caller-issued SUBSCRIBE.
    fn on_ack(&mut self, ack: SubAck) -> Option<SubAck> {
        if self.resubscribe_pkids.remove(&ack.pkid) {
            None
        } else {
            Some(ack)
        }
    }

    /// Unsent requests do not survive into a new session.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

async fn pump_events(
    mut eventloop: EventLoop,
    client: AsyncClient,
    router: Arc<RwLock<TopicRouter>>,
    subscribe_tx: mpsc::Sender<SubscribeEvent>,
) {
    debug!("MQTT event loop started");
    let mut tracker = SubscribeTracker::default();

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                trace!(topic = %publish.topic, bytes = publish.payload.len(), "publish received");
                route_publish(&router, &publish.topic, &publish.payload);
            }
            Ok(Event::Outgoing(Outgoing::Subscribe(pkid))) => {
                if let Some(pkid) = tracker.on_outgoing(pkid) {
                    forward(&subscribe_tx, SubscribeEvent::Sent(pkid));
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                let rejected = ack.return_codes.contains(&SubscribeReasonCode::Failure);
                let pkid = ack.pkid;
                match tracker.on_ack(ack) {
                    Some(ack) => forward(&subscribe_tx, SubscribeEvent::Acked(ack)),
                    None if rejected => error!(pkid, "broker rejected a re-subscription"),
                    None => trace!(pkid, "re-subscription acknowledged"),
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(session_present = ack.session_present, "reconnected to broker");
                if !ack.session_present {
                    tracker.reset();
                    tracker.expect_resubscribes(resubscribe(&client, &router));
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("disconnect sent; stopping MQTT event loop");
                break;
            }
            Ok(other) => trace!(?other, "MQTT event"),
            Err(err) => {
                warn!(error = %err, "MQTT connection error; retrying");
                sleep(RECONNECT_DELAY).await;
            }
        }
    }

    debug!("MQTT event loop finished");
}

fn forward(tx: &mpsc::Sender<SubscribeEvent>, event: SubscribeEvent) {
    if let Err(err) = tx.try_send(event) {
        trace!(event = ?err.into_inner(), "subscribe event not awaited by anyone");
    }
}

fn route_publish(router: &RwLock<TopicRouter>, topic: &str, payload: &[u8]) {
    let router = router.read().unwrap_or_else(PoisonError::into_inner);
    // Handler tasks are detached; each one logs its own outcome.
    drop(router.dispatch(topic, payload));
}

/// Queue a SUBSCRIBE for every routed filter. Returns how many were queued.
fn resubscribe(client: &AsyncClient, router: &RwLock<TopicRouter>) -> usize {
    let router = router.read().unwrap_or_else(PoisonError::into_inner);
    let mut queued = 0;
    for (filter, quality) in router.subscriptions() {
        match client.try_subscribe(filter, quality.into()) {
            Ok(()) => {
                queued += 1;
                debug!(filter, %quality, "re-subscribed after reconnect");
            }
            Err(err) => error!(filter, error = %err, "failed to re-subscribe after reconnect"),
        }
    }
    queued
}
