// src/bus/router.rs

//! Subscription table: topic filters -> handlers.
//!
//! Matching follows MQTT 3.1.1 rules:
//! - `+` matches exactly one level (which may be empty).
//! - `#` must be the last level and matches the parent level and everything
//!   below it (`a/#` matches `a`, `a/b`, `a/b/c`).
//! - Topics beginning with `$` are not matched by a filter whose first level
//!   is a wildcard.

use tokio::task::JoinHandle;
use tracing::debug;

use super::{Delivery, Handler};
use crate::types::DeliveryQuality;

struct Route {
    filter: String,
    quality: DeliveryQuality,
    handler: Handler,
}

#[derive(Default)]
pub struct TopicRouter {
    routes: Vec<Route>,
}

impl std::fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (&r.filter, r.quality)))
            .finish()
    }
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: &str, quality: DeliveryQuality, handler: Handler) {
        self.routes.push(Route {
            filter: filter.to_string(),
            quality,
            handler,
        });
    }

    /// Registered filters with the quality they were subscribed at.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&str, DeliveryQuality)> + '_ {
        self.routes.iter().map(|r| (r.filter.as_str(), r.quality))
    }

    /// Handlers whose filter matches `topic`, in registration order.
    pub fn handlers_for(&self, topic: &str) -> Vec<Handler> {
        self.routes
            .iter()
            .filter(|r| topic_matches(&r.filter, topic))
            .map(|r| Handler::clone(&r.handler))
            .collect()
    }

    /// Run every matching handler on its own Tokio task.
    ///
    /// Deliveries never wait for each other, so a handler that is still busy
    /// with a previous message does not delay the next one.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> Vec<JoinHandle<()>> {
        let handlers = self.handlers_for(topic);
        if handlers.is_empty() {
            debug!(topic, "no subscription matches published topic");
        }

        handlers
            .into_iter()
            .map(|handler| {
                let delivery = Delivery {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                };
                tokio::spawn(handler(delivery))
            })
            .collect()
    }
}

/// Whether `topic` is matched by subscription `filter`.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Whether `filter` is a well-formed subscription filter.
pub fn is_valid_filter(filter: &str) -> bool {
    if filter.is_empty() || filter.contains('\0') {
        return false;
    }

    let level_count = filter.split('/').count();
    filter
        .split('/')
        .enumerate()
        .all(|(idx, level)| match level {
            "#" => idx + 1 == level_count,
            "+" => true,
            other => !other.contains('#') && !other.contains('+'),
        })
}
