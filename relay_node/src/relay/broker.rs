//! Subscription broker
//!
//! Owns the registry of per-connection listeners fed by the single shared
//! contract subscription. Each SSE connection holds a [`Subscription`];
//! dropping it removes that connection's listener and nothing else.

use futures::Stream;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::types::RelayEvent;

pub type ConnectionId = u64;

pub struct SubscriptionBroker {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<RelayEvent>>>,
}

impl SubscriptionBroker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new listener. It stays registered until the returned
    /// subscription is dropped or [`unsubscribe`](Self::unsubscribe) is called.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.write().insert(id, sender);
        debug!("SSE listener {} registered", id);

        Subscription {
            id,
            receiver,
            broker: Arc::clone(self),
        }
    }

    /// Remove exactly one listener; returns whether it was registered
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!("SSE listener {} removed", id);
        }
        removed
    }

    /// Hand `event` to every registered listener; returns how many accepted it
    pub fn publish(&self, event: &RelayEvent) -> usize {
        let listeners = self.listeners.read();
        let mut delivered = 0;
        for (id, sender) in listeners.iter() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("SSE listener {} is closing, skipped {}", id, event.name());
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for SubscriptionBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// One connection's view of the relayed events
pub struct Subscription {
    id: ConnectionId,
    receiver: mpsc::UnboundedReceiver<RelayEvent>,
    broker: Arc<SubscriptionBroker>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<RelayEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<RelayEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = RelayEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, U256};

    fn funded(amount: u64) -> RelayEvent {
        RelayEvent::funded(Address::repeat_byte(0xab), U256::from(amount))
    }

    #[tokio::test]
    async fn test_publish_reaches_every_listener() {
        let broker = Arc::new(SubscriptionBroker::new());
        let mut a = broker.subscribe();
        let mut b = broker.subscribe();
        assert_ne!(a.id(), b.id());

        assert_eq!(broker.publish(&funded(1)), 2);
        assert_eq!(a.recv().await, Some(funded(1)));
        assert_eq!(b.recv().await, Some(funded(1)));
    }

    #[tokio::test]
    async fn test_drop_removes_only_that_listener() {
        let broker = Arc::new(SubscriptionBroker::new());
        let a = broker.subscribe();
        let mut b = broker.subscribe();
        assert_eq!(broker.listener_count(), 2);

        drop(a);
        assert_eq!(broker.listener_count(), 1);

        assert_eq!(broker.publish(&funded(7)), 1);
        assert_eq!(b.recv().await, Some(funded(7)));
    }

    #[tokio::test]
    async fn test_events_keep_emission_order() {
        let broker = Arc::new(SubscriptionBroker::new());
        let mut sub = broker.subscribe();
        for amount in 1..=5 {
            broker.publish(&funded(amount));
        }
        for amount in 1..=5 {
            assert_eq!(sub.recv().await, Some(funded(amount)));
        }
    }

    #[test]
    fn test_repeated_connect_disconnect_does_not_leak() {
        let broker = Arc::new(SubscriptionBroker::new());
        let keeper = broker.subscribe();
        for _ in 0..100 {
            let sub = broker.subscribe();
            drop(sub);
        }
        assert_eq!(broker.listener_count(), 1);
        assert!(!broker.unsubscribe(keeper.id() + 1));
        assert!(broker.unsubscribe(keeper.id()));
        assert_eq!(broker.listener_count(), 0);
    }

    #[test]
    fn test_publish_without_listeners() {
        let broker = SubscriptionBroker::new();
        assert_eq!(broker.publish(&funded(1)), 0);
    }
}
