//! Event fan-out from the chain to SSE clients

pub mod broker;
pub mod listener;

pub use broker::{ConnectionId, Subscription, SubscriptionBroker};
pub use listener::{forward_events, EventListener};
