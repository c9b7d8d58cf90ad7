//! Contract event listener
//!
//! Holds the one WebSocket subscription to the chain node and fans every
//! decoded event out through the broker. There is no resubscription: when
//! the upstream stream ends, relaying stops until the process restarts.

use ethers::providers::{Provider, Ws};
use ethers::types::Address;
use futures::{Stream, StreamExt};
use log::{error, info, warn};
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::broker::SubscriptionBroker;
use crate::chain::contract::{Crowdfunding, CrowdfundingEvents};
use crate::chain::reader::ChainError;
use crate::types::RelayEvent;

pub struct EventListener {
    ws_url: String,
    contract_address: Address,
    broker: Arc<SubscriptionBroker>,
}

impl EventListener {
    pub fn new(ws_url: String, contract_address: Address, broker: Arc<SubscriptionBroker>) -> Self {
        Self {
            ws_url,
            contract_address,
            broker,
        }
    }

    /// Connect, subscribe and relay until the upstream stream ends
    pub async fn run(self) -> Result<(), ChainError> {
        let provider = Provider::<Ws>::connect(&self.ws_url)
            .await
            .map_err(|e| ChainError::Provider(format!("{}: {}", self.ws_url, e)))?;
        let contract = Crowdfunding::new(self.contract_address, Arc::new(provider));

        let events = contract.events();
        let stream = events
            .subscribe()
            .await
            .map_err(|e| ChainError::Subscription(e.to_string()))?;

        info!(
            "Listening for Funded/Refunded/MilestoneCompleted on {:?}",
            self.contract_address
        );

        let relayed = forward_events(Box::pin(stream), &self.broker).await;

        warn!(
            "Contract event subscription ended after {} events; SSE clients receive nothing further until restart",
            relayed
        );
        Ok(())
    }

    /// Run on the tokio runtime, logging a failure to subscribe
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!("Contract event listener stopped: {}", e);
            }
        })
    }
}

/// Publish each decoded event in arrival order; returns how many were relayed.
/// Undecodable items are logged and skipped.
pub async fn forward_events<S, E>(mut stream: S, broker: &SubscriptionBroker) -> usize
where
    S: Stream<Item = Result<CrowdfundingEvents, E>> + Unpin,
    E: Display,
{
    let mut relayed = 0;
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                let event = RelayEvent::from(event);
                let listeners = broker.publish(&event);
                info!("Relayed {} to {} listeners", event.name(), listeners);
                relayed += 1;
            }
            Err(e) => warn!("Failed to decode contract event: {}", e),
        }
    }
    relayed
}
