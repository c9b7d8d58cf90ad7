//! HTTP and SSE client for the relay

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::sse::SseDecoder;
use super::FacadeError;
use crate::api::errors::ApiError;
use crate::api::handlers::contract::ContractInfo;
use crate::types::{BackerAmount, BackerPayload, ContractSnapshot, MilestonePayload, RelayEvent};

/// Relay API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FacadeError> {
        // no overall timeout: the event stream stays open indefinitely
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FacadeError> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Current contract snapshot
    pub async fn contract_state(&self) -> Result<ContractSnapshot, FacadeError> {
        self.get_json("/api/contract/state").await
    }

    /// Amount contributed by `backer`
    pub async fn backer_amount(&self, backer: Address) -> Result<U256, FacadeError> {
        let path = format!("/api/contract/backers/{}", to_checksum(&backer, None));
        let body: BackerAmount = self.get_json(&path).await?;
        Ok(body.amount)
    }

    /// Contract address and network parameters the relay serves
    pub async fn contract_info(&self) -> Result<ContractInfo, FacadeError> {
        self.get_json("/api/contract/info").await
    }

    /// Open the event stream and dispatch each event to `handlers`
    ///
    /// Resolves once the relay has accepted the connection. The stream is not
    /// reopened if it breaks; errors are logged and dispatching stops.
    pub async fn subscribe_events(
        &self,
        handlers: EventHandlers,
    ) -> Result<EventSubscription, FacadeError> {
        let response = self
            .client
            .get(self.url("/api/contract/events"))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check_status(response).await?;
        info!("Subscribed to contract events at {}", self.base_url);

        let task = tokio::spawn(pump_events(response, handlers));
        Ok(EventSubscription { task })
    }
}

async fn check_status(response: Response) -> Result<Response, FacadeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(FacadeError::Backend {
        status: status.as_u16(),
        message,
    })
}

async fn pump_events(response: Response, handlers: EventHandlers) {
    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                error!("Contract event stream failed: {}", e);
                return;
            }
        };
        for frame in decoder.feed(&chunk) {
            match RelayEvent::from_named(&frame.event, &frame.data) {
                Ok(Some(event)) => {
                    handlers.dispatch(&event);
                }
                Ok(None) => debug!("Ignoring SSE event '{}'", frame.event),
                Err(e) => warn!("Malformed {} payload: {}", frame.event, e),
            }
        }
    }
    warn!("Contract event stream closed by the relay");
}

/// Handle to an open event stream; dropping it also closes the stream
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type Handler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Callbacks keyed by event type; events without a callback are skipped
#[derive(Default)]
pub struct EventHandlers {
    funded: Option<Handler<BackerPayload>>,
    refunded: Option<Handler<BackerPayload>>,
    milestone_completed: Option<Handler<MilestonePayload>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_funded(mut self, handler: impl Fn(&BackerPayload) + Send + Sync + 'static) -> Self {
        self.funded = Some(Box::new(handler));
        self
    }

    pub fn on_refunded(mut self, handler: impl Fn(&BackerPayload) + Send + Sync + 'static) -> Self {
        self.refunded = Some(Box::new(handler));
        self
    }

    pub fn on_milestone_completed(
        mut self,
        handler: impl Fn(&MilestonePayload) + Send + Sync + 'static,
    ) -> Self {
        self.milestone_completed = Some(Box::new(handler));
        self
    }

    /// Run the callback registered for `event`; returns whether one ran
    pub fn dispatch(&self, event: &RelayEvent) -> bool {
        match event {
            RelayEvent::Funded(payload) => self.funded.as_ref().map(|h| h(payload)).is_some(),
            RelayEvent::Refunded(payload) => self.refunded.as_ref().map(|h| h(payload)).is_some(),
            RelayEvent::MilestoneCompleted(payload) => self
                .milestone_completed
                .as_ref()
                .map(|h| h(payload))
                .is_some(),
        }
    }
}
