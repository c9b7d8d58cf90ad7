//! Server-Sent Events bridge for contract events

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use log::{error, info};
use std::convert::Infallible;

use crate::api::server::AppState;
use crate::types::RelayEvent;

/// `GET /api/contract/events`
///
/// Registers a listener for this connection only. The subscription lives
/// inside the response stream, so when the client goes away and axum drops
/// the stream, exactly this connection's listener is removed.
pub async fn stream_contract_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broker.subscribe();
    info!(
        "SSE client {} connected ({} listening)",
        subscription.id(),
        state.broker.listener_count()
    );

    // flushes headers and a first frame right away
    let greeting = futures::stream::once(async {
        Ok::<_, Infallible>(Event::default().comment("connected"))
    });
    let events = subscription.map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

    Sse::new(greeting.chain(events)).keep_alive(KeepAlive::default())
}

/// Named frame: `event: <Solidity event name>` with the JSON payload as data
pub fn to_sse_event(event: &RelayEvent) -> Event {
    match event.payload_json() {
        Ok(data) => Event::default().event(event.name()).data(data),
        Err(e) => {
            error!("Failed to serialize {} payload: {}", event.name(), e);
            Event::default().comment("dropped unserializable event")
        }
    }
}
