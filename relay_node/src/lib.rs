//! Crowdfund relay
//!
//! Relays the state and events of the deployed crowdfunding contract on
//! Avalanche Fuji to browsers, and provides the client-side facade that
//! talks to the relay and to the user's wallet.
//!
//! ```text
//!  Fuji node ──HTTP──▶ ChainReader ──▶ GET /api/contract/state
//!            ──WS────▶ EventListener ─▶ SubscriptionBroker ─▶ GET /api/contract/events (SSE)
//!
//!  ClientFacade ──▶ relay HTTP/SSE (reads, events)
//!               ──▶ wallet (network switch, signed writes)
//! ```

pub mod api;
pub mod chain;
pub mod config;
pub mod facade;
pub mod relay;
pub mod types;
pub mod units;

pub use api::server::{create_router, start_relay_server, AppState};
pub use chain::reader::{ChainError, ChainReader, ContractReader};
pub use config::{NetworkParams, RelayConfig};
pub use facade::{BackendClient, ClientFacade, EventHandlers, FacadeError};
pub use relay::broker::{Subscription, SubscriptionBroker};
pub use relay::listener::EventListener;
pub use types::{BackerAmount, BackerPayload, ContractSnapshot, MilestonePayload, RelayEvent};
