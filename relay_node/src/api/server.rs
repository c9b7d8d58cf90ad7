use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::Method,
    response::Json,
    routing::get,
    Router,
};
use ethers::types::Address;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{contract, events};
use crate::chain::reader::{ChainReader, ContractReader};
use crate::config::{NetworkParams, RelayConfig};
use crate::relay::broker::SubscriptionBroker;
use crate::relay::listener::EventListener;

// Application State
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn ChainReader>,
    pub broker: Arc<SubscriptionBroker>,
    pub contract_address: Address,
    pub network: NetworkParams,
}

impl AppState {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        broker: Arc<SubscriptionBroker>,
        contract_address: Address,
        network: NetworkParams,
    ) -> Self {
        Self {
            reader,
            broker,
            contract_address,
            network,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub listeners: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        listeners: state.broker.listener_count(),
    })
}

/// Create the router with all relay routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Contract reads
        .route("/api/contract/state", get(contract::get_contract_state))
        .route("/api/contract/backers/:address", get(contract::get_backer_amount))
        .route("/api/contract/info", get(contract::get_contract_info))
        // Contract events
        .route("/api/contract/events", get(events::stream_contract_events))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the relay on an already bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = create_router(state);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Start the relay: chain reader, event listener and HTTP server
pub async fn start_relay_server(config: RelayConfig) -> Result<()> {
    let contract_address = config.contract_address()?;

    let reader = ContractReader::connect(&config.rpc_url, contract_address)
        .with_context(|| format!("connecting to {}", config.rpc_url))?;
    let broker = Arc::new(SubscriptionBroker::new());

    EventListener::new(config.ws_url.clone(), contract_address, broker.clone()).spawn();

    let state = AppState::new(
        Arc::new(reader),
        broker,
        contract_address,
        config.network.clone(),
    );

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Crowdfund relay listening on http://{}", addr);
    info!("  GET  /api/contract/state              - Contract snapshot");
    info!("  GET  /api/contract/backers/:address   - Contribution of one backer");
    info!("  GET  /api/contract/events             - Contract events (SSE)");
    info!("  GET  /api/contract/info               - Contract address and network");

    serve(listener, state).await
}
