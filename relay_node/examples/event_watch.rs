//! Print the contract snapshot, then follow contract events from a relay.
//!
//! ```text
//! RUST_LOG=info cargo run --example event_watch -- http://127.0.0.1:5000
//! ```

use crowdfund_relay::{BackendClient, EventHandlers};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
    let client = BackendClient::new(base_url.clone())?;

    let info = client.contract_info().await?;
    println!("Contract {} on {} ({})", info.address, info.chain_name, info.chain_id_hex);

    let state = client.contract_state().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);

    let handlers = EventHandlers::new()
        .on_funded(|e| println!("Funded: {} contributed {} AVAX", e.backer, e.amount_eth))
        .on_refunded(|e| println!("Refunded: {} received {} AVAX", e.backer, e.amount_eth))
        .on_milestone_completed(|e| {
            println!("Milestone {} completed, paid out {} AVAX", e.milestone_index, e.payout_eth)
        });

    let subscription = client.subscribe_events(handlers).await?;
    info!("Watching events from {} (Ctrl+C to stop)", base_url);

    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();
    println!("Unsubscribed");
    Ok(())
}
