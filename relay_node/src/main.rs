use anyhow::Result;
use clap::Parser;
use crowdfund_relay::{start_relay_server, RelayConfig};
use log::info;
use std::path::PathBuf;

/// Crowdfund relay arguments
#[derive(Parser)]
#[clap(name = "crowdfund-relay")]
#[clap(about = "Relays crowdfunding contract state and events from Avalanche Fuji to browsers")]
struct Args {
    /// Path to a YAML configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// HTTP port to listen on
    #[clap(long)]
    port: Option<u16>,

    /// JSON-RPC HTTP endpoint for contract reads
    #[clap(long)]
    rpc_url: Option<String>,

    /// JSON-RPC WebSocket endpoint for contract events
    #[clap(long)]
    ws_url: Option<String>,

    /// Address of the deployed crowdfunding contract
    #[clap(long)]
    contract_address: Option<String>,
}

impl Args {
    fn load_config(self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)?,
            None => RelayConfig::default(),
        };
        config.apply_env()?;

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = self.rpc_url {
            config.rpc_url = url;
        }
        if let Some(url) = self.ws_url {
            config.ws_url = url;
        }
        if let Some(address) = self.contract_address {
            config.contract_address = address;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Args::parse().load_config()?;
    info!(
        "Starting crowdfund relay for {} on {} (chain {})",
        config.contract_address, config.network.chain_name, config.network.chain_id
    );

    start_relay_server(config).await
}
