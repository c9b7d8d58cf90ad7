//! Relay configuration
//!
//! Defaults target Avalanche Fuji. A YAML file can replace any of them,
//! then `RELAY_*` environment variables and command-line flags override
//! individual fields.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Avalanche Fuji C-Chain id
pub const FUJI_CHAIN_ID: u64 = 43113;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid contract address '{0}'")]
    InvalidContractAddress(String),
    #[error("Contract address is not configured (set RELAY_CONTRACT_ADDRESS or --contract-address)")]
    MissingContractAddress,
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Native currency metadata, as wallets expect it in `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of the network the contract lives on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
}

impl NetworkParams {
    pub fn fuji() -> Self {
        Self {
            chain_id: FUJI_CHAIN_ID,
            chain_name: "Avalanche Fuji Testnet".to_string(),
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
            explorer_url: "https://testnet.snowtrace.io/".to_string(),
            native_currency: NativeCurrency {
                name: "Avalanche".to_string(),
                symbol: "AVAX".to_string(),
                decimals: 18,
            },
        }
    }

    /// Chain id in the `0x`-prefixed hex form used by wallet RPC methods
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Parameter object for `wallet_addEthereumChain`
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
        })
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::fuji()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Interface the HTTP server binds to
    pub bind_address: String,
    /// HTTP port
    pub port: u16,
    /// JSON-RPC HTTP endpoint used for view calls
    pub rpc_url: String,
    /// JSON-RPC WebSocket endpoint used for the event subscription
    pub ws_url: String,
    /// Deployed crowdfunding contract
    pub contract_address: String,
    pub network: NetworkParams,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let network = NetworkParams::fuji();
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            rpc_url: network.rpc_url.clone(),
            ws_url: "wss://api.avax-test.network/ext/bc/C/ws".to_string(),
            contract_address: String::new(),
            network,
        }
    }
}

impl RelayConfig {
    /// Load from a YAML file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Apply `RELAY_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("RELAY_RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(url) = lookup("RELAY_WS_URL") {
            self.ws_url = url;
        }
        if let Some(address) = lookup("RELAY_CONTRACT_ADDRESS") {
            self.contract_address = address;
        }
        if let Some(bind) = lookup("RELAY_BIND_ADDRESS") {
            self.bind_address = bind;
        }
        if let Some(port) = lookup("RELAY_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "RELAY_PORT",
                value: port,
            })?;
        }
        Ok(())
    }

    /// Parsed contract address; an unset or zero address is an error
    pub fn contract_address(&self) -> Result<Address, ConfigError> {
        if self.contract_address.trim().is_empty() {
            return Err(ConfigError::MissingContractAddress);
        }
        let address = self
            .contract_address
            .trim()
            .parse::<Address>()
            .map_err(|_| ConfigError::InvalidContractAddress(self.contract_address.clone()))?;
        if address.is_zero() {
            return Err(ConfigError::MissingContractAddress);
        }
        Ok(address)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
