//! Wallet network check and switch

use log::info;
use serde_json::{json, Value};

use super::wallet::{WalletError, WalletProvider};
use crate::config::NetworkParams;

/// Chain id the wallet reports, accepting hex strings and plain numbers
pub async fn current_chain_id<W: WalletProvider + ?Sized>(wallet: &W) -> Result<u64, WalletError> {
    let value = wallet.request("eth_chainId", json!([])).await?;
    parse_chain_id(&value)
}

fn parse_chain_id(value: &Value) -> Result<u64, WalletError> {
    let invalid = || WalletError::internal(format!("unexpected eth_chainId response: {}", value));
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| invalid()),
                None => raw.parse().map_err(|_| invalid()),
            }
        }
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Put the wallet on `network`, registering the chain first if the wallet
/// does not know it
///
/// Only an unrecognized-chain failure triggers `wallet_addEthereumChain`;
/// any other switch failure, such as the user declining, is returned as is.
pub async fn ensure_network<W: WalletProvider + ?Sized>(
    wallet: &W,
    network: &NetworkParams,
) -> Result<(), WalletError> {
    let current = current_chain_id(wallet).await?;
    if current == network.chain_id {
        return Ok(());
    }

    let target = network.chain_id_hex();
    info!("Wallet is on chain {}, switching to {} ({})", current, target, network.chain_name);

    let switch_params = json!([{ "chainId": target }]);
    match wallet
        .request("wallet_switchEthereumChain", switch_params.clone())
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if e.code == WalletError::UNRECOGNIZED_CHAIN => {
            info!("Wallet does not know {}, adding it", network.chain_name);
            wallet
                .request("wallet_addEthereumChain", json!([network.add_chain_params()]))
                .await?;
            wallet
                .request("wallet_switchEthereumChain", switch_params)
                .await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
