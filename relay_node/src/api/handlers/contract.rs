//! Contract read endpoints

use axum::extract::{Path, State};
use axum::Json;
use ethers::utils::to_checksum;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_address;
use crate::config::NativeCurrency;
use crate::types::{BackerAmount, ContractSnapshot};

/// `GET /api/contract/state`
pub async fn get_contract_state(State(state): State<AppState>) -> ApiResult<Json<ContractSnapshot>> {
    let snapshot = state.reader.snapshot().await.map_err(|e| {
        error!("Failed to read contract state: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(snapshot))
}

/// `GET /api/contract/backers/:address`
pub async fn get_backer_amount(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<BackerAmount>> {
    let backer = validate_address(&address)?;

    let amount = state.reader.backer_amount(backer).await.map_err(|e| {
        error!("Failed to read backer amount for {}: {}", address, e);
        ApiError::from(e)
    })?;

    info!("Backer {} has contributed {}", address, amount);
    Ok(Json(BackerAmount { address, amount }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub address: String,
    pub chain_id: u64,
    pub chain_id_hex: String,
    pub chain_name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
}

/// `GET /api/contract/info`: where the contract lives, so clients don't hardcode it
pub async fn get_contract_info(State(state): State<AppState>) -> Json<ContractInfo> {
    let network = &state.network;
    Json(ContractInfo {
        address: to_checksum(&state.contract_address, None),
        chain_id: network.chain_id,
        chain_id_hex: network.chain_id_hex(),
        chain_name: network.chain_name.clone(),
        rpc_url: network.rpc_url.clone(),
        explorer_url: network.explorer_url.clone(),
        native_currency: network.native_currency.clone(),
    })
}
