//! Client facade
//!
//! What a dapp front end needs in one place: reads and event subscriptions
//! go through the relay, writes go through the user's wallet after making
//! sure it is on the contract's network.

pub mod backend;
pub mod in_flight;
pub mod network;
pub mod sse;
pub mod wallet;

use ethers::contract::{ContractCall, ContractError};
use ethers::abi::Detokenize;
use ethers::providers::Middleware;
use ethers::types::{Address, TransactionReceipt, U256, U64};
use log::{info, warn};
use thiserror::Error;

pub use backend::{BackendClient, EventHandlers, EventSubscription};
pub use in_flight::WriteOp;
pub use network::ensure_network;
pub use wallet::{LocalKeyWallet, RpcWallet, WalletError, WalletProvider};

use crate::chain::contract::Crowdfunding;
use crate::config::NetworkParams;
use crate::types::ContractSnapshot;
use in_flight::InFlight;

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Relay returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("Invalid relay response: {0}")]
    Decode(String),
    #[error("Contract call failed: {0}")]
    Contract(String),
    #[error("A {0} transaction is already pending")]
    AlreadyPending(WriteOp),
    #[error("Transaction was dropped before confirmation")]
    TransactionDropped,
}

impl<M: Middleware> From<ContractError<M>> for FacadeError {
    fn from(err: ContractError<M>) -> Self {
        FacadeError::Contract(err.to_string())
    }
}

pub struct ClientFacade<W: WalletProvider> {
    wallet: W,
    backend: BackendClient,
    network: NetworkParams,
    contract_address: Address,
    in_flight: InFlight,
}

impl<W: WalletProvider> ClientFacade<W> {
    pub fn new(
        wallet: W,
        backend: BackendClient,
        network: NetworkParams,
        contract_address: Address,
    ) -> Self {
        Self {
            wallet,
            backend,
            network,
            contract_address,
            in_flight: InFlight::default(),
        }
    }

    /// Build a facade from the contract address and network the relay reports
    pub async fn connect(wallet: W, backend: BackendClient) -> Result<Self, FacadeError> {
        let info = backend.contract_info().await?;
        let contract_address = info
            .address
            .parse::<Address>()
            .map_err(|e| FacadeError::Decode(format!("contract address {}: {}", info.address, e)))?;
        let network = NetworkParams {
            chain_id: info.chain_id,
            chain_name: info.chain_name,
            rpc_url: info.rpc_url,
            explorer_url: info.explorer_url,
            native_currency: info.native_currency,
        };
        Ok(Self::new(wallet, backend, network, contract_address))
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn network(&self) -> &NetworkParams {
        &self.network
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn is_pending(&self, op: WriteOp) -> bool {
        self.in_flight.is_pending(op)
    }

    /// Switch the wallet to the contract's network, adding it if needed
    pub async fn ensure_network(&self) -> Result<(), FacadeError> {
        Ok(ensure_network(&self.wallet, &self.network).await?)
    }

    /// Contribute `value` wei
    pub async fn fund(&self, value: U256) -> Result<TransactionReceipt, FacadeError> {
        let _guard = self.in_flight.begin(WriteOp::Fund)?;
        let contract = self.contract_for_write().await?;
        self.submit(WriteOp::Fund, contract.fund().value(value)).await
    }

    pub async fn complete_milestone(&self) -> Result<TransactionReceipt, FacadeError> {
        let _guard = self.in_flight.begin(WriteOp::CompleteMilestone)?;
        let contract = self.contract_for_write().await?;
        self.submit(WriteOp::CompleteMilestone, contract.complete_milestone())
            .await
    }

    pub async fn refund(&self) -> Result<TransactionReceipt, FacadeError> {
        let _guard = self.in_flight.begin(WriteOp::Refund)?;
        let contract = self.contract_for_write().await?;
        self.submit(WriteOp::Refund, contract.refund()).await
    }

    pub async fn contract_state(&self) -> Result<ContractSnapshot, FacadeError> {
        self.backend.contract_state().await
    }

    pub async fn backer_amount(&self, backer: Address) -> Result<U256, FacadeError> {
        self.backend.backer_amount(backer).await
    }

    pub async fn subscribe_events(
        &self,
        handlers: EventHandlers,
    ) -> Result<EventSubscription, FacadeError> {
        self.backend.subscribe_events(handlers).await
    }

    async fn contract_for_write(&self) -> Result<Crowdfunding<W::Signer>, FacadeError> {
        self.ensure_network().await?;
        let signer = self.wallet.signer().await?;
        Ok(Crowdfunding::new(self.contract_address, signer))
    }

    async fn submit<D: Detokenize>(
        &self,
        op: WriteOp,
        call: ContractCall<W::Signer, D>,
    ) -> Result<TransactionReceipt, FacadeError> {
        let pending = call.send().await?;
        info!("{} submitted: {:?}", op, pending.tx_hash());

        let receipt = pending
            .confirmations(1)
            .await
            .map_err(|e| FacadeError::Contract(e.to_string()))?
            .ok_or(FacadeError::TransactionDropped)?;

        if receipt.status == Some(U64::zero()) {
            warn!("{} reverted in {:?}", op, receipt.transaction_hash);
        } else {
            info!("{} confirmed in block {:?}", op, receipt.block_number);
        }
        Ok(receipt)
    }
}
