//! Wallet provider seam
//!
//! The facade talks to wallets through an EIP-1193 shaped interface:
//! `request(method, params)` for RPC calls such as chain switching, and a
//! middleware that signs and sends contract transactions.

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer as _};
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// EIP-1193 provider error
#[derive(Debug, Clone, Error)]
#[error("wallet error {code}: {message}")]
pub struct WalletError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl WalletError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(rpc) => Self {
                code: rpc.code,
                message: rpc.message.clone(),
                data: rpc.data.clone(),
            },
            None => Self::internal(err.to_string()),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Middleware that signs and broadcasts transactions for the wallet's account
    type Signer: Middleware + 'static;

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;

    async fn signer(&self) -> Result<Arc<Self::Signer>, WalletError>;
}

/// Wallet reachable over JSON-RPC that manages its own keys
///
/// Chain switching and account access are forwarded verbatim; transactions
/// are sent with `eth_sendTransaction` from the first exposed account, so
/// no key material ever passes through this process.
pub struct RpcWallet<P = Http> {
    provider: Provider<P>,
}

impl RpcWallet<Http> {
    pub fn new(url: &str) -> Result<Self, WalletError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| WalletError::internal(format!("invalid wallet url {}: {}", url, e)))?;
        Ok(Self::from_provider(provider))
    }
}

impl<P: JsonRpcClient + Clone + 'static> RpcWallet<P> {
    pub fn from_provider(provider: Provider<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: JsonRpcClient + Clone + 'static> WalletProvider for RpcWallet<P> {
    type Signer = Provider<P>;

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        Ok(self.provider.request(method, params).await?)
    }

    async fn signer(&self) -> Result<Arc<Self::Signer>, WalletError> {
        let accounts: Vec<Address> = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| WalletError::new(WalletError::USER_REJECTED, "wallet exposed no accounts"))?;
        Ok(Arc::new(self.provider.clone().with_sender(account)))
    }
}

/// Wallet backed by a local private key and a single RPC endpoint
///
/// It can only ever be on the chain its endpoint serves, so a switch to any
/// other chain reports the chain as unrecognized and adding chains is not
/// supported.
pub struct LocalKeyWallet {
    provider: Provider<Http>,
    key: LocalWallet,
}

impl LocalKeyWallet {
    pub fn new(rpc_url: &str, private_key: &str) -> Result<Self, WalletError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| WalletError::internal(format!("invalid rpc url {}: {}", rpc_url, e)))?;
        let key = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| WalletError::internal(format!("invalid private key: {}", e)))?;
        Ok(Self { provider, key })
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }
}

#[async_trait]
impl WalletProvider for LocalKeyWallet {
    type Signer = SignerMiddleware<Provider<Http>, LocalWallet>;

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => {
                Ok(json!([to_checksum(&self.key.address(), None)]))
            }
            "wallet_switchEthereumChain" => {
                let current = format!("0x{:x}", self.provider.get_chainid().await?);
                let requested = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if requested.eq_ignore_ascii_case(&current) {
                    Ok(Value::Null)
                } else {
                    Err(WalletError::new(
                        WalletError::UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{}\"", requested),
                    ))
                }
            }
            "wallet_addEthereumChain" => Err(WalletError::new(
                WalletError::UNSUPPORTED_METHOD,
                "local key wallet is bound to its RPC endpoint",
            )),
            _ => Ok(self.provider.request(method, params).await?),
        }
    }

    async fn signer(&self) -> Result<Arc<Self::Signer>, WalletError> {
        let chain_id = self.provider.get_chainid().await?;
        let key = self.key.clone().with_chain_id(chain_id.as_u64());
        Ok(Arc::new(SignerMiddleware::new(self.provider.clone(), key)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{HttpClientError, JsonRpcError};

    #[test]
    fn test_wallet_error_from_rpc_response() {
        let err = ProviderError::from(HttpClientError::JsonRpcError(JsonRpcError {
            code: 4902,
            message: "Unrecognized chain ID".to_string(),
            data: None,
        }));
        let wallet_err = WalletError::from(err);
        assert_eq!(wallet_err.code, WalletError::UNRECOGNIZED_CHAIN);
        assert_eq!(wallet_err.message, "Unrecognized chain ID");
    }

    #[test]
    fn test_wallet_error_from_transport_failure() {
        let err = ProviderError::CustomError("connection refused".to_string());
        let wallet_err = WalletError::from(err);
        assert_eq!(wallet_err.code, WalletError::INTERNAL);
        assert!(wallet_err.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_local_key_wallet_exposes_its_account() {
        // anvil's first default account
        let wallet = LocalKeyWallet::new(
            "http://127.0.0.1:8545",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let accounts = wallet.request("eth_requestAccounts", json!([])).await.unwrap();
        assert_eq!(accounts[0], "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let err = wallet
            .request("wallet_addEthereumChain", json!([{}]))
            .await
            .unwrap_err();
        assert_eq!(err.code, WalletError::UNSUPPORTED_METHOD);
    }

    #[tokio::test]
    async fn test_rpc_wallet_signs_as_first_account() {
        let (provider, mock) = Provider::mocked();
        let accounts = vec![Address::repeat_byte(0x42), Address::repeat_byte(0x43)];
        mock.push::<Vec<Address>, _>(accounts).unwrap();

        let wallet = RpcWallet::from_provider(provider);
        let signer = wallet.signer().await.unwrap();
        assert_eq!(signer.default_sender(), Some(Address::repeat_byte(0x42)));
        mock.assert_request("eth_requestAccounts", json!([])).unwrap();
    }

    #[tokio::test]
    async fn test_rpc_wallet_without_accounts_is_a_rejection() {
        let (provider, mock) = Provider::mocked();
        mock.push::<Vec<Address>, _>(Vec::new()).unwrap();

        let wallet = RpcWallet::from_provider(provider);
        let err = wallet.signer().await.unwrap_err();
        assert!(err.is_user_rejection());
        assert_eq!(err.message, "wallet exposed no accounts");
    }

    #[tokio::test]
    async fn test_rpc_wallet_forwards_requests() {
        let (provider, mock) = Provider::mocked();
        mock.push::<String, _>("0xa869".to_string()).unwrap();

        let wallet = RpcWallet::from_provider(provider);
        let chain = wallet.request("eth_chainId", json!([])).await.unwrap();
        assert_eq!(chain, json!("0xa869"));
    }

    #[test]
    fn test_local_key_wallet_rejects_bad_key() {
        assert!(LocalKeyWallet::new("http://127.0.0.1:8545", "not-a-key").is_err());
    }
}
