//! Chain reader
//!
//! Every read is a fresh round trip to the node. Nothing is cached and a
//! failure of any single view call fails the whole read.

use async_trait::async_trait;
use ethers::contract::ContractError;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use log::debug;
use std::convert::TryFrom;
use std::sync::Arc;
use thiserror::Error;

use super::contract::Crowdfunding;
use crate::types::ContractSnapshot;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Failed to create provider: {0}")]
    Provider(String),
    #[error("Contract call failed: {0}")]
    Call(String),
    #[error("Event subscription failed: {0}")]
    Subscription(String),
    #[error("{field} does not fit in 64 bits: {value}")]
    Overflow { field: &'static str, value: U256 },
}

impl ChainError {
    fn call<M: Middleware>(err: ContractError<M>) -> Self {
        Self::Call(err.to_string())
    }
}

/// Read side of the contract, as consumed by the HTTP layer
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// All eight view values, read concurrently
    async fn snapshot(&self) -> Result<ContractSnapshot, ChainError>;

    /// Ledgered contribution of `backer`
    async fn backer_amount(&self, backer: Address) -> Result<U256, ChainError>;
}

/// `ChainReader` backed by an ethers middleware
pub struct ContractReader<M> {
    contract: Crowdfunding<M>,
}

impl ContractReader<Provider<Http>> {
    /// Reader over a JSON-RPC HTTP endpoint
    pub fn connect(rpc_url: &str, address: Address) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Provider(format!("{}: {}", rpc_url, e)))?;
        Ok(Self::new(address, Arc::new(provider)))
    }
}

impl<M: Middleware + 'static> ContractReader<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            contract: Crowdfunding::new(address, client),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

fn to_u64(field: &'static str, value: U256) -> Result<u64, ChainError> {
    if value > U256::from(u64::MAX) {
        return Err(ChainError::Overflow { field, value });
    }
    Ok(value.low_u64())
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for ContractReader<M> {
    async fn snapshot(&self) -> Result<ContractSnapshot, ChainError> {
        let c = &self.contract;
        // calls must outlive the futures that borrow them
        let calls = (
            c.creator(),
            c.deadline(),
            c.funding_goal(),
            c.total_funded(),
            c.goal_reached(),
            c.milestone_count(),
            c.milestones_completed(),
            c.get_contract_balance(),
        );
        let (
            creator,
            deadline,
            funding_goal,
            total_funded,
            goal_reached,
            milestone_count,
            milestones_completed,
            contract_balance,
        ) = futures::try_join!(
            calls.0.call(),
            calls.1.call(),
            calls.2.call(),
            calls.3.call(),
            calls.4.call(),
            calls.5.call(),
            calls.6.call(),
            calls.7.call(),
        )
        .map_err(ChainError::call)?;

        debug!(
            "Read contract state: total_funded={} goal={} reached={}",
            total_funded, funding_goal, goal_reached
        );

        Ok(ContractSnapshot {
            creator,
            deadline: to_u64("deadline", deadline)?,
            funding_goal,
            total_funded,
            contract_balance,
            goal_reached,
            milestone_count: to_u64("milestoneCount", milestone_count)?,
            milestones_completed: to_u64("milestonesCompleted", milestones_completed)?,
        })
    }

    async fn backer_amount(&self, backer: Address) -> Result<U256, ChainError> {
        self.contract
            .backers(backer)
            .call()
            .await
            .map_err(ChainError::call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{encode, Token};
    use ethers::types::Bytes;

    fn word(token: Token) -> Bytes {
        Bytes::from(encode(&[token]))
    }

    /// View-call results, in the reverse of the order `snapshot` issues them
    fn snapshot_responses() -> Vec<Bytes> {
        vec![
            word(Token::Uint(U256::from(7u64))),
            word(Token::Uint(U256::from(1u64))),
            word(Token::Uint(U256::from(3u64))),
            word(Token::Bool(false)),
            word(Token::Uint(U256::from(250_000_000_000_000_000u64))),
            word(Token::Uint(U256::exp10(18))),
            word(Token::Uint(U256::from(1_700_000_000u64))),
            word(Token::Address(Address::repeat_byte(0xcc))),
        ]
    }

    #[tokio::test]
    async fn test_snapshot_maps_every_view_call() {
        let (provider, mock) = Provider::mocked();
        for response in snapshot_responses() {
            mock.push::<Bytes, Bytes>(response).unwrap();
        }

        let reader = ContractReader::new(Address::repeat_byte(0x11), Arc::new(provider));
        let snapshot = reader.snapshot().await.unwrap();
        assert_eq!(
            snapshot,
            ContractSnapshot {
                creator: Address::repeat_byte(0xcc),
                deadline: 1_700_000_000,
                funding_goal: U256::exp10(18),
                total_funded: U256::from(250_000_000_000_000_000u64),
                contract_balance: U256::from(7u64),
                goal_reached: false,
                milestone_count: 3,
                milestones_completed: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_snapshot_fails_when_one_view_call_fails() {
        let (provider, mock) = Provider::mocked();
        // nothing left for getContractBalance, the last call issued
        for response in snapshot_responses().into_iter().skip(1) {
            mock.push::<Bytes, Bytes>(response).unwrap();
        }

        let reader = ContractReader::new(Address::repeat_byte(0x11), Arc::new(provider));
        let err = reader.snapshot().await.unwrap_err();
        assert!(matches!(err, ChainError::Call(_)));
    }

    #[tokio::test]
    async fn test_backer_amount_decodes_call_result() {
        let (provider, mock) = Provider::mocked();
        let amount = U256::from(250_000_000_000_000_000u64);
        mock.push::<Bytes, Bytes>(Bytes::from(encode(&[Token::Uint(amount)])))
            .unwrap();

        let reader = ContractReader::new(Address::repeat_byte(0x11), Arc::new(provider));
        let result = reader
            .backer_amount(Address::repeat_byte(0x22))
            .await
            .unwrap();
        assert_eq!(result, amount);
    }

    #[tokio::test]
    async fn test_backer_amount_propagates_rpc_failure() {
        // no queued response: the mock transport errors out
        let (provider, _mock) = Provider::mocked();
        let reader = ContractReader::new(Address::repeat_byte(0x11), Arc::new(provider));

        let err = reader
            .backer_amount(Address::repeat_byte(0x22))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Call(_)));
    }

    #[test]
    fn test_to_u64_overflow() {
        assert_eq!(to_u64("deadline", U256::from(42u64)).unwrap(), 42);
        let err = to_u64("deadline", U256::MAX).unwrap_err();
        assert!(matches!(err, ChainError::Overflow { field: "deadline", .. }));
    }
}
