//! Wire types shared by the relay server and the client facade
//!
//! Large integers travel as decimal strings so they survive JSON number
//! precision limits; timestamps and counts travel as JSON numbers.

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::units::format_native;

/// One read of the contract's view functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    #[serde(with = "checksummed")]
    pub creator: Address,
    pub deadline: u64,
    #[serde(with = "decimal")]
    pub funding_goal: U256,
    #[serde(with = "decimal")]
    pub total_funded: U256,
    #[serde(with = "decimal")]
    pub contract_balance: U256,
    pub goal_reached: bool,
    pub milestone_count: u64,
    pub milestones_completed: u64,
}

/// Ledgered contribution of one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackerAmount {
    /// Echoed exactly as the caller supplied it
    pub address: String,
    #[serde(with = "decimal")]
    pub amount: U256,
}

/// Payload of `Funded` and `Refunded`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackerPayload {
    pub backer: String,
    pub amount: String,
    pub amount_eth: String,
}

impl BackerPayload {
    pub fn new(backer: Address, amount: U256) -> Self {
        Self {
            backer: to_checksum(&backer, None),
            amount: amount.to_string(),
            amount_eth: format_native(amount),
        }
    }
}

/// Payload of `MilestoneCompleted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePayload {
    pub milestone_index: u64,
    pub payout: String,
    pub payout_eth: String,
}

impl MilestonePayload {
    pub fn new(milestone_index: U256, payout: U256) -> Self {
        let milestone_index = if milestone_index > U256::from(u64::MAX) {
            warn!("milestoneIndex {} does not fit in 64 bits, clamping", milestone_index);
            u64::MAX
        } else {
            milestone_index.low_u64()
        };
        Self {
            milestone_index,
            payout: payout.to_string(),
            payout_eth: format_native(payout),
        }
    }
}

/// A contract event as relayed to browsers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Funded(BackerPayload),
    Refunded(BackerPayload),
    MilestoneCompleted(MilestonePayload),
}

impl RelayEvent {
    pub const FUNDED: &'static str = "Funded";
    pub const REFUNDED: &'static str = "Refunded";
    pub const MILESTONE_COMPLETED: &'static str = "MilestoneCompleted";

    pub fn funded(backer: Address, amount: U256) -> Self {
        Self::Funded(BackerPayload::new(backer, amount))
    }

    pub fn refunded(backer: Address, amount: U256) -> Self {
        Self::Refunded(BackerPayload::new(backer, amount))
    }

    pub fn milestone_completed(milestone_index: U256, payout: U256) -> Self {
        Self::MilestoneCompleted(MilestonePayload::new(milestone_index, payout))
    }

    /// SSE event name, identical to the Solidity event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Funded(_) => Self::FUNDED,
            Self::Refunded(_) => Self::REFUNDED,
            Self::MilestoneCompleted(_) => Self::MILESTONE_COMPLETED,
        }
    }

    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Funded(payload) | Self::Refunded(payload) => serde_json::to_string(payload),
            Self::MilestoneCompleted(payload) => serde_json::to_string(payload),
        }
    }

    /// Rebuild an event from an SSE name and data line; unknown names yield `None`
    pub fn from_named(name: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        let event = match name {
            Self::FUNDED => Some(Self::Funded(serde_json::from_str(data)?)),
            Self::REFUNDED => Some(Self::Refunded(serde_json::from_str(data)?)),
            Self::MILESTONE_COMPLETED => {
                Some(Self::MilestoneCompleted(serde_json::from_str(data)?))
            }
            _ => None,
        };
        Ok(event)
    }
}

mod decimal {
    use ethers::types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw)
            .map_err(|e| de::Error::custom(format!("invalid decimal integer '{}': {:?}", raw, e)))
    }
}

mod checksummed {
    use ethers::types::Address;
    use ethers::utils::to_checksum;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_checksum(value, None))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Address>()
            .map_err(|e| de::Error::custom(format!("invalid address '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creator() -> Address {
        "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
    }

    #[test]
    fn test_snapshot_json_encoding() {
        let snapshot = ContractSnapshot {
            creator: creator(),
            deadline: 1_735_689_600,
            funding_goal: U256::exp10(18),
            total_funded: U256::from(250_000_000_000_000_000u64),
            contract_balance: U256::from(250_000_000_000_000_000u64),
            goal_reached: false,
            milestone_count: 3,
            milestones_completed: 0,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "creator": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "deadline": 1_735_689_600u64,
                "fundingGoal": "1000000000000000000",
                "totalFunded": "250000000000000000",
                "contractBalance": "250000000000000000",
                "goalReached": false,
                "milestoneCount": 3,
                "milestonesCompleted": 0
            })
        );

        let decoded: ContractSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let result = serde_json::from_value::<BackerAmount>(json!({
            "address": "0x00",
            "amount": "12abc"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_funded_payload() {
        let event = RelayEvent::funded(creator(), U256::from(250_000_000_000_000_000u64));
        assert_eq!(event.name(), "Funded");
        let payload: serde_json::Value =
            serde_json::from_str(&event.payload_json().unwrap()).unwrap();
        assert_eq!(payload["backer"], "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert_eq!(payload["amount"], "250000000000000000");
        assert_eq!(payload["amountEth"], "0.25");
    }

    #[test]
    fn test_milestone_payload_names() {
        let event = RelayEvent::milestone_completed(U256::from(1u64), U256::exp10(18));
        let payload: serde_json::Value =
            serde_json::from_str(&event.payload_json().unwrap()).unwrap();
        assert_eq!(payload["milestoneIndex"], 1);
        assert_eq!(payload["payout"], "1000000000000000000");
        assert_eq!(payload["payoutEth"], "1.0");
    }

    #[test]
    fn test_milestone_index_clamped_not_truncated() {
        // low 64 bits of 2^64 + 1 would read as index 1
        let index = U256::from(u64::MAX) + U256::from(2u64);
        let payload = MilestonePayload::new(index, U256::zero());
        assert_eq!(payload.milestone_index, u64::MAX);

        let payload = MilestonePayload::new(U256::from(u64::MAX), U256::zero());
        assert_eq!(payload.milestone_index, u64::MAX);
    }

    #[test]
    fn test_from_named() {
        let event = RelayEvent::refunded(creator(), U256::from(5u64));
        let rebuilt = RelayEvent::from_named(event.name(), &event.payload_json().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(rebuilt, event);
        assert!(RelayEvent::from_named("Unknown", "{}").unwrap().is_none());
    }
}
