//! Access to the deployed crowdfunding contract

pub mod contract;
pub mod reader;

pub use contract::{Crowdfunding, CrowdfundingEvents};
pub use reader::{ChainError, ChainReader, ContractReader};
