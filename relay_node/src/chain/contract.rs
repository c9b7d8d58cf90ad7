//! Bindings for the crowdfunding contract
//!
//! The contract is deployed once and never upgraded, so its ABI is fixed
//! here rather than loaded at runtime.

use ethers::contract::abigen;

use crate::types::RelayEvent;

abigen!(
    Crowdfunding,
    r#"[
        function creator() external view returns (address)
        function deadline() external view returns (uint256)
        function fundingGoal() external view returns (uint256)
        function totalFunded() external view returns (uint256)
        function goalReached() external view returns (bool)
        function milestoneCount() external view returns (uint256)
        function milestonesCompleted() external view returns (uint256)
        function getContractBalance() external view returns (uint256)
        function backers(address) external view returns (uint256)
        function fund() external payable
        function completeMilestone() external
        function refund() external
        event Funded(address indexed backer, uint256 amount)
        event Refunded(address indexed backer, uint256 amount)
        event MilestoneCompleted(uint256 milestoneIndex, uint256 payout)
    ]"#
);

impl From<CrowdfundingEvents> for RelayEvent {
    fn from(event: CrowdfundingEvents) -> Self {
        match event {
            CrowdfundingEvents::FundedFilter(e) => RelayEvent::funded(e.backer, e.amount),
            CrowdfundingEvents::RefundedFilter(e) => RelayEvent::refunded(e.backer, e.amount),
            CrowdfundingEvents::MilestoneCompletedFilter(e) => {
                RelayEvent::milestone_completed(e.milestone_index, e.payout)
            }
        }
    }
}
