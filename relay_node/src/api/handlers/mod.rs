pub mod contract;
pub mod events;
