//! Service layer: orchestration between the domain ledgers, the event
//! bus, and persistence.

pub mod engagement_service;
pub mod voting_service;

pub use engagement_service::EngagementService;
pub use voting_service::VotingService;
