// Application services
// Orchestrate domain rules, repositories and the admin gate per caller

pub mod repair;
pub mod session;
pub mod team_service;

pub use repair::{repair_all, RepairReport};
pub use session::{LocalSession, RosterEntry, SavedTeamSummary, ToggleOutcome};
pub use team_service::TeamService;
