// Repository ports
// Implemented by adapters in the infrastructure layer

pub mod key_value_store;
pub mod team_repository;
pub mod user_repository;

pub use key_value_store::KeyValueStore;
pub use team_repository::{is_team_not_found, team_not_found, TeamRepository};
pub use user_repository::{User, UserRepository};
