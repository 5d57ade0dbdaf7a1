// Team domain module
// Contains the team record, member value objects and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use team::{NewTeam, Team};
pub use value_objects::{canonicalize, Member, PokemonId, MAX_TEAM_SIZE};
