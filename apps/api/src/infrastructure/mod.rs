// Infrastructure layer module
// Contains database adapters, local storage and the claim store
// Follows Hexagonal Architecture

pub mod claim_store;
pub mod local_store;
pub mod repositories;
