//! Pokémon Team Builder API Library
//!
//! Claim Pokémon into a personal team, save teams to a shared store, and
//! administer every stored team, including a repair pass that brings stored
//! members back to canonical form.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;
