use crate::domain::team::value_objects::PokemonId;
use crate::domain::user::value_objects::DisplayName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pre-save scratch state: which trainer currently holds which Pokémon
///
/// Serialized as a JSON object keyed by Pokédex number, e.g.
/// `{"25": "Ash", "133": "Misty"}`. Iteration is in ascending Pokédex order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimMap(BTreeMap<PokemonId, DisplayName>);

impl ClaimMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, id: PokemonId) -> Option<&DisplayName> {
        self.0.get(&id)
    }

    /// Overwrites any existing holder
    pub fn set(&mut self, id: PokemonId, holder: DisplayName) -> Option<DisplayName> {
        self.0.insert(id, holder)
    }

    pub fn clear(&mut self, id: PokemonId) -> Option<DisplayName> {
        self.0.remove(&id)
    }

    /// Identifiers held by `user`, ascending
    pub fn held_by(&self, user: &DisplayName) -> Vec<PokemonId> {
        self.0
            .iter()
            .filter(|(_, holder)| *holder == user)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn status_for(&self, id: PokemonId, user: Option<&DisplayName>) -> ClaimStatus {
        match (self.0.get(&id), user) {
            (None, _) => ClaimStatus::Available,
            (Some(holder), Some(user)) if holder == user => ClaimStatus::Mine,
            (Some(_), _) => ClaimStatus::Taken,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PokemonId, &DisplayName)> {
        self.0.iter()
    }
}

/// How a roster entry looks to a given trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Available,
    Mine,
    Taken,
}
