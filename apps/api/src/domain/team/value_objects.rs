use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Maximum number of members a team may hold
pub const MAX_TEAM_SIZE: usize = 10;

/// Pokédex number of a Pokémon
///
/// # Invariants
/// - Always strictly positive
///
/// # Example
/// ```
/// use teambuilder_api::domain::team::value_objects::PokemonId;
///
/// assert!(PokemonId::new(25).is_some());
/// assert!(PokemonId::new(0).is_none());
/// assert!(PokemonId::new(-3).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PokemonId(u32);

impl PokemonId {
    /// Creates an identifier, rejecting zero, negatives and out-of-range values
    pub fn new(raw: i64) -> Option<Self> {
        if raw <= 0 {
            return None;
        }
        u32::try_from(raw).ok().map(PokemonId)
    }

    /// Coerces an arbitrary JSON value into an identifier
    ///
    /// Accepts integral numbers and strings holding an integer. Member
    /// objects are unwrapped through their `pokemonId` field.
    pub fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::new(i)
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f <= i64::MAX as f64)
                        .and_then(|f| Self::new(f as i64))
                }
            }
            Value::String(s) => s.trim().parse::<i64>().ok().and_then(Self::new),
            Value::Object(map) => map.get("pokemonId").and_then(Self::coerce_scalar),
            _ => None,
        }
    }

    // A member's `pokemonId` must itself be a scalar, never a nested member.
    fn coerce_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => None,
            other => Self::coerce(other),
        }
    }

    /// Returns the raw Pokédex number
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for PokemonId {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        PokemonId::new(raw).ok_or_else(|| format!("Invalid Pokémon id: {}", raw))
    }
}

impl From<PokemonId> for i64 {
    fn from(id: PokemonId) -> Self {
        i64::from(id.0)
    }
}

impl fmt::Display for PokemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single team slot, stored as `{"pokemonId": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "pokemonId")]
    pub pokemon_id: PokemonId,
}

impl Member {
    pub fn new(pokemon_id: PokemonId) -> Self {
        Self { pokemon_id }
    }

    /// Stored representation of this member
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "pokemonId": self.pokemon_id.get() })
    }
}

impl From<PokemonId> for Member {
    fn from(pokemon_id: PokemonId) -> Self {
        Self::new(pokemon_id)
    }
}

/// Turns raw, possibly malformed member input into a canonical member list
///
/// Elements are visited in order. Anything that does not coerce to a positive
/// integer is dropped, later duplicates are dropped (first occurrence wins),
/// and the survivors are cut to the first [`MAX_TEAM_SIZE`].
///
/// Never fails: an input made only of invalid entries yields an empty list,
/// and it is up to the caller to decide what an empty team means.
///
/// # Example
/// ```
/// use serde_json::json;
/// use teambuilder_api::domain::team::value_objects::canonicalize;
///
/// let raw = vec![json!({"pokemonId": 1}), json!({"pokemonId": 1}), json!({"pokemonId": 2})];
/// let ids: Vec<u32> = canonicalize(&raw).iter().map(|m| m.pokemon_id.get()).collect();
/// assert_eq!(ids, vec![1, 2]);
/// ```
pub fn canonicalize(raw: &[Value]) -> Vec<Member> {
    canonicalize_ids(raw.iter().map(PokemonId::coerce))
}

/// Dedup and truncate a sequence of already-coerced identifiers
pub fn canonicalize_ids<I>(ids: I) -> Vec<Member>
where
    I: IntoIterator<Item = Option<PokemonId>>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .flatten()
        .filter(|id| seen.insert(*id))
        .take(MAX_TEAM_SIZE)
        .map(Member::new)
        .collect()
}

/// Positional comparison of a stored member list against a canonical one
///
/// Same length and the same stored value at every index. A reordering of the
/// same identifiers is a difference, and so is a member stored in a
/// non-canonical shape such as `{"pokemonId": "5"}`.
pub fn positionally_equal(stored: &[Value], canonical: &[Member]) -> bool {
    stored.len() == canonical.len()
        && stored
            .iter()
            .zip(canonical)
            .all(|(raw, member)| *raw == member.to_value())
}

/// Parses admin input such as `"1, 4,7"` into positive identifiers
///
/// Entries that are not positive integers are skipped. Duplicates are kept;
/// callers check the count before deduplicating.
pub fn parse_id_list(input: &str) -> Vec<PokemonId> {
    input
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .filter_map(PokemonId::new)
        .collect()
}
