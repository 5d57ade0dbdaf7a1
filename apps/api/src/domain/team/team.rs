use super::events::TeamEvent;
use super::value_objects::{canonicalize, positionally_equal, Member, MAX_TEAM_SIZE};
use crate::domain::errors::{TeamBuilderError, TeamBuilderResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A team that has been validated but not yet persisted
///
/// The creation timestamp is assigned by the store, so a draft carries none.
///
/// # Example
/// ```
/// use teambuilder_api::domain::team::value_objects::{Member, PokemonId};
/// use teambuilder_api::domain::team::NewTeam;
/// use uuid::Uuid;
///
/// let members = vec![Member::new(PokemonId::new(25).unwrap())];
/// let (team, events) = NewTeam::new(Uuid::new_v4(), Some("Ash team".to_string()), members)
///     .expect("valid team");
///
/// assert_eq!(team.members().len(), 1);
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct NewTeam {
    id: Uuid,
    name: Option<String>,
    owner_uid: Uuid,
    members: Vec<Member>,
}

impl NewTeam {
    /// Validates a team about to be saved by its owner
    ///
    /// # Business Rules Enforced
    /// - Between 1 and 10 members, counted as submitted
    /// - Duplicates are collapsed, first occurrence wins
    /// - A blank name is stored as no name
    pub fn new(
        owner_uid: Uuid,
        name: Option<String>,
        members: Vec<Member>,
    ) -> TeamBuilderResult<(Self, Vec<TeamEvent>)> {
        if members.is_empty() || members.len() > MAX_TEAM_SIZE {
            return Err(TeamBuilderError::validation(format!(
                "Team must have 1..{} members",
                MAX_TEAM_SIZE
            )));
        }

        let members = canonicalize(&members.iter().map(Member::to_value).collect::<Vec<_>>());
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let team = Self {
            id: Uuid::new_v4(),
            name,
            owner_uid,
            members,
        };

        let events = vec![TeamEvent::Created {
            team_id: team.id,
            owner_uid: team.owner_uid,
            member_count: team.members.len(),
        }];

        Ok((team, events))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn owner_uid(&self) -> Uuid {
        self.owner_uid
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Stored representation of the member list
    pub fn members_value(&self) -> Value {
        Value::Array(self.members.iter().map(Member::to_value).collect())
    }
}

/// Team record as held by the store
///
/// Members are kept exactly as stored. Records written by older clients or
/// edited by hand may hold malformed entries until a repair pass rewrites
/// them, so readers should go through [`Team::canonical_members`].
#[derive(Debug, Clone)]
pub struct Team {
    id: Uuid,
    name: Option<String>,
    owner_uid: Uuid,
    members: Vec<Value>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Team {
    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn owner_uid(&self) -> Uuid {
        self.owner_uid
    }

    /// Members as stored, possibly non-canonical
    pub fn stored_members(&self) -> &[Value] {
        &self.members
    }

    /// Server-assigned creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Members after dedup, coercion and truncation
    pub fn canonical_members(&self) -> Vec<Member> {
        canonicalize(&self.members)
    }

    /// Pokédex numbers of the canonical members
    pub fn member_ids(&self) -> Vec<u32> {
        self.canonical_members()
            .iter()
            .map(|m| m.pokemon_id.get())
            .collect()
    }

    /// Whether the stored members already match their canonical form
    pub fn is_canonical(&self) -> bool {
        positionally_equal(&self.members, &self.canonical_members())
    }

    /// Label used by admin listings: the name, else the owner UID
    pub fn display_label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.owner_uid.to_string())
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses validation; only repository implementations should call it.
    pub fn from_persistence(
        id: Uuid,
        name: Option<String>,
        owner_uid: Uuid,
        members: Vec<Value>,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            owner_uid,
            members,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::value_objects::PokemonId;
    use serde_json::json;

    fn members(ids: &[i64]) -> Vec<Member> {
        ids.iter()
            .map(|id| Member::new(PokemonId::new(*id).unwrap()))
            .collect()
    }

    #[test]
    fn create_team_with_valid_members() {
        let owner = Uuid::new_v4();
        let (team, events) =
            NewTeam::new(owner, Some("Ash team".to_string()), members(&[1, 4, 7])).unwrap();

        assert_eq!(team.owner_uid(), owner);
        assert_eq!(team.name(), Some("Ash team"));
        assert_eq!(team.members().len(), 3);
        assert_eq!(
            events,
            vec![TeamEvent::Created {
                team_id: team.id(),
                owner_uid: owner,
                member_count: 3,
            }]
        );
    }

    #[test]
    fn create_team_without_members_fails() {
        let result = NewTeam::new(Uuid::new_v4(), None, vec![]);
        assert!(matches!(result, Err(TeamBuilderError::Validation(_))));
    }

    #[test]
    fn create_team_with_eleven_members_fails() {
        let ids: Vec<i64> = (1..=11).collect();
        let result = NewTeam::new(Uuid::new_v4(), None, members(&ids));
        assert!(matches!(result, Err(TeamBuilderError::Validation(_))));
    }

    #[test]
    fn create_team_collapses_duplicates() {
        let (team, _) = NewTeam::new(Uuid::new_v4(), None, members(&[4, 4, 1])).unwrap();
        assert_eq!(team.members(), members(&[4, 1]).as_slice());
    }

    #[test]
    fn blank_name_is_dropped() {
        let (team, _) =
            NewTeam::new(Uuid::new_v4(), Some("   ".to_string()), members(&[1])).unwrap();
        assert_eq!(team.name(), None);
    }

    #[test]
    fn members_value_uses_stored_shape() {
        let (team, _) = NewTeam::new(Uuid::new_v4(), None, members(&[25, 133])).unwrap();
        assert_eq!(
            team.members_value(),
            json!([{"pokemonId": 25}, {"pokemonId": 133}])
        );
    }

    #[test]
    fn stored_team_reports_canonical_form() {
        let team = Team::from_persistence(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            vec![json!({"pokemonId": 0}), json!({"pokemonId": 5})],
            Utc::now(),
            None,
        );

        assert_eq!(team.member_ids(), vec![5]);
        assert!(!team.is_canonical());
    }

    #[test]
    fn display_label_falls_back_to_owner() {
        let owner = Uuid::new_v4();
        let team = Team::from_persistence(Uuid::new_v4(), None, owner, vec![], Utc::now(), None);
        assert_eq!(team.display_label(), owner.to_string());
    }
}
