use uuid::Uuid;

/// Domain events that occur within the Team aggregate
///
/// Services log these as they happen; nothing is persisted from them.
///
/// # Example
/// ```
/// use teambuilder_api::domain::team::events::TeamEvent;
/// use uuid::Uuid;
///
/// let event = TeamEvent::Created {
///     team_id: Uuid::new_v4(),
///     owner_uid: Uuid::new_v4(),
///     member_count: 3,
/// };
/// assert_eq!(event.member_count(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamEvent {
    /// Fired when an owner saves a new team
    Created {
        team_id: Uuid,
        owner_uid: Uuid,
        member_count: usize,
    },
    /// Fired when the member list is replaced wholesale
    MembersReplaced { team_id: Uuid, member_count: usize },
    /// Fired when a team is removed, by its owner, an admin or a repair pass
    Deleted { team_id: Uuid },
}

impl TeamEvent {
    /// Returns the team_id for this event
    pub fn team_id(&self) -> Uuid {
        match self {
            TeamEvent::Created { team_id, .. } => *team_id,
            TeamEvent::MembersReplaced { team_id, .. } => *team_id,
            TeamEvent::Deleted { team_id } => *team_id,
        }
    }

    /// Member count after the event, if the team still exists
    pub fn member_count(&self) -> Option<usize> {
        match self {
            TeamEvent::Created { member_count, .. }
            | TeamEvent::MembersReplaced { member_count, .. } => Some(*member_count),
            TeamEvent::Deleted { .. } => None,
        }
    }
}
