use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use super::common::{EventId, ParticipationId, UserId};
use super::user::User;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParticipantType {
    #[default]
    Individual,
    Team,
}

/// One team or individual entrant of an event.
///
/// The creator is the captain of a team entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: ParticipationId,
    pub event_id: EventId,
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_avatar_url: Option<String>,
    pub creator: User,
    #[serde(default)]
    pub members: Vec<User>,
}

impl Participation {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.creator.id == user_id || self.members.iter().any(|m| m.id == user_id)
    }

    pub fn captain_id(&self) -> &UserId {
        &self.creator.id
    }

    /// Name to show for the entry: the team name, or the creator's name for
    /// individual entries.
    pub fn display_name(&self) -> &str {
        match (&self.participant_type, &self.team_name) {
            (ParticipantType::Team, Some(name)) => name,
            _ => &self.creator.full_name,
        }
    }
}

/// A participation paired with its aggregate score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participation: Participation,
    #[serde(alias = "total_score")]
    pub score: i64,
}
