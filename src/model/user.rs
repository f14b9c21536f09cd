use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use super::common::{ParticipationId, UserId};

/// Platform role, used for navigation guards and judge assignment.
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
pub enum Role {
    Admin,
    Organizer,
    Judge,
    #[default]
    User,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// A user's place in a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub participation_id: ParticipationId,
    #[serde(default)]
    pub is_captain: bool,
}

/// A platform user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub height_cm: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<u32>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub team: Option<TeamMembership>,
}

impl User {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Organizer)
    }

    pub fn can_judge(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Judge)
    }
}
