use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::common::{ActivityId, ParticipationId, UserId};
use super::event::{Activity, MediaType};
use super::participation::ParticipantType;
use super::user::Gender;

/// Editable fields of an event, as sent to create and update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub is_team: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub description: String,
    pub preview_url: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_members: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_teams: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub url: String,
    pub media_type: MediaType,
    pub name: Option<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub name: String,
    pub icon: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_scoreable: bool,
    pub is_versus: bool,
    pub max_score: i64,
    pub start_dt: Option<NaiveDateTime>,
    pub end_dt: Option<NaiveDateTime>,
}

impl From<&Activity> for ActivityPayload {
    fn from(activity: &Activity) -> Self {
        Self {
            name: activity.name.clone(),
            icon: activity.icon.clone(),
            latitude: activity.latitude,
            longitude: activity.longitude,
            is_scoreable: activity.is_scoreable,
            is_versus: activity.is_versus,
            max_score: activity.max_score.max(1),
            start_dt: activity.start_dt,
            end_dt: activity.end_dt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipation {
    pub participant_type: ParticipantType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

impl NewParticipation {
    pub fn individual() -> Self {
        Self {
            participant_type: ParticipantType::Individual,
            team_name: None,
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            participant_type: ParticipantType::Team,
            team_name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePayload {
    pub participation_id: ParticipationId,
    pub activity_id: Option<ActivityId>,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRef {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login_identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub birthday: NaiveDate,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Partial profile update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordUpdate {
    pub old_password: String,
    pub new_password: String,
}
