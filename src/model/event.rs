use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use super::common::{ActivityId, EventId, MediaId};

/// Lifecycle state of an event relative to now.
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
pub enum EventState {
    #[default]
    Future,
    Current,
    Past,
}

/// Lightweight event representation returned by list queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    pub id: EventId,
    pub title: String,
    pub is_team: bool,
    /// Display date, `DD.MM.YYYY` or a placeholder.
    pub date: String,
    pub state: EventState,
    pub preview_url: Option<String>,
    pub leaderboard: Vec<Leader>,
}

/// Full event representation, fetched and cached per id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub card: EventCard,
    pub description: String,
    pub media: Vec<Media>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_members: Option<u32>,
    pub max_teams: Option<u32>,
    pub activities: Vec<Activity>,
}

impl EventDetail {
    pub fn id(&self) -> EventId {
        self.card.id
    }
}

/// What the store knows about an event: the full detail when it has been
/// fetched, otherwise the list card.
#[derive(Debug, Clone, PartialEq)]
pub enum EventView {
    Card(EventCard),
    Detail(EventDetail),
}

impl EventView {
    pub fn card(&self) -> &EventCard {
        match self {
            EventView::Card(card) => card,
            EventView::Detail(detail) => &detail.card,
        }
    }

    pub fn detail(&self) -> Option<&EventDetail> {
        match self {
            EventView::Card(_) => None,
            EventView::Detail(detail) => Some(detail),
        }
    }
}

/// A row of the compact leaderboard embedded in event cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    pub id: u64,
    pub name: String,
    pub score: i64,
    #[serde(default, alias = "avatarUrl")]
    pub avatar_url: Option<String>,
}

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
pub enum MediaType {
    #[default]
    Image,
    Document,
}

/// An image or document attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub url: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: u32,
}

/// Something that happens during an event and may be scored by judges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default)]
    pub event_id: Option<EventId>,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub is_scoreable: bool,
    #[serde(default)]
    pub is_versus: bool,
    #[serde(default = "default_max_score")]
    pub max_score: i64,
    #[serde(default)]
    pub start_dt: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_dt: Option<NaiveDateTime>,
}

pub(crate) fn default_max_score() -> i64 {
    1
}

/// Event as the backend sends it, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    pub id: EventId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_team: bool,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub state: EventState,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Option<Vec<Media>>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub max_members: Option<u32>,
    #[serde(default)]
    pub max_teams: Option<u32>,
    #[serde(default)]
    pub leaderboard: Option<Vec<Leader>>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
}
