use chrono::{Local, NaiveTime};
use tracing::{debug, instrument};

use super::{DraftId, DraftItem, KeyGen};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::*;
use crate::normalize::{
    is_placeholder_date, parse_display_date, DESCRIPTION_PLACEHOLDER, DISPLAY_DATE_FORMAT,
};
use crate::store::EventStore;

const NEW_EVENT_TITLE: &str = "New event";
const NEW_EVENT_DESCRIPTION: &str = "Event description (rules, extra conditions, etc.)";
const NEW_ACTIVITY_NAME: &str = "New activity";
const NEW_ACTIVITY_ICON: &str = "🎯";

/// An isolated, editable copy of an event with its activities and media.
#[derive(Debug, Clone)]
pub struct EventDraft {
    id: Option<EventId>,
    pub title: String,
    is_team: bool,
    /// Date as typed in the form, `DD.MM.YYYY`.
    pub date: String,
    pub description: String,
    pub preview_url: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_members: Option<u32>,
    max_teams: Option<u32>,
    activities: Vec<DraftItem<ActivityPayload>>,
    media: Vec<DraftItem<MediaPayload>>,
    removed_activities: Vec<ActivityId>,
    removed_media: Vec<MediaId>,
    keys: KeyGen,
}

impl EventDraft {
    /// Blank form for a new event: today, 09:00 to 23:00, individual.
    pub fn new_event() -> Self {
        Self {
            id: None,
            title: NEW_EVENT_TITLE.to_string(),
            is_team: false,
            date: Local::now()
                .date_naive()
                .format(DISPLAY_DATE_FORMAT)
                .to_string(),
            description: NEW_EVENT_DESCRIPTION.to_string(),
            preview_url: None,
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(23, 0, 0),
            max_members: Some(1),
            max_teams: None,
            activities: Vec::new(),
            media: Vec::new(),
            removed_activities: Vec::new(),
            removed_media: Vec::new(),
            keys: KeyGen::default(),
        }
    }

    /// Deep copy of a cached detail.
    pub fn from_detail(detail: &EventDetail) -> Self {
        let description = if detail.description == DESCRIPTION_PLACEHOLDER {
            String::new()
        } else {
            detail.description.clone()
        };

        Self {
            id: Some(detail.id()),
            title: detail.card.title.clone(),
            is_team: detail.card.is_team,
            date: detail.card.date.clone(),
            description,
            preview_url: detail.card.preview_url.clone(),
            start_time: detail.start_time,
            end_time: detail.end_time,
            max_members: detail.max_members,
            max_teams: detail.max_teams,
            activities: detail
                .activities
                .iter()
                .map(|a| DraftItem::persisted(a.id, ActivityPayload::from(a)))
                .collect(),
            media: detail
                .media
                .iter()
                .map(|m| {
                    DraftItem::persisted(
                        m.id,
                        MediaPayload {
                            url: m.url.clone(),
                            media_type: m.media_type,
                            name: m.name.clone(),
                            order: m.order,
                        },
                    )
                })
                .collect(),
            removed_activities: Vec::new(),
            removed_media: Vec::new(),
            keys: KeyGen::default(),
        }
    }

    /// `None` until the event has been created.
    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_team(&self) -> bool {
        self.is_team
    }

    /// Switching to an individual event drops the team limit.
    pub fn set_team(&mut self, is_team: bool) {
        self.is_team = is_team;
        if !is_team {
            self.max_teams = None;
        }
    }

    pub fn max_teams(&self) -> Option<u32> {
        self.max_teams
    }

    pub fn set_max_teams(&mut self, max_teams: Option<u32>) {
        self.max_teams = max_teams;
    }

    pub fn activities(&self) -> &[DraftItem<ActivityPayload>] {
        &self.activities
    }

    pub fn activity_mut(&mut self, index: usize) -> Option<&mut ActivityPayload> {
        self.activities.get_mut(index).map(|item| &mut item.value)
    }

    /// Append an activity with default values.
    pub fn add_activity(&mut self) -> DraftId {
        let item = DraftItem::draft(
            self.keys.issue(),
            ActivityPayload {
                name: NEW_ACTIVITY_NAME.to_string(),
                icon: NEW_ACTIVITY_ICON.to_string(),
                latitude: 0.0,
                longitude: 0.0,
                is_scoreable: false,
                is_versus: false,
                max_score: 1,
                start_dt: None,
                end_dt: None,
            },
        );
        let id = item.id;
        self.activities.push(item);
        id
    }

    /// Remove the activity at `index`; a persisted one is deleted on save.
    pub fn remove_activity(&mut self, index: usize) -> Option<DraftItem<ActivityPayload>> {
        if index >= self.activities.len() {
            return None;
        }
        let item = self.activities.remove(index);
        if let DraftId::Persisted(id) = item.id {
            self.removed_activities.push(id);
        }
        Some(item)
    }

    pub fn media(&self) -> &[DraftItem<MediaPayload>] {
        &self.media
    }

    /// Attach a media URL. Its name is the last path segment of the URL.
    pub fn add_media(&mut self, url: &str, media_type: MediaType) -> DraftId {
        let url = url.trim();
        let order = self
            .media
            .iter()
            .filter(|m| m.value.media_type == media_type)
            .count() as u32;
        let name = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{media_type}_{}", order + 1));

        let item = DraftItem::draft(
            self.keys.issue(),
            MediaPayload {
                url: url.to_string(),
                media_type,
                name: Some(name),
                order,
            },
        );
        let id = item.id;
        self.media.push(item);
        id
    }

    /// Remove the media at `index`; a persisted one is deleted on save.
    pub fn remove_media(&mut self, index: usize) -> Option<DraftItem<MediaPayload>> {
        if index >= self.media.len() {
            return None;
        }
        let item = self.media.remove(index);
        if let DraftId::Persisted(id) = item.id {
            self.removed_media.push(id);
        }
        Some(item)
    }

    /// Editable fields as sent to the backend, with the display date parsed
    /// back to a calendar date.
    pub fn to_payload(&self) -> Result<EventPayload> {
        let date = match self.date.trim() {
            "" => None,
            d if is_placeholder_date(d) => None,
            d => Some(parse_display_date(d)?),
        };

        Ok(EventPayload {
            title: self.title.clone(),
            is_team: self.is_team,
            date,
            description: self.description.clone(),
            preview_url: self.preview_url.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            max_members: self.max_members,
            max_teams: if self.is_team { self.max_teams } else { None },
        })
    }

    /// Write the draft through `store` and return the event id.
    ///
    /// The event is created or updated first, then removed sub-entities are
    /// deleted, changed persisted activities updated and new activities and
    /// media created. The store re-fetches the event once all writes are
    /// done, also when one of the sub-entity writes failed.
    ///
    /// Every write that succeeded is recorded in the draft, so saving again
    /// after a failure only repeats what is still outstanding.
    #[instrument(skip(self, store), fields(id = ?self.id))]
    pub async fn save<G: Gateway>(&mut self, store: &EventStore<G>) -> Result<EventId> {
        let payload = self.to_payload()?;
        let gateway = store.gateway();

        let id = match self.id {
            Some(id) => {
                gateway.update_event(id, &payload).await?;
                id
            }
            None => gateway.create_event(&payload).await?,
        };
        self.id = Some(id);

        let written = self.write_children(gateway.as_ref(), id).await;
        let refreshed = store.refresh_event(id).await;
        if refreshed.is_ok() {
            if let Some(detail) = store.detail(id).await {
                self.rebase(&detail);
            }
        }
        written.and(refreshed)?;

        debug!(id, "draft saved");
        Ok(id)
    }

    async fn write_children<G: Gateway>(&mut self, gateway: &G, id: EventId) -> Result<()> {
        while let Some(&activity_id) = self.removed_activities.first() {
            gateway.delete_activity(activity_id).await?;
            self.removed_activities.remove(0);
        }
        while let Some(&media_id) = self.removed_media.first() {
            gateway.delete_media(id, media_id).await?;
            self.removed_media.remove(0);
        }

        for item in self.activities.iter_mut() {
            match item.id {
                DraftId::Persisted(activity_id) if item.is_dirty() => {
                    gateway.update_activity(activity_id, &item.value).await?;
                    item.mark_persisted(activity_id);
                }
                DraftId::Persisted(_) => {}
                DraftId::Draft(_) => {
                    let activity_id = gateway.add_activity(id, &item.value).await?;
                    item.mark_persisted(activity_id);
                }
            }
        }

        // Media ids are not returned; written items come back with the refetch.
        while let Some(index) = self.media.iter().position(|m| !m.id.is_persisted()) {
            gateway.add_media(id, &self.media[index].value).await?;
            self.media.remove(index);
        }
        Ok(())
    }

    /// Reload persisted state from `detail`, keeping edits not written yet.
    fn rebase(&mut self, detail: &EventDetail) {
        let mut next = Self::from_detail(detail);
        let removed_activities = std::mem::take(&mut self.removed_activities);
        let removed_media = std::mem::take(&mut self.removed_media);

        next.activities.retain(|item| match item.id {
            DraftId::Persisted(id) => !removed_activities.contains(&id),
            DraftId::Draft(_) => true,
        });
        next.media.retain(|item| match item.id {
            DraftId::Persisted(id) => !removed_media.contains(&id),
            DraftId::Draft(_) => true,
        });

        for item in &self.activities {
            match item.id {
                DraftId::Persisted(_) if item.is_dirty() => {
                    if let Some(target) = next.activities.iter_mut().find(|a| a.id == item.id) {
                        target.value = item.value.clone();
                    }
                }
                DraftId::Persisted(_) => {}
                DraftId::Draft(_) => next.activities.push(item.clone()),
            }
        }
        next.media
            .extend(self.media.iter().filter(|m| !m.id.is_persisted()).cloned());

        next.removed_activities = removed_activities;
        next.removed_media = removed_media;
        next.keys = self.keys.clone();
        *self = next;
    }
}
