//! Client-side cache of events, participations, leaderboards and judges.
//!
//! Reads are populate-once: a cached value is served until the caller forces a
//! refetch. Writes never patch the cache locally; every mutation goes to the
//! backend first and then re-fetches the affected slots before it returns, so
//! a caller awaiting a mutation always reads post-write state afterwards.

mod cache;

use std::future::Future;
use std::sync::Arc;

use itertools::Itertools;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

pub use cache::{CacheClass, LoadState};
use cache::{Cache, Slot, Ticket};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::*;
use crate::normalize::{normalize_card, normalize_detail, rank_leaderboard};

/// The event/participation cache and its write-then-refetch mutations.
pub struct EventStore<G> {
    gateway: Arc<G>,
    cache: RwLock<Cache>,
}

impl<G: Gateway> EventStore<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            cache: RwLock::new(Cache::default()),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Run `fetch` for the slot chosen by `select` unless it is already
    /// populated (per `hit`) and `force` is false.
    ///
    /// The cache lock is not held while `fetch` runs. A failed fetch leaves
    /// the slot untouched and records the message in the class state.
    async fn load<T, S, H, F>(
        &self,
        class: CacheClass,
        force: bool,
        select: S,
        hit: H,
        fetch: F,
    ) -> Result<()>
    where
        S: Fn(&mut Cache) -> &mut Slot<T>,
        H: Fn(&T) -> bool,
        F: Future<Output = Result<T>>,
    {
        let ticket = {
            let mut cache = self.cache.write().await;
            let epoch = cache.epoch;
            let slot = select(&mut *cache);
            if !force && slot.value().is_some_and(&hit) {
                debug!(%class, "cache hit");
                return Ok(());
            }
            let seq = slot.issue();
            cache.begin(class);
            Ticket { epoch, seq }
        };

        let outcome = fetch.await;

        let mut cache = self.cache.write().await;
        if cache.epoch != ticket.epoch {
            debug!(%class, "dropping result fetched before cache reset");
            return outcome.map(drop);
        }

        let slot = select(&mut *cache);
        match outcome {
            Ok(value) => {
                if !slot.apply(ticket.seq, value) {
                    debug!(%class, seq = ticket.seq, "dropping superseded result");
                }
                cache.finish(class, None);
                Ok(())
            }
            Err(err) => {
                let stale = slot.is_stale(ticket.seq);
                if stale {
                    warn!(%class, error = %err, "superseded fetch failed");
                }
                cache.finish(class, (!stale).then(|| err.message()));
                Err(err)
            }
        }
    }

    /// Populate the event list. Served from cache when non-empty unless `force`.
    #[instrument(skip(self))]
    pub async fn fetch_list(&self, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::List,
            force,
            |c| &mut c.cards,
            |cards| !cards.is_empty(),
            async {
                let raw = gateway.list_events().await?;
                Ok(raw.into_iter().map(normalize_card).collect_vec())
            },
        )
        .await
    }

    /// Populate the detail of event `id`. A failure keeps the previous detail.
    #[instrument(skip(self))]
    pub async fn fetch_detail(&self, id: EventId, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::Detail,
            force,
            |c| c.details.entry(id).or_default(),
            |_| true,
            async { gateway.get_event(id).await.map(normalize_detail) },
        )
        .await
    }

    /// Populate the participations of event `event_id`.
    #[instrument(skip(self))]
    pub async fn fetch_participations(&self, event_id: EventId, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::Participations,
            force,
            |c| c.participations.entry(event_id).or_default(),
            |_| true,
            gateway.list_participations(event_id),
        )
        .await
    }

    /// Populate the leaderboard of `event_id`, ranked by descending score.
    #[instrument(skip(self))]
    pub async fn fetch_leaderboard(&self, event_id: EventId, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::Leaderboard,
            force,
            |c| c.leaderboards.entry(event_id).or_default(),
            |_| true,
            async { gateway.leaderboard(event_id).await.map(rank_leaderboard) },
        )
        .await
    }

    /// Populate the judges assigned to `event_id`.
    #[instrument(skip(self))]
    pub async fn fetch_judges(&self, event_id: EventId, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::Judges,
            force,
            |c| c.judges.entry(event_id).or_default(),
            |_| true,
            gateway.list_judges(event_id),
        )
        .await
    }

    /// Populate the participations of the signed-in user.
    #[instrument(skip(self))]
    pub async fn fetch_my_participations(&self, force: bool) -> Result<()> {
        let gateway = &self.gateway;
        self.load(
            CacheClass::MyParticipations,
            force,
            |c| &mut c.mine,
            |_| true,
            gateway.my_participations(),
        )
        .await
    }

    /// Re-fetch the list and the detail of `id`.
    pub async fn refresh_event(&self, id: EventId) -> Result<()> {
        self.fetch_list(true).await?;
        self.fetch_detail(id, true).await
    }

    async fn refresh_participations(&self, event_id: EventId) -> Result<()> {
        self.fetch_participations(event_id, true).await?;
        let mine_cached = self.cache.read().await.mine.value().is_some();
        if mine_cached {
            self.fetch_my_participations(true).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create_event(&self, payload: &EventPayload) -> Result<EventId> {
        let id = self.gateway.create_event(payload).await?;
        debug!(id, "event created");
        self.refresh_event(id).await?;
        Ok(id)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_event(&self, id: EventId, payload: &EventPayload) -> Result<()> {
        self.gateway.update_event(id, payload).await?;
        self.refresh_event(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_event(&self, id: EventId) -> Result<()> {
        self.gateway.delete_event(id).await?;
        self.cache.write().await.forget_event(id);
        self.fetch_list(true).await
    }

    #[instrument(skip(self, payload))]
    pub async fn add_media(&self, event_id: EventId, payload: &MediaPayload) -> Result<()> {
        self.gateway.add_media(event_id, payload).await?;
        self.refresh_event(event_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_media(&self, event_id: EventId, media_id: MediaId) -> Result<()> {
        self.gateway.delete_media(event_id, media_id).await?;
        self.refresh_event(event_id).await
    }

    #[instrument(skip(self, payload))]
    pub async fn add_activity(
        &self,
        event_id: EventId,
        payload: &ActivityPayload,
    ) -> Result<ActivityId> {
        let id = self.gateway.add_activity(event_id, payload).await?;
        self.fetch_detail(event_id, true).await?;
        Ok(id)
    }

    #[instrument(skip(self, payload))]
    pub async fn update_activity(
        &self,
        event_id: EventId,
        activity_id: ActivityId,
        payload: &ActivityPayload,
    ) -> Result<()> {
        self.gateway.update_activity(activity_id, payload).await?;
        self.fetch_detail(event_id, true).await
    }

    #[instrument(skip(self))]
    pub async fn delete_activity(&self, event_id: EventId, activity_id: ActivityId) -> Result<()> {
        self.gateway.delete_activity(activity_id).await?;
        self.fetch_detail(event_id, true).await
    }

    #[instrument(skip(self))]
    pub async fn create_participation(
        &self,
        event_id: EventId,
        payload: &NewParticipation,
    ) -> Result<Participation> {
        let created = self.gateway.create_participation(event_id, payload).await?;
        self.refresh_participations(event_id).await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn join_team(
        &self,
        event_id: EventId,
        participation_id: ParticipationId,
    ) -> Result<()> {
        self.gateway.join_team(participation_id).await?;
        self.refresh_participations(event_id).await
    }

    /// Delete a team (captain) or withdraw an individual entry.
    #[instrument(skip(self))]
    pub async fn delete_participation(
        &self,
        event_id: EventId,
        participation_id: ParticipationId,
    ) -> Result<()> {
        self.gateway.delete_participation(participation_id).await?;
        self.refresh_participations(event_id).await
    }

    /// Leave a team, or kick `user_id` from it when called by the captain.
    #[instrument(skip(self))]
    pub async fn remove_member(
        &self,
        event_id: EventId,
        participation_id: ParticipationId,
        user_id: &str,
    ) -> Result<()> {
        self.gateway.remove_member(participation_id, user_id).await?;
        self.refresh_participations(event_id).await
    }

    #[instrument(skip(self))]
    pub async fn transfer_captaincy(
        &self,
        event_id: EventId,
        participation_id: ParticipationId,
        user_id: &str,
    ) -> Result<()> {
        self.gateway
            .transfer_captaincy(participation_id, user_id)
            .await?;
        self.refresh_participations(event_id).await
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload_participation_avatar(
        &self,
        event_id: EventId,
        participation_id: ParticipationId,
        file: Upload,
    ) -> Result<Participation> {
        let updated = self
            .gateway
            .upload_participation_avatar(participation_id, file)
            .await?;
        self.refresh_participations(event_id).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn add_score(&self, event_id: EventId, payload: &ScorePayload) -> Result<()> {
        self.gateway.add_score(payload).await?;
        self.fetch_leaderboard(event_id, true).await
    }

    #[instrument(skip(self))]
    pub async fn add_judge(&self, event_id: EventId, user_id: &str) -> Result<()> {
        self.gateway.add_judge(event_id, user_id).await?;
        self.fetch_judges(event_id, true).await
    }

    /// Forget everything, e.g. on logout. Fetches still in flight are dropped
    /// when they complete.
    pub async fn reset(&self) {
        self.cache.write().await.reset();
        debug!("cache reset");
    }

    /// Cached event cards; empty until the list has been fetched.
    pub async fn cards(&self) -> Vec<EventCard> {
        self.cache
            .read()
            .await
            .cards
            .value()
            .cloned()
            .unwrap_or_default()
    }

    /// Cached card of event `id`.
    pub async fn card(&self, id: EventId) -> Option<EventCard> {
        self.cache
            .read()
            .await
            .cards
            .value()
            .and_then(|cards| cards.iter().find(|c| c.id == id).cloned())
    }

    /// Cached detail of event `id`.
    pub async fn detail(&self, id: EventId) -> Option<EventDetail> {
        self.cache
            .read()
            .await
            .details
            .get(&id)
            .and_then(|slot| slot.value().cloned())
    }

    /// The best-known version of event `id`: its detail if fetched, else its card.
    pub async fn event(&self, id: EventId) -> Option<EventView> {
        let cache = self.cache.read().await;
        if let Some(detail) = cache.details.get(&id).and_then(Slot::value) {
            return Some(EventView::Detail(detail.clone()));
        }
        cache
            .cards
            .value()
            .and_then(|cards| cards.iter().find(|c| c.id == id))
            .map(|card| EventView::Card(card.clone()))
    }

    /// Cached participations of `event_id`, `None` if never fetched.
    pub async fn participations(&self, event_id: EventId) -> Option<Vec<Participation>> {
        self.cache
            .read()
            .await
            .participations
            .get(&event_id)
            .and_then(|slot| slot.value().cloned())
    }

    /// The participation `user_id` belongs to in `event_id`, if cached.
    pub async fn participation_of(&self, event_id: EventId, user_id: &str) -> Option<Participation> {
        self.participations(event_id)
            .await?
            .into_iter()
            .find(|p| p.is_member(user_id))
    }

    /// Cached ranked leaderboard of `event_id`.
    pub async fn leaderboard(&self, event_id: EventId) -> Option<Vec<LeaderboardEntry>> {
        self.cache
            .read()
            .await
            .leaderboards
            .get(&event_id)
            .and_then(|slot| slot.value().cloned())
    }

    /// Cached judges of `event_id`.
    pub async fn judges(&self, event_id: EventId) -> Option<Vec<User>> {
        self.cache
            .read()
            .await
            .judges
            .get(&event_id)
            .and_then(|slot| slot.value().cloned())
    }

    /// Cached participations of the signed-in user.
    pub async fn my_participations(&self) -> Option<Vec<Participation>> {
        self.cache.read().await.mine.value().cloned()
    }

    /// Loading and error flags of `class`.
    pub async fn state(&self, class: CacheClass) -> LoadState {
        self.cache.read().await.state(class).clone()
    }
}
