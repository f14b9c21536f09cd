use std::collections::BTreeMap;

use crate::model::{EventCard, EventDetail, EventId, LeaderboardEntry, Participation, User};

/// The kinds of cached data, each with its own loading/error state so that a
/// failure in one does not blank the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CacheClass {
    List,
    Detail,
    Participations,
    Leaderboard,
    Judges,
    MyParticipations,
}

/// Loading and error flags of one [`CacheClass`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    in_flight: usize,
    error: Option<String>,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Message of the most recent failed fetch, cleared when a new fetch starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn begin(&mut self) {
        self.in_flight += 1;
        self.error = None;
    }

    fn finish(&mut self, error: Option<String>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if error.is_some() {
            self.error = error;
        }
    }
}

/// One cached value plus the bookkeeping that orders concurrent fetches.
///
/// Every fetch takes a sequence number when issued. A result is applied only
/// if it was issued after the value currently held, so the last *issued*
/// fetch wins no matter in which order responses arrive.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    value: Option<T>,
    issued: u64,
    applied: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            issued: 0,
            applied: 0,
        }
    }
}

impl<T> Slot<T> {
    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub(crate) fn is_stale(&self, seq: u64) -> bool {
        seq <= self.applied
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Store `value` unless a later-issued fetch already landed.
    pub(crate) fn apply(&mut self, seq: u64, value: T) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.applied = seq;
        self.value = Some(value);
        true
    }

    /// Drop the value and invalidate every fetch issued so far.
    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.applied = self.issued;
    }
}

/// Identifies a fetch: the cache epoch it was issued in and its slot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub epoch: u64,
    pub seq: u64,
}

/// Everything the store has fetched, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    /// Bumped by every reset; results of fetches from older epochs are dropped.
    pub epoch: u64,
    pub cards: Slot<Vec<EventCard>>,
    pub details: BTreeMap<EventId, Slot<EventDetail>>,
    pub participations: BTreeMap<EventId, Slot<Vec<Participation>>>,
    pub leaderboards: BTreeMap<EventId, Slot<Vec<LeaderboardEntry>>>,
    pub judges: BTreeMap<EventId, Slot<Vec<User>>>,
    pub mine: Slot<Vec<Participation>>,
    list_state: LoadState,
    detail_state: LoadState,
    participations_state: LoadState,
    leaderboard_state: LoadState,
    judges_state: LoadState,
    mine_state: LoadState,
}

impl Cache {
    pub(crate) fn state(&self, class: CacheClass) -> &LoadState {
        match class {
            CacheClass::List => &self.list_state,
            CacheClass::Detail => &self.detail_state,
            CacheClass::Participations => &self.participations_state,
            CacheClass::Leaderboard => &self.leaderboard_state,
            CacheClass::Judges => &self.judges_state,
            CacheClass::MyParticipations => &self.mine_state,
        }
    }

    fn state_mut(&mut self, class: CacheClass) -> &mut LoadState {
        match class {
            CacheClass::List => &mut self.list_state,
            CacheClass::Detail => &mut self.detail_state,
            CacheClass::Participations => &mut self.participations_state,
            CacheClass::Leaderboard => &mut self.leaderboard_state,
            CacheClass::Judges => &mut self.judges_state,
            CacheClass::MyParticipations => &mut self.mine_state,
        }
    }

    pub(crate) fn begin(&mut self, class: CacheClass) {
        self.state_mut(class).begin();
    }

    pub(crate) fn finish(&mut self, class: CacheClass, error: Option<String>) {
        self.state_mut(class).finish(error);
    }

    /// Forget everything, invalidating in-flight fetches.
    pub(crate) fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Cache {
            epoch,
            ..Cache::default()
        };
    }

    /// Drop every per-event slot of `id` and its card.
    pub(crate) fn forget_event(&mut self, id: EventId) {
        if let Some(cards) = self.cards.value_mut() {
            cards.retain(|card| card.id != id);
        }
        if let Some(slot) = self.details.get_mut(&id) {
            slot.clear();
        }
        if let Some(slot) = self.participations.get_mut(&id) {
            slot.clear();
        }
        if let Some(slot) = self.leaderboards.get_mut(&id) {
            slot.clear();
        }
        if let Some(slot) = self.judges.get_mut(&id) {
            slot.clear();
        }
    }
}
