//! Editable copies of cached entities.
//!
//! A draft is detached from the store: edits never show up in cached data
//! until the draft is saved and the store has re-fetched.

mod event;

pub use event::EventDraft;

/// Key of a sub-entity that only exists in a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalKey(u64);

/// Identity of a sub-entity inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftId {
    /// Already stored by the backend under this id; saved via update.
    Persisted(u64),
    /// Created locally; saved via create.
    Draft(LocalKey),
}

impl DraftId {
    pub fn is_persisted(&self) -> bool {
        matches!(self, DraftId::Persisted(_))
    }
}

/// A sub-entity being edited, with the value it had when the draft was made.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem<T> {
    pub id: DraftId,
    pub value: T,
    base: Option<T>,
}

impl<T: Clone + PartialEq> DraftItem<T> {
    pub(crate) fn persisted(id: u64, value: T) -> Self {
        Self {
            id: DraftId::Persisted(id),
            base: Some(value.clone()),
            value,
        }
    }

    pub(crate) fn draft(key: LocalKey, value: T) -> Self {
        Self {
            id: DraftId::Draft(key),
            value,
            base: None,
        }
    }

    /// Record that the backend now stores `value` under `id`.
    pub(crate) fn mark_persisted(&mut self, id: u64) {
        self.id = DraftId::Persisted(id);
        self.base = Some(self.value.clone());
    }

    /// New items are always dirty; persisted ones once they differ from the
    /// value they were loaded with.
    pub fn is_dirty(&self) -> bool {
        self.base.as_ref() != Some(&self.value)
    }
}

/// Hands out [`LocalKey`]s unique within one draft.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyGen(u64);

impl KeyGen {
    pub(crate) fn issue(&mut self) -> LocalKey {
        self.0 += 1;
        LocalKey(self.0)
    }
}
