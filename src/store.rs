//! Record-store abstraction the practice core runs against.
//!
//! The core needs three generic operations (filtered reads, single-card
//! writes, filtered bulk writes) plus id lookup and insert. The selection,
//! rotation, and progress layers are built on top of these.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Card, CardId, CardStatus, CategoryScope, CoreProgress, ExerciseKind, OwnerId};
use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

/// Conjunction of per-field predicates; an unset field matches everything.
#[derive(Clone, Debug, Default)]
pub struct CardFilter {
    pub owner: Option<OwnerId>,
    pub status: Option<CardStatus>,
    /// Category scope; `None` matches cards in any category, including none.
    pub scope: Option<CategoryScope>,
    /// Requires the given core kind's completion flag to have this value.
    pub core_flag: Option<(ExerciseKind, bool)>,
    pub reading_used: Option<bool>,
    /// Cards whose id is in this set never match.
    pub exclude_ids: HashSet<CardId>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        if let Some(owner) = &self.owner {
            if card.owner_id != *owner {
                return false;
            }
        }
        if let Some(status) = self.status {
            if card.status != status {
                return false;
            }
        }
        if let Some(scope) = &self.scope {
            if !scope.matches(card.category_id.as_deref()) {
                return false;
            }
        }
        if let Some((kind, completed)) = self.core_flag {
            if card.core_progress.contains(kind) != completed {
                return false;
            }
        }
        if let Some(used) = self.reading_used {
            if card.reading_used != used {
                return false;
            }
        }
        !self.exclude_ids.contains(&card.id)
    }
}

/// Partial update; unset fields leave the card untouched.
///
/// `reviewed_at` is doubly optional so a patch can explicitly clear it.
#[derive(Clone, Debug, Default)]
pub struct CardPatch {
    pub status: Option<CardStatus>,
    pub core_progress: Option<CoreProgress>,
    pub reading_used: Option<bool>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<Option<DateTime<Utc>>>,
}

impl CardPatch {
    pub fn apply(&self, card: &mut Card) {
        if let Some(status) = self.status {
            card.status = status;
        }
        if let Some(progress) = self.core_progress {
            card.core_progress = progress;
        }
        if let Some(used) = self.reading_used {
            card.reading_used = used;
        }
        if let Some(at) = self.last_reviewed_at {
            card.last_reviewed_at = at;
        }
        if let Some(at) = self.reviewed_at {
            card.reviewed_at = at;
        }
    }
}

/// Storage backend for cards. Implementations must be safe to share across
/// tasks; the core holds one instance behind the practice service.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Looks a card up by id. `Ok(None)` when the id is unknown.
    async fn find_by_id(&self, id: &str) -> Result<Option<Card>, StoreError>;

    /// All cards matching `filter`, in unspecified order.
    async fn find_many(&self, filter: &CardFilter) -> Result<Vec<Card>, StoreError>;

    /// Applies `patch` to one card and returns the updated card.
    /// Fails with [`StoreError::MissingCard`] when the id is unknown.
    async fn update_one(&self, id: &str, patch: CardPatch) -> Result<Card, StoreError>;

    /// Applies `patch` to every card matching `filter`; returns how many
    /// cards were touched.
    async fn update_many(&self, filter: &CardFilter, patch: CardPatch)
        -> Result<usize, StoreError>;

    /// Stores a card, replacing any existing card with the same id.
    async fn insert(&self, card: Card) -> Result<(), StoreError>;
}
