//! Caller-facing practice operations. The HTTP layer stays a thin shell
//! around this service; tests drive it directly.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::domain::{Card, CardId, CardStatus, CategoryScope, ExerciseKind};
use crate::error::Error;
use crate::progress;
use crate::rotation::RotationController;
use crate::selection;
use crate::store::{CardPatch, CardStore};

/// Cards served for one exercise round, plus rotation bookkeeping when the
/// auxiliary path ran.
#[derive(Clone, Debug)]
pub struct SelectionResult {
    pub cards: Vec<Card>,
    pub rotation_applied: bool,
    /// Only present for reading-comprehension requests.
    pub scope_snapshot: Option<Vec<Card>>,
}

/// The practice core bound to one store instance.
pub struct PracticeService<S> {
    store: S,
    rotation: RotationController,
}

impl<S: CardStore> PracticeService<S> {
    pub fn new(store: S) -> Self {
        PracticeService {
            store,
            rotation: RotationController::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serves cards for one round of `kind`, dispatching core kinds to the
    /// eligibility selector and the auxiliary kind to the rotation.
    #[instrument(level = "info", skip(self, exclude), fields(%owner, %kind, limit))]
    pub async fn eligible_cards(
        &self,
        owner: &str,
        kind: ExerciseKind,
        limit: usize,
        scope: Option<CategoryScope>,
        exclude: &HashSet<CardId>,
        now: DateTime<Utc>,
    ) -> Result<SelectionResult, Error> {
        if limit == 0 {
            return Err(Error::InvalidArgument("limit must be positive".into()));
        }
        if kind.is_core() {
            let cards =
                selection::select_for_core_exercise(&self.store, owner, kind, limit, scope, exclude)
                    .await?;
            Ok(SelectionResult {
                cards,
                rotation_applied: false,
                scope_snapshot: None,
            })
        } else {
            let out = self
                .rotation
                .select_with_rotation(&self.store, owner, scope, limit, exclude, now)
                .await?;
            Ok(SelectionResult {
                cards: out.selected,
                rotation_applied: out.rotation_applied,
                scope_snapshot: Some(out.scope_snapshot),
            })
        }
    }

    /// Records one exercise outcome for each listed card and persists the
    /// resulting state. Fails on the first card that does not resolve for
    /// `owner`; cards before it stay updated.
    #[instrument(
        level = "info",
        skip(self, card_ids),
        fields(%owner, %kind, correct, cards = card_ids.len())
    )]
    pub async fn record_outcome(
        &self,
        owner: &str,
        card_ids: &[CardId],
        kind: ExerciseKind,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>, Error> {
        let mut updated = Vec::with_capacity(card_ids.len());
        for id in card_ids {
            let mut card = self.resolve(owner, id).await?;
            let changed = progress::apply_outcome(&mut card, kind, correct, now);
            let patch = CardPatch {
                status: Some(card.status),
                core_progress: Some(card.core_progress),
                last_reviewed_at: Some(card.last_reviewed_at),
                reviewed_at: Some(card.reviewed_at),
                ..CardPatch::default()
            };
            let stored = self.store.update_one(id, patch).await?;
            debug!(
                target: "practice",
                card = %id,
                %kind,
                correct,
                changed,
                status = %stored.status,
                "outcome recorded"
            );
            updated.push(stored);
        }
        Ok(updated)
    }

    /// Puts one card back to the fresh-learning state.
    #[instrument(level = "info", skip(self), fields(%owner, %card_id))]
    pub async fn reset_card(&self, owner: &str, card_id: &str) -> Result<Card, Error> {
        let mut card = self.resolve(owner, card_id).await?;
        progress::reset_card(&mut card);
        let patch = CardPatch {
            status: Some(CardStatus::Learning),
            core_progress: Some(card.core_progress),
            reading_used: Some(false),
            reviewed_at: Some(None),
            ..CardPatch::default()
        };
        let stored = self.store.update_one(card_id, patch).await?;
        info!(target: "practice", card = %card_id, "card reset to learning");
        Ok(stored)
    }

    /// Owner-checked id lookup. A card belonging to someone else reads the
    /// same as a missing one.
    async fn resolve(&self, owner: &str, id: &str) -> Result<Card, Error> {
        match self.store.find_by_id(id).await? {
            Some(card) if card.owner_id == owner => Ok(card),
            _ => Err(Error::NotFound(id.to_string())),
        }
    }
}
