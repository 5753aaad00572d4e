//! Learning-progress state machine: one exercise outcome applied to one card.
//!
//! Pure card-in/card-out logic. Persistence and id resolution live in the
//! practice service; time comes in as a parameter.

use chrono::{DateTime, Utc};

use crate::domain::{Card, CardStatus, ExerciseKind};

/// Applies the outcome of a single exercise attempt to `card`.
///
/// Core kinds: a correct answer marks the kind completed, and completing the
/// fourth moves the card to review and stamps `reviewed_at`. An incorrect
/// answer wipes all completion marks and puts the card back in learning, no
/// matter what was accumulated. The auxiliary reading-comprehension kind only
/// refreshes `last_reviewed_at`; its pass/fail is not card state.
///
/// Returns whether the card's learning state changed. Timestamp refreshes do
/// not count as a change.
pub fn apply_outcome(
    card: &mut Card,
    kind: ExerciseKind,
    correct: bool,
    now: DateTime<Utc>,
) -> bool {
    card.last_reviewed_at = now;

    if !kind.is_core() {
        // Rotation marks reading-comprehension usage at selection time; the
        // outcome itself carries nothing for the card.
        return false;
    }

    if correct {
        let mut changed = card.core_progress.insert(kind);
        if card.core_progress.is_complete() && card.status != CardStatus::Review {
            card.status = CardStatus::Review;
            card.reviewed_at = Some(now);
            changed = true;
        }
        changed
    } else {
        let changed = card.core_progress.count() > 0 || card.status == CardStatus::Review;
        card.core_progress.clear();
        card.status = CardStatus::Learning;
        card.reviewed_at = None;
        changed
    }
}

/// Puts a card back to the fresh-learning state: status, all completion
/// marks, the rotation flag, and `reviewed_at`. Review timestamps of past
/// activity (`last_reviewed_at`, `added_to_learning_at`) are left alone.
pub fn reset_card(card: &mut Card) {
    card.status = CardStatus::Learning;
    card.core_progress.clear();
    card.reading_used = false;
    card.reviewed_at = None;
}
