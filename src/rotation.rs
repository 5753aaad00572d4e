//! Rotation-based selection for the reading-comprehension exercise.
//!
//! Learning cards in a scope are handed out in cycles: every card is shown
//! once (tracked by `reading_used`) before any card repeats. When a request
//! cannot be filled from unused cards, the whole scope's flags are cleared
//! and a fresh cycle starts within the same request.
//!
//! Requests for the same `(owner, scope)` pair are serialized so concurrent
//! calls cannot read the same usage flags and hand out overlapping picks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::thread_rng;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::{Card, CardId, CardStatus, CategoryScope, OwnerId};
use crate::error::Error;
use crate::sampling;
use crate::store::{CardFilter, CardPatch, CardStore};

/// Result of one rotation-selection request.
#[derive(Clone, Debug)]
pub struct RotationOutcome {
    /// Cards to present, already marked used for the current cycle.
    pub selected: Vec<Card>,
    /// True when this request exhausted the cycle and cleared the scope's
    /// usage flags.
    pub rotation_applied: bool,
    /// Post-write state of every learning card in scope. Lets callers with a
    /// client-side cache resynchronize cards a reset touched.
    pub scope_snapshot: Vec<Card>,
}

impl RotationOutcome {
    fn empty() -> Self {
        RotationOutcome {
            selected: Vec::new(),
            rotation_applied: false,
            scope_snapshot: Vec::new(),
        }
    }
}

type ScopeKey = (OwnerId, Option<CategoryScope>);

/// Serializes rotation requests per `(owner, scope)`.
///
/// One controller instance lives in the practice service. The inner map holds
/// one lock per scope that ever rotated; entries are tiny and never expire.
#[derive(Default)]
pub struct RotationController {
    locks: Mutex<HashMap<ScopeKey, Arc<Mutex<()>>>>,
}

impl RotationController {
    pub fn new() -> Self {
        Self::default()
    }

    async fn scope_lock(&self, key: &ScopeKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    /// Picks up to `requested` learning cards for one reading-comprehension
    /// round and marks them used.
    ///
    /// Scopes smaller than `requested` are returned whole, unmarked and
    /// without cycling, so tiny scopes keep their flags meaningless rather
    /// than resetting on every call. The cycle reset, when it fires, clears
    /// flags for the entire scope; `exclude` narrows only what this request
    /// may pick, never what the reset touches.
    #[instrument(level = "info", skip(self, store, exclude), fields(%owner, ?scope, requested))]
    pub async fn select_with_rotation<S: CardStore>(
        &self,
        store: &S,
        owner: &str,
        scope: Option<CategoryScope>,
        requested: usize,
        exclude: &HashSet<CardId>,
        now: DateTime<Utc>,
    ) -> Result<RotationOutcome, Error> {
        let key = (owner.to_string(), scope.clone());
        let lock = self.scope_lock(&key).await;
        let _guard = lock.lock().await;

        let scope_filter = CardFilter {
            owner: Some(owner.to_string()),
            status: Some(CardStatus::Learning),
            scope,
            ..CardFilter::default()
        };

        let all_in_scope = store.find_many(&scope_filter).await?;
        if all_in_scope.is_empty() {
            return Ok(RotationOutcome::empty());
        }
        if all_in_scope.len() < requested {
            debug!(
                target: "practice",
                pool = all_in_scope.len(),
                requested,
                "scope smaller than request; returning it whole"
            );
            return Ok(RotationOutcome {
                selected: all_in_scope.clone(),
                rotation_applied: false,
                scope_snapshot: all_in_scope,
            });
        }

        let unused: Vec<Card> = all_in_scope
            .iter()
            .filter(|c| !c.reading_used && !exclude.contains(&c.id))
            .cloned()
            .collect();

        let (mut candidates, rotation_applied) = if unused.len() < requested {
            // Cycle exhausted for this request: clear usage flags across the
            // whole scope and restart from the full pool.
            let cleared = store
                .update_many(
                    &scope_filter,
                    CardPatch {
                        reading_used: Some(false),
                        ..CardPatch::default()
                    },
                )
                .await?;
            info!(target: "practice", %owner, cleared, "rotation cycle reset");
            // The pick still honors exclusions after the scope-wide clear.
            let candidate_filter = CardFilter {
                reading_used: Some(false),
                exclude_ids: exclude.clone(),
                ..scope_filter.clone()
            };
            (store.find_many(&candidate_filter).await?, true)
        } else {
            (unused, false)
        };

        if candidates.len() < requested {
            // Exclusions alone keep the request short even after a reset.
            let scope_snapshot = store.find_many(&scope_filter).await?;
            return Ok(RotationOutcome {
                selected: candidates,
                rotation_applied,
                scope_snapshot,
            });
        }

        sampling::shuffle(&mut candidates, &mut thread_rng());
        candidates.truncate(requested);
        let selected_ids: Vec<CardId> = candidates.iter().map(|c| c.id.clone()).collect();

        // Mark before returning; a back-to-back request for this scope must
        // already see these cards as used.
        let mark = CardPatch {
            reading_used: Some(true),
            last_reviewed_at: Some(now),
            ..CardPatch::default()
        };
        for id in &selected_ids {
            store.update_one(id, mark.clone()).await?;
        }

        let scope_snapshot = store.find_many(&scope_filter).await?;
        let selected = {
            let by_id: HashMap<&str, &Card> = scope_snapshot
                .iter()
                .map(|c| (c.id.as_str(), c))
                .collect();
            selected_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|c| (*c).clone()))
                .collect()
        };

        Ok(RotationOutcome {
            selected,
            rotation_applied,
            scope_snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn card(owner: &str, category: Option<&str>, text: &str) -> Card {
        Card::new(
            owner.into(),
            category.map(str::to_string),
            text.into(),
            format!("{text} (en)"),
            Utc::now(),
        )
    }

    async fn seeded_store(cards: &[Card]) -> MemoryStore {
        let store = MemoryStore::new();
        for c in cards {
            store.insert(c.clone()).await.unwrap();
        }
        store
    }

    fn ids(cards: &[Card]) -> HashSet<CardId> {
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[tokio::test]
    async fn empty_scope_yields_an_empty_outcome() {
        let store = MemoryStore::new();
        let controller = RotationController::new();
        let out = controller
            .select_with_rotation(&store, "u1", None, 5, &HashSet::new(), Utc::now())
            .await
            .unwrap();
        assert!(out.selected.is_empty());
        assert!(!out.rotation_applied);
        assert!(out.scope_snapshot.is_empty());
    }

    #[tokio::test]
    async fn small_scope_is_returned_whole_without_marking() {
        let cards = [card("u1", None, "a"), card("u1", None, "b")];
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();

        for _ in 0..3 {
            let out = controller
                .select_with_rotation(&store, "u1", None, 5, &HashSet::new(), Utc::now())
                .await
                .unwrap();
            assert_eq!(ids(&out.selected), ids(&cards));
            assert!(!out.rotation_applied);
        }
        // Partial fills never mark; the flags stay meaningless for the scope.
        for c in &cards {
            let stored = store.find_by_id(&c.id).await.unwrap().unwrap();
            assert!(!stored.reading_used);
        }
    }

    #[tokio::test]
    async fn small_scope_short_circuits_even_when_all_cards_are_used() {
        let mut a = card("u1", None, "a");
        a.reading_used = true;
        let mut b = card("u1", None, "b");
        b.reading_used = true;
        let store = seeded_store(&[a.clone(), b.clone()]).await;
        let controller = RotationController::new();

        let out = controller
            .select_with_rotation(&store, "u1", None, 3, &HashSet::new(), Utc::now())
            .await
            .unwrap();
        // The size check wins over the exhaustion check: no reset happens.
        assert_eq!(out.selected.len(), 2);
        assert!(!out.rotation_applied);
        for id in [&a.id, &b.id] {
            assert!(store.find_by_id(id).await.unwrap().unwrap().reading_used);
        }
    }

    #[tokio::test]
    async fn cycle_covers_every_card_before_repeating() {
        let cards: Vec<Card> = (0..9).map(|i| card("u1", None, &format!("w{i}"))).collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();
        let all = ids(&cards);

        let mut seen: HashSet<CardId> = HashSet::new();
        for round in 0..3 {
            let out = controller
                .select_with_rotation(&store, "u1", None, 3, &HashSet::new(), Utc::now())
                .await
                .unwrap();
            assert_eq!(out.selected.len(), 3, "round {round}");
            assert!(!out.rotation_applied, "round {round}");
            for id in ids(&out.selected) {
                assert!(seen.insert(id), "repeat within cycle at round {round}");
            }
        }
        assert_eq!(seen, all, "one cycle must cover the scope exactly");

        // The next request starts a new cycle.
        let out = controller
            .select_with_rotation(&store, "u1", None, 3, &HashSet::new(), Utc::now())
            .await
            .unwrap();
        assert!(out.rotation_applied);
        assert_eq!(out.selected.len(), 3);
        assert!(ids(&out.selected).is_subset(&all));
    }

    #[tokio::test]
    async fn exact_fit_round_trip_marks_then_resets() {
        let cards: Vec<Card> = (0..3).map(|i| card("u1", None, &format!("w{i}"))).collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();
        let now = Utc::now();

        let first = controller
            .select_with_rotation(&store, "u1", None, 3, &HashSet::new(), now)
            .await
            .unwrap();
        assert_eq!(ids(&first.selected), ids(&cards));
        assert!(!first.rotation_applied);
        for c in &cards {
            let stored = store.find_by_id(&c.id).await.unwrap().unwrap();
            assert!(stored.reading_used);
            assert_eq!(stored.last_reviewed_at, now);
        }

        let second = controller
            .select_with_rotation(&store, "u1", None, 3, &HashSet::new(), Utc::now())
            .await
            .unwrap();
        assert!(second.rotation_applied);
        assert_eq!(ids(&second.selected), ids(&cards));
    }

    #[tokio::test]
    async fn returned_cards_carry_post_write_state() {
        let cards: Vec<Card> = (0..4).map(|i| card("u1", None, &format!("w{i}"))).collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();
        let now = Utc::now() + Duration::minutes(1);

        let out = controller
            .select_with_rotation(&store, "u1", None, 2, &HashSet::new(), now)
            .await
            .unwrap();
        assert_eq!(out.selected.len(), 2);
        for c in &out.selected {
            assert!(c.reading_used, "selected cards reflect the marking write");
            assert_eq!(c.last_reviewed_at, now);
        }

        assert_eq!(out.scope_snapshot.len(), 4);
        let picked = ids(&out.selected);
        for c in &out.scope_snapshot {
            assert_eq!(c.reading_used, picked.contains(&c.id));
        }
    }

    #[tokio::test]
    async fn reset_ignores_exclusions_but_the_pick_honors_them() {
        // Mid-cycle scope: all four used, two excluded by the session.
        let cards: Vec<Card> = (0..4)
            .map(|i| {
                let mut c = card("u1", None, &format!("w{i}"));
                c.reading_used = true;
                c
            })
            .collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();
        let exclude: HashSet<CardId> =
            [cards[0].id.clone(), cards[1].id.clone()].into_iter().collect();

        let out = controller
            .select_with_rotation(&store, "u1", None, 3, &exclude, Utc::now())
            .await
            .unwrap();

        // The reset fired and touched the excluded cards too.
        assert!(out.rotation_applied);
        for c in &cards {
            let stored = store.find_by_id(&c.id).await.unwrap().unwrap();
            assert!(!stored.reading_used, "reset is scope-wide");
        }
        // Even after the reset only two candidates remain, so the fill is
        // partial and nothing gets marked.
        assert_eq!(
            ids(&out.selected),
            [cards[2].id.clone(), cards[3].id.clone()].into_iter().collect()
        );
        assert_eq!(out.scope_snapshot.len(), 4);
    }

    #[tokio::test]
    async fn exclusions_narrow_a_full_fill() {
        let cards: Vec<Card> = (0..5).map(|i| card("u1", None, &format!("w{i}"))).collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();
        let exclude: HashSet<CardId> = [cards[0].id.clone()].into_iter().collect();

        let out = controller
            .select_with_rotation(&store, "u1", None, 3, &exclude, Utc::now())
            .await
            .unwrap();
        assert_eq!(out.selected.len(), 3);
        assert!(!ids(&out.selected).contains(&cards[0].id));
        assert!(!out.rotation_applied);
    }

    #[tokio::test]
    async fn scopes_rotate_independently() {
        let food: Vec<Card> = (0..2).map(|i| card("u1", Some("food"), &format!("f{i}"))).collect();
        let mut verbs: Vec<Card> =
            (0..2).map(|i| card("u1", Some("verbs"), &format!("v{i}"))).collect();
        for v in &mut verbs {
            v.reading_used = true;
        }
        let store = seeded_store(&[food.clone(), verbs.clone()].concat()).await;
        let controller = RotationController::new();

        // Exhausting and resetting the food scope must not clear verb flags.
        let out = controller
            .select_with_rotation(
                &store,
                "u1",
                Some(CategoryScope::Category("food".into())),
                2,
                &HashSet::new(),
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(out.selected.len(), 2);
        let out = controller
            .select_with_rotation(
                &store,
                "u1",
                Some(CategoryScope::Category("food".into())),
                2,
                &HashSet::new(),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(out.rotation_applied);

        for v in &verbs {
            let stored = store.find_by_id(&v.id).await.unwrap().unwrap();
            assert!(stored.reading_used, "other scopes keep their cycle state");
        }
    }

    #[tokio::test]
    async fn review_cards_are_invisible_to_rotation() {
        let learning = card("u1", None, "learning");
        let mut review = card("u1", None, "review");
        review.status = CardStatus::Review;
        let store = seeded_store(&[learning.clone(), review.clone()]).await;
        let controller = RotationController::new();

        let out = controller
            .select_with_rotation(&store, "u1", None, 1, &HashSet::new(), Utc::now())
            .await
            .unwrap();
        assert_eq!(ids(&out.selected), ids(&[learning]));
        assert_eq!(out.scope_snapshot.len(), 1);

        let stored = store.find_by_id(&review.id).await.unwrap().unwrap();
        assert!(!stored.reading_used);
    }

    #[tokio::test]
    async fn concurrent_requests_share_the_cycle() {
        let cards: Vec<Card> = (0..6).map(|i| card("u1", None, &format!("w{i}"))).collect();
        let store = seeded_store(&cards).await;
        let controller = RotationController::new();

        // Bound outside the join so the borrows outlive both futures.
        let none = HashSet::new();
        let (a, b) = tokio::join!(
            controller.select_with_rotation(&store, "u1", None, 3, &none, Utc::now()),
            controller.select_with_rotation(&store, "u1", None, 3, &none, Utc::now()),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.selected.len(), 3);
        assert_eq!(b.selected.len(), 3);
        assert!(!a.rotation_applied);
        assert!(!b.rotation_applied);

        let overlap: Vec<_> = ids(&a.selected).intersection(&ids(&b.selected)).cloned().collect();
        assert!(overlap.is_empty(), "requests in one cycle must not overlap");

        let mut union = ids(&a.selected);
        union.extend(ids(&b.selected));
        assert_eq!(union, ids(&cards));
    }
}
