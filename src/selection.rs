//! Eligibility selection for the four core exercise types.
//!
//! A read-only query: eligible cards are the owner's learning cards that have
//! not yet completed the requested kind, minus session exclusions, narrowed
//! by category scope. The pick over that pool favors cards unseen longest.

use std::collections::HashSet;

use rand::thread_rng;
use tracing::{debug, instrument};

use crate::domain::{Card, CardId, CardStatus, CategoryScope, ExerciseKind};
use crate::error::Error;
use crate::sampling;
use crate::store::{CardFilter, CardStore};

/// Picks up to `limit` cards for one core exercise round.
///
/// Never writes to the store. Returns fewer than `limit` cards only when
/// fewer eligible cards exist.
#[instrument(level = "debug", skip(store, exclude), fields(%owner, %kind, limit))]
pub async fn select_for_core_exercise<S: CardStore>(
    store: &S,
    owner: &str,
    kind: ExerciseKind,
    limit: usize,
    scope: Option<CategoryScope>,
    exclude: &HashSet<CardId>,
) -> Result<Vec<Card>, Error> {
    if !kind.is_core() {
        return Err(Error::InvalidArgument(format!(
            "{kind} is not a core exercise type"
        )));
    }
    if limit == 0 {
        return Err(Error::InvalidArgument("limit must be positive".into()));
    }

    let filter = CardFilter {
        owner: Some(owner.to_string()),
        status: Some(CardStatus::Learning),
        scope,
        core_flag: Some((kind, false)),
        exclude_ids: exclude.clone(),
        ..CardFilter::default()
    };
    let pool = store.find_many(&filter).await?;
    let picked = sampling::pick_weighted_by_age(pool, limit, &mut thread_rng());
    debug!(target: "practice", %owner, %kind, served = picked.len(), "core selection");
    Ok(picked)
}
