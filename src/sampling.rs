//! Randomized pickers shared by the exercise selectors.
//!
//! Callers pass the RNG in, so tests drive these with a seeded [`StdRng`]
//! while the server uses [`rand::thread_rng`].
//!
//! [`StdRng`]: rand::rngs::StdRng

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::domain::Card;

/// Uniform in-place permutation (Fisher-Yates via [`SliceRandom::shuffle`]).
pub fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    items.shuffle(rng);
}

/// Picks up to `limit` cards without replacement, weighted so cards with the
/// oldest `last_reviewed_at` are favored without starving recent ones.
///
/// Weights are linear in recency rank (oldest gets `n`, newest gets `1`), so
/// the bias is stable regardless of how far apart the timestamps are. The
/// picks are shuffled before returning; order carries no signal. When the
/// pool is not larger than `limit` the whole pool comes back, shuffled.
pub fn pick_weighted_by_age(mut pool: Vec<Card>, limit: usize, rng: &mut impl Rng) -> Vec<Card> {
    if pool.len() <= limit {
        shuffle(&mut pool, rng);
        return pool;
    }

    pool.sort_by_key(|c| c.last_reviewed_at);
    let n = pool.len();
    let ranked: Vec<usize> = (0..n).collect();
    let picked_indices: Vec<usize> = match ranked.choose_multiple_weighted(rng, limit, |&i| {
        (n - i) as f64
    }) {
        Ok(picks) => picks.copied().collect(),
        Err(e) => {
            // Weights built here are always >= 1, so this is unreachable in
            // practice; degrade to a uniform sample rather than failing the
            // selection.
            warn!(target: "practice", error = %e, "weighted pick failed; using uniform sample");
            let mut all: Vec<usize> = (0..n).collect();
            all.shuffle(rng);
            all.truncate(limit);
            all
        }
    };

    let mut picked: Vec<Card> = picked_indices.into_iter().map(|i| pool[i].clone()).collect();
    shuffle(&mut picked, rng);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn aged_cards(count: usize) -> Vec<Card> {
        let now = Utc::now();
        (0..count)
            .map(|i| {
                let mut c = Card::new(
                    "u1".into(),
                    None,
                    format!("word-{i}"),
                    format!("translation-{i}"),
                    now,
                );
                // word-0 is the most recently seen, word-(count-1) the oldest.
                c.last_reviewed_at = now - Duration::days(i as i64);
                c
            })
            .collect()
    }

    #[test]
    fn shuffle_preserves_the_multiset() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [0usize, 1, 2, 17, 100] {
            let original: Vec<u32> = (0..len as u32).collect();
            let mut shuffled = original.clone();
            shuffle(&mut shuffled, &mut rng);
            let mut sorted = shuffled.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, original, "len {len}");
        }
    }

    #[test]
    fn small_pool_comes_back_whole() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = aged_cards(3);
        let ids: HashSet<_> = pool.iter().map(|c| c.id.clone()).collect();

        let picked = pick_weighted_by_age(pool, 10, &mut rng);
        assert_eq!(picked.len(), 3);
        let picked_ids: HashSet<_> = picked.iter().map(|c| c.id.clone()).collect();
        assert_eq!(picked_ids, ids);
    }

    #[test]
    fn large_pool_yields_exactly_limit_distinct_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = aged_cards(20);
        let ids: HashSet<_> = pool.iter().map(|c| c.id.clone()).collect();

        let picked = pick_weighted_by_age(pool, 5, &mut rng);
        assert_eq!(picked.len(), 5);
        let picked_ids: HashSet<_> = picked.iter().map(|c| c.id.clone()).collect();
        assert_eq!(picked_ids.len(), 5, "picks must be distinct");
        assert!(picked_ids.is_subset(&ids));
    }

    #[test]
    fn older_cards_are_picked_more_often() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = aged_cards(10);
        let oldest = pool.last().map(|c| c.id.clone());
        let newest = pool.first().map(|c| c.id.clone());
        let (oldest, newest) = (oldest.unwrap(), newest.unwrap());

        let mut oldest_hits = 0u32;
        let mut newest_hits = 0u32;
        for _ in 0..2000 {
            let picked = pick_weighted_by_age(pool.clone(), 1, &mut rng);
            match picked[0].id.as_str() {
                id if id == oldest => oldest_hits += 1,
                id if id == newest => newest_hits += 1,
                _ => {}
            }
        }
        // Linear rank weights make the oldest card 10x as likely as the
        // newest; with 2000 draws the gap is far outside noise.
        assert!(
            oldest_hits > newest_hits * 3,
            "oldest {oldest_hits} vs newest {newest_hits}"
        );
    }

    #[test]
    fn zero_limit_picks_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pick_weighted_by_age(aged_cards(4), 0, &mut rng);
        assert!(picked.is_empty());
    }
}
