// ============================================
// Global Ranker (Wilson lower bound)
// ============================================
//
// Ranks items by the lower bound of the 95% Wilson confidence interval
// for the like-proportion:
//
//   score = (p + z²/2n - z * sqrt((p(1-p) + z²/4n) / n)) / (1 + z²/n)
//
// Where:
//   - n: likes + dislikes
//   - p: likes / n
//   - z: 1.96
//
// An item with few ratings ranks below one with the same ratio and more
// ratings.
//
// Redis keys:
// - {class}:scoreboard - Sorted set of items by score

use set_store::SharedStore;
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys::KeySchema;
use crate::metrics;

/// Standard normal quantile for a 95% two-sided interval
pub const Z_95: f64 = 1.96;

/// Wilson lower bound for `likes` out of `likes + dislikes`.
///
/// Returns None when the item has no ratings. Rounding error at p = 0 or
/// p = 1 is clamped back into [0, 1].
pub fn wilson_lower_bound(likes: usize, dislikes: usize) -> Option<f64> {
    let n = (likes + dislikes) as f64;
    if n == 0.0 {
        return None;
    }

    let p = likes as f64 / n;
    let z2 = Z_95 * Z_95;
    let centre = p + z2 / (2.0 * n);
    let spread = Z_95 * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();

    Some(((centre - spread) / (1.0 + z2 / n)).clamp(0.0, 1.0))
}

/// Keeps the global scoreboard in step with each item's rating counts
#[derive(Clone)]
pub struct GlobalRanker {
    store: SharedStore,
    keys: KeySchema,
}

impl GlobalRanker {
    pub fn new(store: SharedStore, keys: KeySchema) -> Self {
        Self { store, keys }
    }

    /// Recompute and overwrite the item's score.
    ///
    /// Returns the stored score, or None when the item has no ratings left
    /// (any previous entry is removed).
    pub async fn update_wilson_score(&self, item_id: &str) -> Result<Option<f64>> {
        let scoreboard = self.keys.scoreboard();
        let liked_by_key = self.keys.item_liked_by(item_id);
        let disliked_by_key = self.keys.item_disliked_by(item_id);

        let (likes, dislikes) = tokio::try_join!(
            self.store.set_cardinality(&liked_by_key),
            self.store.set_cardinality(&disliked_by_key),
        )?;

        let Some(raw) = wilson_lower_bound(likes, dislikes) else {
            let removed = self.store.sorted_set_remove(&scoreboard, item_id).await?;
            debug!(item_id = %item_id, removed = removed, "Item has no ratings, not ranked");
            return Ok(None);
        };

        let score = if raw.is_finite() {
            raw
        } else {
            warn!(
                item_id = %item_id,
                likes = likes,
                dislikes = dislikes,
                "Wilson score is not finite, storing 0.0"
            );
            metrics::record_wilson_fallback();
            0.0
        };

        self.store
            .sorted_set_upsert(&scoreboard, score, item_id)
            .await?;

        debug!(
            item_id = %item_id,
            likes = likes,
            dislikes = dislikes,
            score = score,
            "Wilson score updated"
        );

        Ok(Some(score))
    }
}
