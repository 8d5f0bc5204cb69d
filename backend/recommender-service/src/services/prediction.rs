use futures::future::try_join_all;
use set_store::SharedStore;
use tracing::debug;

use crate::error::Result;
use crate::keys::KeySchema;

/// Neighbor-weighted estimate of how a user would rate an item.
///
/// Algorithm:
/// 1. Read the item's liked-by and disliked-by sets
/// 2. Sum the user's similarity to every rater in each set (absent = 0)
/// 3. prediction = (liked_sum - disliked_sum) / (likers + dislikers)
///
/// The result is in [-1, 1]. Items nobody rated predict 0.0.
#[derive(Clone)]
pub struct PredictionEngine {
    store: SharedStore,
    keys: KeySchema,
}

impl PredictionEngine {
    pub fn new(store: SharedStore, keys: KeySchema) -> Self {
        Self { store, keys }
    }

    pub async fn predict(&self, user_id: &str, item_id: &str) -> Result<f64> {
        let similarity_key = self.keys.similarity(user_id);
        let liked_by_key = self.keys.item_liked_by(item_id);
        let disliked_by_key = self.keys.item_disliked_by(item_id);

        let (liked_by, disliked_by) = tokio::try_join!(
            self.store.set_members(&liked_by_key),
            self.store.set_members(&disliked_by_key),
        )?;

        let raters = liked_by.len() + disliked_by.len();
        if raters == 0 {
            return Ok(0.0);
        }

        let (liked_sum, disliked_sum) = tokio::try_join!(
            self.weighted_sum(&similarity_key, &liked_by),
            self.weighted_sum(&similarity_key, &disliked_by),
        )?;

        let prediction = (liked_sum - disliked_sum) / raters as f64;
        if !prediction.is_finite() {
            debug!(user_id = %user_id, item_id = %item_id, "Non-finite prediction, using 0.0");
            return Ok(0.0);
        }

        Ok(prediction)
    }

    /// Sum of the stored similarity of each member (absent members count as 0)
    async fn weighted_sum(&self, similarity_key: &str, members: &[String]) -> Result<f64> {
        let scores = try_join_all(
            members
                .iter()
                .map(|member| self.store.sorted_set_score(similarity_key, member)),
        )
        .await?;

        Ok(scores.into_iter().flatten().sum())
    }
}
