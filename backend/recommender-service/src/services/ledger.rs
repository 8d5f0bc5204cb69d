// ============================================
// Rating Ledger
// ============================================
//
// Records and removes likes/dislikes along with the global counters. Every
// change is followed by a pipeline run.
//
// Redis keys:
// - {class}:user:{user_id}:liked / :disliked - Items the user rated
// - {class}:item:{item_id}:liked / :disliked - Users who rated the item
// - {class}:mostLiked / mostDisliked - Sorted set of items by rating count
//
// Existence is checked before the counter moves. Two concurrent identical
// ratings can both see "absent" and increment twice; that race is accepted.

use set_store::SharedStore;
use tracing::debug;

use crate::error::{RecommenderError, Result};
use crate::keys::KeySchema;
use crate::metrics;
use crate::models::{Feeling, RatingChange, RatingOutcome};
use crate::services::pipeline::RatingPipeline;

#[derive(Clone)]
pub struct RatingLedger {
    store: SharedStore,
    keys: KeySchema,
    pipeline: RatingPipeline,
}

impl RatingLedger {
    pub fn new(store: SharedStore, keys: KeySchema, pipeline: RatingPipeline) -> Self {
        Self {
            store,
            keys,
            pipeline,
        }
    }

    /// Record a rating and run the pipeline.
    ///
    /// Re-recording an existing rating leaves the counter alone but still runs
    /// the pipeline. Rating an item the opposite way first requires removing
    /// the existing rating.
    pub async fn record_rating(
        &self,
        user_id: &str,
        item_id: &str,
        feeling: Feeling,
    ) -> Result<RatingOutcome> {
        let opposite = feeling.opposite();
        let opposite_key = self.keys.user_feeling(user_id, opposite);
        let user_key = self.keys.user_feeling(user_id, feeling);

        let (conflicting, already_present) = tokio::try_join!(
            self.store.set_is_member(&opposite_key, item_id),
            self.store.set_is_member(&user_key, item_id),
        )?;

        if conflicting {
            metrics::record_rating(feeling.as_str(), "conflict");
            return Err(RecommenderError::ConflictingRating {
                user_id: user_id.to_string(),
                item_id: item_id.to_string(),
                existing: opposite,
            });
        }

        let item_key = self.keys.item_feeling(item_id, feeling);
        tokio::try_join!(
            self.store.set_add(&user_key, item_id),
            self.store.set_add(&item_key, user_id),
        )?;

        let change = if already_present {
            RatingChange::AlreadyPresent
        } else {
            let count = self
                .store
                .sorted_set_increment(&self.keys.most_feeling(feeling), 1.0, item_id)
                .await?;
            debug!(item_id = %item_id, feeling = %feeling, count = count, "Counter incremented");
            RatingChange::Added
        };

        self.finish(user_id, item_id, feeling, change).await
    }

    /// Remove a rating and run the pipeline.
    ///
    /// Removing a rating that does not exist changes nothing and skips the
    /// pipeline.
    pub async fn remove_rating(
        &self,
        user_id: &str,
        item_id: &str,
        feeling: Feeling,
    ) -> Result<RatingOutcome> {
        let user_key = self.keys.user_feeling(user_id, feeling);
        let item_key = self.keys.item_feeling(item_id, feeling);

        if !self.store.set_is_member(&user_key, item_id).await? {
            metrics::record_rating(feeling.as_str(), RatingChange::NotPresent.as_str());
            debug!(
                user_id = %user_id,
                item_id = %item_id,
                feeling = %feeling,
                "Rating not present, nothing to remove"
            );
            return Ok(RatingOutcome {
                change: RatingChange::NotPresent,
                pipeline: None,
            });
        }

        tokio::try_join!(
            self.store.set_remove(&user_key, item_id),
            self.store.set_remove(&item_key, user_id),
        )?;

        let counter_key = self.keys.most_feeling(feeling);
        let count = self
            .store
            .sorted_set_increment(&counter_key, -1.0, item_id)
            .await?;
        if count <= 0.0 {
            self.store.sorted_set_remove(&counter_key, item_id).await?;
        }

        self.finish(user_id, item_id, feeling, RatingChange::Removed)
            .await
    }

    async fn finish(
        &self,
        user_id: &str,
        item_id: &str,
        feeling: Feeling,
        change: RatingChange,
    ) -> Result<RatingOutcome> {
        metrics::record_rating(feeling.as_str(), change.as_str());
        debug!(
            user_id = %user_id,
            item_id = %item_id,
            feeling = %feeling,
            change = change.as_str(),
            "Rating ledger updated"
        );

        let report = self.pipeline.on_rating_changed(user_id, item_id).await?;
        Ok(RatingOutcome {
            change,
            pipeline: Some(report),
        })
    }
}
