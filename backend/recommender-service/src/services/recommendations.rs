// ============================================
// Recommendation Maintainer
// ============================================
//
// Rebuilds a user's stored recommendation list:
// 1. Take the K most similar and K least similar neighbors
// 2. Pool the nearest neighbors' likes and the farthest neighbors' dislikes
// 3. Drop everything the user already rated
// 4. Score each candidate with the Prediction Engine
// 5. Replace the stored list and trim it to the configured cap
//
// Redis keys:
// - {class}:user:{user_id}:tempAllLikedSet - Candidate pool (scratch)
// - {class}:user:{user_id}:recommendedSet - Sorted set of items by prediction

use futures::future::try_join_all;
use set_store::SharedStore;
use tracing::debug;

use crate::error::{RecommenderError, Result};
use crate::keys::KeySchema;
use crate::models::RecommendationOutcome;
use crate::services::prediction::PredictionEngine;

#[derive(Clone)]
pub struct RecommendationMaintainer {
    store: SharedStore,
    keys: KeySchema,
    predictor: PredictionEngine,
    nearest_neighbors: usize,
    num_of_recs_store: usize,
    factor_least_similar_least_liked: bool,
}

impl RecommendationMaintainer {
    pub fn new(
        store: SharedStore,
        keys: KeySchema,
        predictor: PredictionEngine,
        nearest_neighbors: usize,
        num_of_recs_store: usize,
    ) -> Self {
        Self {
            store,
            keys,
            predictor,
            nearest_neighbors,
            num_of_recs_store,
            factor_least_similar_least_liked: false,
        }
    }

    /// Also pool the nearest neighbors' dislikes.
    ///
    /// Off by default: it floods the pool with items everybody dislikes.
    pub fn with_factor_least_similar_least_liked(mut self, enabled: bool) -> Self {
        self.factor_least_similar_least_liked = enabled;
        self
    }

    /// Keys whose union forms the candidate pool
    async fn candidate_sources(&self, user_id: &str) -> Result<Vec<String>> {
        let similarity_key = self.keys.similarity(user_id);
        let stop = self.nearest_neighbors as isize - 1;

        let (most_similar, least_similar) = tokio::try_join!(
            self.store.sorted_set_range_desc(&similarity_key, 0, stop),
            self.store.sorted_set_range_asc(&similarity_key, 0, stop),
        )?;

        let mut sources: Vec<String> = most_similar
            .iter()
            .map(|neighbor| self.keys.user_liked(neighbor))
            .collect();
        sources.extend(
            least_similar
                .iter()
                .map(|neighbor| self.keys.user_disliked(neighbor)),
        );
        if self.factor_least_similar_least_liked {
            sources.extend(
                most_similar
                    .iter()
                    .map(|neighbor| self.keys.user_disliked(neighbor)),
            );
        }

        Ok(sources)
    }

    pub async fn update_recommendations_for(&self, user_id: &str) -> Result<RecommendationOutcome> {
        let sources = self.candidate_sources(user_id).await?;
        if sources.is_empty() {
            debug!(user_id = %user_id, "No neighbors, keeping stored recommendations");
            return Ok(RecommendationOutcome::NoCandidates);
        }

        let scratch = self.keys.temp_union(user_id);
        let replaced = self.replace_from_pool(user_id, &scratch, &sources).await;
        let cleanup = self.store.delete(&scratch).await;
        let outcome = replaced?;
        cleanup?;

        if let RecommendationOutcome::Replaced { candidates, stored } = outcome {
            let trimmed = self.trim(user_id, stored).await?;
            debug!(
                user_id = %user_id,
                candidates = candidates,
                trimmed = trimmed,
                "Recommendations replaced"
            );
            return Ok(RecommendationOutcome::Replaced {
                candidates,
                stored: stored - trimmed,
            });
        }

        debug!(user_id = %user_id, "Neighbors contributed no candidates");
        Ok(outcome)
    }

    /// Pool candidates into `scratch`, score them and overwrite the stored
    /// list. The caller owns the scratch key and deletes it on every path.
    async fn replace_from_pool(
        &self,
        user_id: &str,
        scratch: &str,
        sources: &[String],
    ) -> Result<RecommendationOutcome> {
        let pooled = self.store.set_union_store(scratch, sources).await?;
        if pooled == 0 {
            return Ok(RecommendationOutcome::NoCandidates);
        }

        let rated = [self.keys.user_liked(user_id), self.keys.user_disliked(user_id)];
        let candidates = self.store.set_difference(scratch, &rated).await?;

        let scored = try_join_all(candidates.iter().map(|item| async move {
            let prediction = self.predictor.predict(user_id, item).await?;
            Ok::<_, RecommenderError>((item, prediction))
        }))
        .await?;

        let recommended = self.keys.recommended(user_id);
        self.store.delete(&recommended).await?;
        try_join_all(scored.iter().map(|(item, prediction)| {
            self.store
                .sorted_set_upsert(&recommended, *prediction, item)
        }))
        .await?;

        let stored = self.store.sorted_set_cardinality(&recommended).await?;
        Ok(RecommendationOutcome::Replaced {
            candidates: candidates.len(),
            stored,
        })
    }

    /// Drop the lowest-ranked surplus above the cap
    async fn trim(&self, user_id: &str, stored: usize) -> Result<usize> {
        if stored <= self.num_of_recs_store {
            return Ok(0);
        }
        let trimmed = self
            .store
            .sorted_set_trim_lowest(&self.keys.recommended(user_id), stored - self.num_of_recs_store)
            .await?;
        Ok(trimmed)
    }
}
