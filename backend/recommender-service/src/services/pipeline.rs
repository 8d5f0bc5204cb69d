use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::error::Result;
use crate::metrics;
use crate::models::{PipelineReport, RecommendationOutcome};
use crate::services::recommendations::RecommendationMaintainer;
use crate::services::scoreboard::GlobalRanker;
use crate::services::similarity::SimilarityStrategy;

/// Runs the derived-state updates that follow a rating change.
///
/// Similarity goes first since recommendations read it. The Wilson score and
/// the recommendation list then update concurrently. There is no retry: a
/// store failure fails the whole run and leaves partial writes in place.
#[derive(Clone)]
pub struct RatingPipeline {
    similarity: Arc<dyn SimilarityStrategy>,
    ranker: GlobalRanker,
    recommendations: RecommendationMaintainer,
}

impl RatingPipeline {
    pub fn new(
        similarity: Arc<dyn SimilarityStrategy>,
        ranker: GlobalRanker,
        recommendations: RecommendationMaintainer,
    ) -> Self {
        Self {
            similarity,
            ranker,
            recommendations,
        }
    }

    pub async fn on_rating_changed(&self, user_id: &str, item_id: &str) -> Result<PipelineReport> {
        let started = Instant::now();
        let result = self.run(user_id, item_id).await;
        metrics::observe_stage("total", started.elapsed());
        metrics::record_pipeline(result.is_ok());

        match &result {
            Ok(report) => info!(
                user_id = %user_id,
                item_id = %item_id,
                neighbors = report.neighbors,
                wilson_score = ?report.wilson_score,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Rating change processed"
            ),
            Err(e) => error!(
                user_id = %user_id,
                item_id = %item_id,
                error = %e,
                "Rating change pipeline failed"
            ),
        }

        result
    }

    async fn run(&self, user_id: &str, item_id: &str) -> Result<PipelineReport> {
        let started = Instant::now();
        let neighbors = self.similarity.update_similarity_for(user_id).await?;
        metrics::observe_stage("similarity", started.elapsed());

        let (wilson_score, recommendations) = tokio::try_join!(
            self.timed_wilson(item_id),
            self.timed_recommendations(user_id),
        )?;

        Ok(PipelineReport {
            neighbors,
            wilson_score,
            recommendations,
        })
    }

    async fn timed_wilson(&self, item_id: &str) -> Result<Option<f64>> {
        let started = Instant::now();
        let score = self.ranker.update_wilson_score(item_id).await;
        metrics::observe_stage("wilson", started.elapsed());
        score
    }

    async fn timed_recommendations(&self, user_id: &str) -> Result<RecommendationOutcome> {
        let started = Instant::now();
        let outcome = self.recommendations.update_recommendations_for(user_id).await;
        metrics::observe_stage("recommendations", started.elapsed());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeySchema;
    use crate::models::Feeling;
    use crate::services::prediction::PredictionEngine;
    use crate::services::similarity::{ExactScores, SimilarityEngine};
    use crate::services::test_support::{rate, test_store, FailingStore};
    use async_trait::async_trait;
    use set_store::SharedStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pipeline_with(
        store: &SharedStore,
        similarity: Arc<dyn SimilarityStrategy>,
    ) -> RatingPipeline {
        let keys = KeySchema::new("movie");
        let predictor = PredictionEngine::new(store.clone(), keys.clone());
        RatingPipeline::new(
            similarity,
            GlobalRanker::new(store.clone(), keys.clone()),
            RecommendationMaintainer::new(store.clone(), keys, predictor, 5, 30),
        )
    }

    struct CountingStrategy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityStrategy for CountingStrategy {
        async fn update_similarity_for(&self, _user_id: &str) -> Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_pipeline_updates_all_derived_state() {
        let store = test_store();
        rate(&store, "a", "x", Feeling::Liked).await;
        rate(&store, "b", "x", Feeling::Liked).await;
        rate(&store, "b", "y", Feeling::Liked).await;

        let engine = SimilarityEngine::new(
            store.clone(),
            KeySchema::new("movie"),
            Arc::new(ExactScores),
        );
        let report = pipeline_with(&store, Arc::new(engine))
            .on_rating_changed("a", "x")
            .await
            .unwrap();

        assert_eq!(report.neighbors, 1);
        assert!(report.wilson_score.is_some());
        assert_eq!(
            report.recommendations,
            RecommendationOutcome::Replaced {
                candidates: 1,
                stored: 1
            }
        );
        assert_eq!(
            store
                .sorted_set_range_desc("movie:user:a:recommendedSet", 0, -1)
                .await
                .unwrap(),
            vec!["y"]
        );
    }

    #[tokio::test]
    async fn test_similarity_strategy_is_pluggable() {
        let store = test_store();
        rate(&store, "a", "x", Feeling::Liked).await;

        let strategy = Arc::new(CountingStrategy {
            calls: AtomicUsize::new(0),
        });
        let report = pipeline_with(&store, strategy.clone())
            .on_rating_changed("a", "x")
            .await
            .unwrap();

        assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.recommendations, RecommendationOutcome::NoCandidates);
        assert!(report.wilson_score.unwrap() > 0.0);
    }

    fn similarity_engine(store: &SharedStore) -> Arc<dyn SimilarityStrategy> {
        Arc::new(SimilarityEngine::new(
            store.clone(),
            KeySchema::new("movie"),
            Arc::new(ExactScores),
        ))
    }

    async fn seed_pair(store: &SharedStore) {
        rate(store, "a", "x", Feeling::Liked).await;
        rate(store, "b", "x", Feeling::Liked).await;
        rate(store, "b", "y", Feeling::Liked).await;
    }

    #[tokio::test]
    async fn test_failed_recommendations_keep_similarity_writes() {
        let store = test_store();
        seed_pair(&store).await;

        let failing = FailingStore::wrap(&store, "set_union_store");
        let result = pipeline_with(&failing, similarity_engine(&failing))
            .on_rating_changed("a", "x")
            .await;

        assert!(result.is_err());
        assert_eq!(
            store
                .sorted_set_score("movie:user:a:similarSet", "b")
                .await
                .unwrap(),
            Some(1.0)
        );
        assert_eq!(
            store
                .sorted_set_cardinality("movie:user:a:recommendedSet")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_failed_wilson_update_fails_the_run() {
        let store = test_store();
        seed_pair(&store).await;

        let failing = FailingStore::wrap(&store, "set_cardinality");
        let result = pipeline_with(&failing, similarity_engine(&failing))
            .on_rating_changed("a", "x")
            .await;

        assert!(matches!(result, Err(crate::error::RecommenderError::Store(_))));
        assert_eq!(
            store
                .sorted_set_score("movie:user:a:similarSet", "b")
                .await
                .unwrap(),
            Some(1.0)
        );
        assert_eq!(
            store.sorted_set_score("movie:scoreboard", "x").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_similarity_stops_before_later_stages() {
        let store = test_store();
        seed_pair(&store).await;

        let failing = FailingStore::wrap(&store, "set_intersect");
        let result = pipeline_with(&failing, similarity_engine(&failing))
            .on_rating_changed("a", "x")
            .await;

        assert!(result.is_err());
        assert_eq!(
            store.sorted_set_score("movie:scoreboard", "x").await.unwrap(),
            None
        );
    }
}
