use std::fmt::Display;
use std::sync::Arc;

use set_store::SharedStore;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::keys::{normalize_id, KeySchema};
use crate::models::{Feeling, PipelineReport, RatingOutcome};
use crate::services::{
    ExactScores, GlobalRanker, PredictionEngine, RandomJitter, RatingLedger, RatingPipeline,
    RecommendationMaintainer, SimilarityEngine, SimilarityStrategy, Statistics, TieBreaker,
};

/// Entry point wiring the ledger, pipeline and read accessors over one store.
///
/// Ids may be anything `Display`; they are normalized to strings here so that
/// `42` and `"42"` address the same sets.
#[derive(Clone)]
pub struct Recommender {
    ledger: RatingLedger,
    pipeline: RatingPipeline,
    predictor: PredictionEngine,
    statistics: Statistics,
}

impl Recommender {
    pub fn new(store: SharedStore, config: &EngineConfig) -> Self {
        let tie_breaker: Arc<dyn TieBreaker> = if config.perturb_perfect_scores {
            Arc::new(RandomJitter::default())
        } else {
            Arc::new(ExactScores)
        };
        Self::with_tie_breaker(store, config, tie_breaker)
    }

    pub fn with_tie_breaker(
        store: SharedStore,
        config: &EngineConfig,
        tie_breaker: Arc<dyn TieBreaker>,
    ) -> Self {
        let keys = KeySchema::new(config.class_name.clone());
        let similarity = SimilarityEngine::new(store.clone(), keys.clone(), tie_breaker);
        Self::with_similarity(store, config, Arc::new(similarity))
    }

    /// Build with a custom similarity strategy
    pub fn with_similarity(
        store: SharedStore,
        config: &EngineConfig,
        similarity: Arc<dyn SimilarityStrategy>,
    ) -> Self {
        let keys = KeySchema::new(config.class_name.clone());
        let predictor = PredictionEngine::new(store.clone(), keys.clone());
        let recommendations = RecommendationMaintainer::new(
            store.clone(),
            keys.clone(),
            predictor.clone(),
            config.nearest_neighbors,
            config.num_of_recs_store,
        )
        .with_factor_least_similar_least_liked(config.factor_least_similar_least_liked);
        let pipeline = RatingPipeline::new(
            similarity,
            GlobalRanker::new(store.clone(), keys.clone()),
            recommendations,
        );

        info!(
            class_name = %config.class_name,
            nearest_neighbors = config.nearest_neighbors,
            num_of_recs_store = config.num_of_recs_store,
            factor_least_similar_least_liked = config.factor_least_similar_least_liked,
            "Recommender initialized"
        );

        Self {
            ledger: RatingLedger::new(store.clone(), keys.clone(), pipeline.clone()),
            pipeline,
            predictor,
            statistics: Statistics::new(store, keys),
        }
    }

    // ============= Rating Ledger =============

    pub async fn like(
        &self,
        user_id: impl Display,
        item_id: impl Display,
    ) -> Result<RatingOutcome> {
        self.record_rating(user_id, item_id, true).await
    }

    pub async fn dislike(
        &self,
        user_id: impl Display,
        item_id: impl Display,
    ) -> Result<RatingOutcome> {
        self.record_rating(user_id, item_id, false).await
    }

    pub async fn unlike(
        &self,
        user_id: impl Display,
        item_id: impl Display,
    ) -> Result<RatingOutcome> {
        self.remove_rating(user_id, item_id, true).await
    }

    pub async fn undislike(
        &self,
        user_id: impl Display,
        item_id: impl Display,
    ) -> Result<RatingOutcome> {
        self.remove_rating(user_id, item_id, false).await
    }

    pub async fn record_rating(
        &self,
        user_id: impl Display,
        item_id: impl Display,
        liked: bool,
    ) -> Result<RatingOutcome> {
        let (user_id, item_id) = (normalize_id(user_id)?, normalize_id(item_id)?);
        self.ledger
            .record_rating(&user_id, &item_id, Feeling::from_liked(liked))
            .await
    }

    pub async fn remove_rating(
        &self,
        user_id: impl Display,
        item_id: impl Display,
        liked: bool,
    ) -> Result<RatingOutcome> {
        let (user_id, item_id) = (normalize_id(user_id)?, normalize_id(item_id)?);
        self.ledger
            .remove_rating(&user_id, &item_id, Feeling::from_liked(liked))
            .await
    }

    // ============= Pipeline =============

    /// Recompute everything derived from a user's rating of an item
    pub async fn on_rating_changed(
        &self,
        user_id: impl Display,
        item_id: impl Display,
    ) -> Result<PipelineReport> {
        let (user_id, item_id) = (normalize_id(user_id)?, normalize_id(item_id)?);
        self.pipeline.on_rating_changed(&user_id, &item_id).await
    }

    pub async fn predict(&self, user_id: impl Display, item_id: impl Display) -> Result<f64> {
        let (user_id, item_id) = (normalize_id(user_id)?, normalize_id(item_id)?);
        self.predictor.predict(&user_id, &item_id).await
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}
