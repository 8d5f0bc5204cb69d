// ============================================
// Similarity Engine
// ============================================
//
// Similarity between two users over the items both rated:
//   agree    = |L1 ∩ L2| + |D1 ∩ D2|
//   disagree = |L1 ∩ D2| + |D1 ∩ L2|
//   score    = (agree - disagree) / (agree + disagree)
//
// The score is in [-1, 1] and undefined when nothing is shared.
//
// Redis keys:
// - {class}:user:{user_id}:similarSet - Sorted set of other users by score

use async_trait::async_trait;
use futures::future::try_join_all;
use rand::Rng;
use set_store::SharedStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::{RecommenderError, Result};
use crate::keys::KeySchema;

/// Agreement counts between two users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingOverlap {
    pub agree: usize,
    pub disagree: usize,
}

impl RatingOverlap {
    /// Items rated by both users, whatever the direction
    pub fn common(&self) -> usize {
        self.agree + self.disagree
    }

    pub fn score(&self) -> Option<f64> {
        let common = self.common();
        if common == 0 {
            return None;
        }
        Some((self.agree as f64 - self.disagree as f64) / common as f64)
    }
}

/// Source of the tie-break applied to stored similarity scores
pub trait TieBreaker: Send + Sync {
    fn perturb(&self, score: f64) -> f64;
}

/// Moves perfect +1/-1 scores toward zero by a random epsilon so that
/// perfectly tied neighbors do not keep the same order on every recompute.
pub struct RandomJitter {
    max_epsilon: f64,
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self { max_epsilon: 1e-4 }
    }
}

impl RandomJitter {
    pub fn new(max_epsilon: f64) -> Self {
        Self { max_epsilon }
    }
}

impl TieBreaker for RandomJitter {
    fn perturb(&self, score: f64) -> f64 {
        if score.abs() < 1.0 || self.max_epsilon <= 0.0 {
            return score;
        }
        let epsilon = rand::thread_rng().gen_range(0.0..self.max_epsilon);
        score - score.signum() * epsilon
    }
}

/// Stores scores as computed
pub struct ExactScores;

impl TieBreaker for ExactScores {
    fn perturb(&self, score: f64) -> f64 {
        score
    }
}

/// Maintains a user's similarity set.
///
/// The pipeline only depends on this trait, so the full recompute below can be
/// swapped for an incremental strategy without touching callers.
#[async_trait]
pub trait SimilarityStrategy: Send + Sync {
    /// Refresh the user's similarity set. Returns the number of neighbors stored.
    async fn update_similarity_for(&self, user_id: &str) -> Result<usize>;
}

/// Full-recompute similarity over co-raters
#[derive(Clone)]
pub struct SimilarityEngine {
    store: SharedStore,
    keys: KeySchema,
    tie_breaker: Arc<dyn TieBreaker>,
}

impl SimilarityEngine {
    pub fn new(store: SharedStore, keys: KeySchema, tie_breaker: Arc<dyn TieBreaker>) -> Self {
        Self {
            store,
            keys,
            tie_breaker,
        }
    }

    /// Count agreements and disagreements between two users
    pub async fn overlap(&self, user_a: &str, user_b: &str) -> Result<RatingOverlap> {
        let (liked_a, disliked_a) = (self.keys.user_liked(user_a), self.keys.user_disliked(user_a));
        let (liked_b, disliked_b) = (self.keys.user_liked(user_b), self.keys.user_disliked(user_b));

        let both_liked = [liked_a.clone(), liked_b.clone()];
        let both_disliked = [disliked_a.clone(), disliked_b.clone()];
        let a_liked_b_disliked = [liked_a, disliked_b];
        let a_disliked_b_liked = [disliked_a, liked_b];

        let (both_liked, both_disliked, a_liked_b_disliked, a_disliked_b_liked) = tokio::try_join!(
            self.store.set_intersect(&both_liked),
            self.store.set_intersect(&both_disliked),
            self.store.set_intersect(&a_liked_b_disliked),
            self.store.set_intersect(&a_disliked_b_liked),
        )?;

        Ok(RatingOverlap {
            agree: both_liked.len() + both_disliked.len(),
            disagree: a_liked_b_disliked.len() + a_disliked_b_liked.len(),
        })
    }

    /// Similarity in [-1, 1], or None when the users share no rated item
    pub async fn similarity(&self, user_a: &str, user_b: &str) -> Result<Option<f64>> {
        Ok(self.overlap(user_a, user_b).await?.score())
    }

    /// Drop neighbors that no longer share a rated item with the user
    async fn prune_stale(&self, similarity_key: &str, current: &HashSet<String>) -> Result<usize> {
        let existing = self.store.sorted_set_range_asc(similarity_key, 0, -1).await?;
        let stale: Vec<&String> = existing
            .iter()
            .filter(|member| !current.contains(*member))
            .collect();

        try_join_all(
            stale
                .iter()
                .map(|member| self.store.sorted_set_remove(similarity_key, member)),
        )
        .await?;

        Ok(stale.len())
    }
}

#[async_trait]
impl SimilarityStrategy for SimilarityEngine {
    async fn update_similarity_for(&self, user_id: &str) -> Result<usize> {
        let similarity_key = self.keys.similarity(user_id);
        let own_sets = [self.keys.user_liked(user_id), self.keys.user_disliked(user_id)];
        let rated = self.store.set_union(&own_sets).await?;

        let mut written: HashSet<String> = HashSet::new();

        if rated.is_empty() {
            debug!(user_id = %user_id, "User has no ratings, no similarity to compute");
        } else {
            let rater_keys: Vec<String> = rated
                .iter()
                .flat_map(|item| [self.keys.item_liked_by(item), self.keys.item_disliked_by(item)])
                .collect();
            let raters = self.store.set_union(&rater_keys).await?;

            // The only rater of the user's items is the user
            if raters.len() == 1 {
                debug!(user_id = %user_id, "No co-raters found");
            } else {
                let updates = raters
                    .iter()
                    .filter(|other| other.as_str() != user_id)
                    .map(|other| {
                        let similarity_key = &similarity_key;
                        async move {
                            match self.similarity(user_id, other).await? {
                                Some(score) => {
                                    let score = self.tie_breaker.perturb(score);
                                    self.store
                                        .sorted_set_upsert(similarity_key, score, other)
                                        .await?;
                                    Ok::<_, RecommenderError>(Some(other.clone()))
                                }
                                None => Ok(None),
                            }
                        }
                    });

                written = try_join_all(updates).await?.into_iter().flatten().collect();
            }
        }

        let pruned = self.prune_stale(&similarity_key, &written).await?;

        debug!(
            user_id = %user_id,
            rated_items = rated.len(),
            neighbors = written.len(),
            pruned = pruned,
            "Similarity set updated"
        );

        Ok(written.len())
    }
}
