use set_store::SharedStore;

use crate::error::Result;
use crate::keys::KeySchema;
use crate::models::ScoredItem;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Read-only queries over the stored ratings and derived sets
#[derive(Clone)]
pub struct Statistics {
    store: SharedStore,
    keys: KeySchema,
}

/// Inclusive stop rank for the first `limit` members
fn stop_for(limit: usize) -> Option<isize> {
    if limit == 0 {
        None
    } else {
        Some(isize::try_from(limit).map_or(-1, |limit| limit - 1))
    }
}

impl Statistics {
    pub fn new(store: SharedStore, keys: KeySchema) -> Self {
        Self { store, keys }
    }

    // ============= Per-user =============

    /// Top `limit` stored recommendations, best first
    pub async fn recommend_for(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let Some(stop) = stop_for(limit) else {
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .sorted_set_range_desc(&self.keys.recommended(user_id), 0, stop)
            .await?)
    }

    pub async fn most_similar_users(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_desc(&self.keys.similarity(user_id), 0, -1)
            .await?)
    }

    pub async fn least_similar_users(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_asc(&self.keys.similarity(user_id), 0, -1)
            .await?)
    }

    pub async fn all_liked_for(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self.store.set_members(&self.keys.user_liked(user_id)).await?)
    }

    pub async fn all_disliked_for(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .set_members(&self.keys.user_disliked(user_id))
            .await?)
    }

    pub async fn all_rated_for(&self, user_id: &str) -> Result<Vec<String>> {
        let keys = [self.keys.user_liked(user_id), self.keys.user_disliked(user_id)];
        Ok(self.store.set_union(&keys).await?)
    }

    // ============= Per-item =============

    pub async fn liked_by(&self, item_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .set_members(&self.keys.item_liked_by(item_id))
            .await?)
    }

    pub async fn liked_count(&self, item_id: &str) -> Result<usize> {
        Ok(self
            .store
            .set_cardinality(&self.keys.item_liked_by(item_id))
            .await?)
    }

    pub async fn disliked_by(&self, item_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .set_members(&self.keys.item_disliked_by(item_id))
            .await?)
    }

    pub async fn disliked_count(&self, item_id: &str) -> Result<usize> {
        Ok(self
            .store
            .set_cardinality(&self.keys.item_disliked_by(item_id))
            .await?)
    }

    // ============= Global =============

    pub async fn best_rated(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_desc(&self.keys.scoreboard(), 0, -1)
            .await?)
    }

    pub async fn worst_rated(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_asc(&self.keys.scoreboard(), 0, -1)
            .await?)
    }

    pub async fn best_rated_with_scores(&self, limit: usize) -> Result<Vec<ScoredItem>> {
        let Some(stop) = stop_for(limit) else {
            return Ok(Vec::new());
        };
        let ranked = self
            .store
            .sorted_set_range_desc_with_scores(&self.keys.scoreboard(), 0, stop)
            .await?;
        Ok(ranked.into_iter().map(ScoredItem::from).collect())
    }

    pub async fn worst_rated_with_scores(&self, limit: usize) -> Result<Vec<ScoredItem>> {
        let Some(stop) = stop_for(limit) else {
            return Ok(Vec::new());
        };
        let ranked = self
            .store
            .sorted_set_range_asc_with_scores(&self.keys.scoreboard(), 0, stop)
            .await?;
        Ok(ranked.into_iter().map(ScoredItem::from).collect())
    }

    /// Items by like count, most liked first
    pub async fn most_liked(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_desc(&self.keys.most_liked(), 0, -1)
            .await?)
    }

    /// Items by dislike count, most disliked first
    pub async fn most_disliked(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .sorted_set_range_desc(&self.keys.most_disliked(), 0, -1)
            .await?)
    }
}
