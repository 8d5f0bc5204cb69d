// Collaborative-filtering pipeline: similarity, prediction, recommendation
// maintenance, global ranking, plus the ledger and read accessors around them.

pub mod ledger;
pub mod pipeline;
pub mod prediction;
pub mod recommendations;
pub mod scoreboard;
pub mod similarity;
pub mod statistics;

pub use ledger::RatingLedger;
pub use pipeline::RatingPipeline;
pub use prediction::PredictionEngine;
pub use recommendations::RecommendationMaintainer;
pub use scoreboard::{wilson_lower_bound, GlobalRanker, Z_95};
pub use similarity::{
    ExactScores, RandomJitter, RatingOverlap, SimilarityEngine, SimilarityStrategy, TieBreaker,
};
pub use statistics::Statistics;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use set_store::{MemorySetStore, SetStore, SharedStore, StoreError, StoreResult};

    use crate::keys::KeySchema;
    use crate::models::Feeling;

    pub fn test_store() -> SharedStore {
        Arc::new(MemorySetStore::new())
    }

    /// Write a rating straight into the user and item sets, bypassing the ledger
    pub async fn rate(store: &SharedStore, user_id: &str, item_id: &str, feeling: Feeling) {
        let keys = KeySchema::new("movie");
        store
            .set_add(&keys.user_feeling(user_id, feeling), item_id)
            .await
            .unwrap();
        store
            .set_add(&keys.item_feeling(item_id, feeling), user_id)
            .await
            .unwrap();
    }

    /// Delegates to another store but fails every call to one operation
    pub struct FailingStore {
        inner: SharedStore,
        failing_op: &'static str,
    }

    impl FailingStore {
        pub fn wrap(inner: &SharedStore, failing_op: &'static str) -> SharedStore {
            Arc::new(Self {
                inner: inner.clone(),
                failing_op,
            })
        }

        fn check(&self, op: &str) -> StoreResult<()> {
            if op == self.failing_op {
                Err(StoreError::Connection(format!("{op} unavailable")))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SetStore for FailingStore {
        async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.check("set_add")?;
            self.inner.set_add(key, member).await
        }

        async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.check("set_remove")?;
            self.inner.set_remove(key, member).await
        }

        async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.check("set_is_member")?;
            self.inner.set_is_member(key, member).await
        }

        async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
            self.check("set_members")?;
            self.inner.set_members(key).await
        }

        async fn set_cardinality(&self, key: &str) -> StoreResult<usize> {
            self.check("set_cardinality")?;
            self.inner.set_cardinality(key).await
        }

        async fn set_union(&self, keys: &[String]) -> StoreResult<Vec<String>> {
            self.check("set_union")?;
            self.inner.set_union(keys).await
        }

        async fn set_intersect(&self, keys: &[String]) -> StoreResult<Vec<String>> {
            self.check("set_intersect")?;
            self.inner.set_intersect(keys).await
        }

        async fn set_difference(&self, key: &str, others: &[String]) -> StoreResult<Vec<String>> {
            self.check("set_difference")?;
            self.inner.set_difference(key, others).await
        }

        async fn set_union_store(&self, dest: &str, keys: &[String]) -> StoreResult<usize> {
            self.check("set_union_store")?;
            self.inner.set_union_store(dest, keys).await
        }

        async fn sorted_set_upsert(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
            self.check("sorted_set_upsert")?;
            self.inner.sorted_set_upsert(key, score, member).await
        }

        async fn sorted_set_increment(
            &self,
            key: &str,
            delta: f64,
            member: &str,
        ) -> StoreResult<f64> {
            self.check("sorted_set_increment")?;
            self.inner.sorted_set_increment(key, delta, member).await
        }

        async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
            self.check("sorted_set_remove")?;
            self.inner.sorted_set_remove(key, member).await
        }

        async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
            self.check("sorted_set_score")?;
            self.inner.sorted_set_score(key, member).await
        }

        async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<usize> {
            self.check("sorted_set_cardinality")?;
            self.inner.sorted_set_cardinality(key).await
        }

        async fn sorted_set_range_asc(
            &self,
            key: &str,
            start: isize,
            stop: isize,
        ) -> StoreResult<Vec<String>> {
            self.check("sorted_set_range_asc")?;
            self.inner.sorted_set_range_asc(key, start, stop).await
        }

        async fn sorted_set_range_desc(
            &self,
            key: &str,
            start: isize,
            stop: isize,
        ) -> StoreResult<Vec<String>> {
            self.check("sorted_set_range_desc")?;
            self.inner.sorted_set_range_desc(key, start, stop).await
        }

        async fn sorted_set_range_asc_with_scores(
            &self,
            key: &str,
            start: isize,
            stop: isize,
        ) -> StoreResult<Vec<(String, f64)>> {
            self.check("sorted_set_range_asc_with_scores")?;
            self.inner
                .sorted_set_range_asc_with_scores(key, start, stop)
                .await
        }

        async fn sorted_set_range_desc_with_scores(
            &self,
            key: &str,
            start: isize,
            stop: isize,
        ) -> StoreResult<Vec<(String, f64)>> {
            self.check("sorted_set_range_desc_with_scores")?;
            self.inner
                .sorted_set_range_desc_with_scores(key, start, stop)
                .await
        }

        async fn sorted_set_trim_lowest(&self, key: &str, count: usize) -> StoreResult<usize> {
            self.check("sorted_set_trim_lowest")?;
            self.inner.sorted_set_trim_lowest(key, count).await
        }

        async fn delete(&self, key: &str) -> StoreResult<bool> {
            self.check("delete")?;
            self.inner.delete(key).await
        }
    }
}
