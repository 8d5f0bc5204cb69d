//! Set and sorted-set store
//!
//! The recommender keeps all of its state in named sets and sorted sets. This
//! crate defines the operations it needs and ships two backends:
//! - `RedisSetStore` for deployments (one shared `ConnectionManager`)
//! - `MemorySetStore` for tests and local runs
//!
//! Both follow Redis semantics: rank ranges are inclusive, negative ranks
//! count from the end, and equal scores are ordered by member bytes.

mod error;
mod memory;
mod metrics;
mod redis_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemorySetStore;
pub use metrics::StoreMetrics;
pub use redis_store::{RedisSetStore, SharedConnectionManager};

use async_trait::async_trait;
use std::sync::Arc;

/// Store handle shared by every component of the recommender
pub type SharedStore = Arc<dyn SetStore>;

/// Set algebra and sorted-set operations over string keys
#[async_trait]
pub trait SetStore: Send + Sync {
    /// Add a member to a set. Returns true if it was not already present.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Remove a member from a set. Returns true if it was present.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    async fn set_cardinality(&self, key: &str) -> StoreResult<usize>;

    /// Union of all given sets. An empty key list yields an empty result.
    async fn set_union(&self, keys: &[String]) -> StoreResult<Vec<String>>;

    async fn set_intersect(&self, keys: &[String]) -> StoreResult<Vec<String>>;

    /// Members of `key` that are in none of `others`
    async fn set_difference(&self, key: &str, others: &[String]) -> StoreResult<Vec<String>>;

    /// Store the union of `keys` at `dest`, replacing it. Returns the size of `dest`.
    async fn set_union_store(&self, dest: &str, keys: &[String]) -> StoreResult<usize>;

    /// Insert or overwrite a member's score
    async fn sorted_set_upsert(&self, key: &str, score: f64, member: &str) -> StoreResult<()>;

    /// Add `delta` to a member's score (absent members start at 0). Returns the new score.
    async fn sorted_set_increment(&self, key: &str, delta: f64, member: &str)
        -> StoreResult<f64>;

    async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<usize>;

    /// Members ranked `start..=stop` by ascending score
    async fn sorted_set_range_asc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>>;

    /// Members ranked `start..=stop` by descending score
    async fn sorted_set_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>>;

    async fn sorted_set_range_asc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>>;

    async fn sorted_set_range_desc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>>;

    /// Remove the `count` lowest-ranked members. Returns how many were removed.
    async fn sorted_set_trim_lowest(&self, key: &str, count: usize) -> StoreResult<usize>;

    /// Delete a key of any type. Returns true if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;
}
