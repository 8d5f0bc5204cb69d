//! Redis-backed store
//!
//! Every operation maps to exactly one Redis command. Empty key lists are
//! answered locally because SUNION/SINTER reject zero keys.

use crate::{SetStore, StoreError, StoreMetrics, StoreResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

#[derive(Clone)]
pub struct RedisSetStore {
    manager: SharedConnectionManager,
    metrics: StoreMetrics,
}

impl RedisSetStore {
    pub fn new(manager: SharedConnectionManager) -> Self {
        Self {
            manager,
            metrics: StoreMetrics::new("redis"),
        }
    }

    /// Open a client for `redis_url` and wrap it in a connection manager
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Redis set store connected");
        Ok(Self::new(Arc::new(Mutex::new(manager))))
    }

    /// The manager is multiplexed, so a clone lets concurrent callers
    /// pipeline commands instead of queueing on the mutex.
    async fn connection(&self) -> ConnectionManager {
        self.manager.lock().await.clone()
    }

    fn track<T>(&self, op: &'static str, key: &str, result: RedisResult<T>) -> StoreResult<T> {
        match result {
            Ok(value) => {
                self.metrics.record_op(op);
                Ok(value)
            }
            Err(e) => {
                warn!(op = op, key = %key, error = %e, "Redis command failed");
                self.metrics.record_error(op);
                Err(StoreError::Redis(e))
            }
        }
    }

    fn check_score(key: &str, score: f64) -> StoreResult<()> {
        if score.is_finite() {
            Ok(())
        } else {
            Err(StoreError::InvalidScore {
                key: key.to_string(),
                score,
            })
        }
    }
}

#[async_trait]
impl SetStore for RedisSetStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let added: RedisResult<i64> = conn.sadd(key, member).await;
        self.track("sadd", key, added).map(|n| n > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let removed: RedisResult<i64> = conn.srem(key, member).await;
        self.track("srem", key, removed).map(|n| n > 0)
    }

    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let found: RedisResult<bool> = conn.sismember(key, member).await;
        self.track("sismember", key, found)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.smembers(key).await;
        self.track("smembers", key, members)
    }

    async fn set_cardinality(&self, key: &str) -> StoreResult<usize> {
        let mut conn = self.connection().await;
        let size: RedisResult<usize> = conn.scard(key).await;
        self.track("scard", key, size)
    }

    async fn set_union(&self, keys: &[String]) -> StoreResult<Vec<String>> {
        let Some(first) = keys.first() else {
            return Ok(Vec::new());
        };
        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.sunion(keys).await;
        self.track("sunion", first, members)
    }

    async fn set_intersect(&self, keys: &[String]) -> StoreResult<Vec<String>> {
        let Some(first) = keys.first() else {
            return Ok(Vec::new());
        };
        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.sinter(keys).await;
        self.track("sinter", first, members)
    }

    async fn set_difference(&self, key: &str, others: &[String]) -> StoreResult<Vec<String>> {
        let mut args: Vec<&str> = Vec::with_capacity(others.len() + 1);
        args.push(key);
        args.extend(others.iter().map(String::as_str));

        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.sdiff(args).await;
        self.track("sdiff", key, members)
    }

    async fn set_union_store(&self, dest: &str, keys: &[String]) -> StoreResult<usize> {
        let mut conn = self.connection().await;
        if keys.is_empty() {
            let deleted: RedisResult<i64> = conn.del(dest).await;
            self.track("del", dest, deleted)?;
            return Ok(0);
        }
        let size: RedisResult<usize> = conn.sunionstore(dest, keys).await;
        let size = self.track("sunionstore", dest, size)?;
        debug!(dest = %dest, sources = keys.len(), size = size, "Union stored");
        Ok(size)
    }

    async fn sorted_set_upsert(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
        Self::check_score(key, score)?;
        let mut conn = self.connection().await;
        let result: RedisResult<i64> = conn.zadd(key, member, score).await;
        self.track("zadd", key, result).map(|_| ())
    }

    async fn sorted_set_increment(
        &self,
        key: &str,
        delta: f64,
        member: &str,
    ) -> StoreResult<f64> {
        Self::check_score(key, delta)?;
        let mut conn = self.connection().await;
        let score: RedisResult<f64> = conn.zincr(key, member, delta).await;
        self.track("zincrby", key, score)
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let removed: RedisResult<i64> = conn.zrem(key, member).await;
        self.track("zrem", key, removed).map(|n| n > 0)
    }

    async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        let mut conn = self.connection().await;
        let score: RedisResult<Option<f64>> = conn.zscore(key, member).await;
        self.track("zscore", key, score)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<usize> {
        let mut conn = self.connection().await;
        let size: RedisResult<usize> = conn.zcard(key).await;
        self.track("zcard", key, size)
    }

    async fn sorted_set_range_asc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.zrange(key, start, stop).await;
        self.track("zrange", key, members)
    }

    async fn sorted_set_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>> {
        let mut conn = self.connection().await;
        let members: RedisResult<Vec<String>> = conn.zrevrange(key, start, stop).await;
        self.track("zrevrange", key, members)
    }

    async fn sorted_set_range_asc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        let mut conn = self.connection().await;
        let entries: RedisResult<Vec<(String, f64)>> =
            conn.zrange_withscores(key, start, stop).await;
        self.track("zrange", key, entries)
    }

    async fn sorted_set_range_desc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        let mut conn = self.connection().await;
        let entries: RedisResult<Vec<(String, f64)>> =
            conn.zrevrange_withscores(key, start, stop).await;
        self.track("zrevrange", key, entries)
    }

    async fn sorted_set_trim_lowest(&self, key: &str, count: usize) -> StoreResult<usize> {
        if count == 0 {
            return Ok(0);
        }
        let mut conn = self.connection().await;
        let removed: RedisResult<usize> =
            conn.zremrangebyrank(key, 0, count as isize - 1).await;
        self.track("zremrangebyrank", key, removed)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await;
        let deleted: RedisResult<i64> = conn.del(key).await;
        self.track("del", key, deleted).map(|n| n > 0)
    }
}
