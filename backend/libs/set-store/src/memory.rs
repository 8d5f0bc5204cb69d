//! In-process store with Redis semantics
//!
//! Keys that become empty are dropped, the same way Redis removes empty
//! aggregates, so cardinality and existence checks agree between backends.

use crate::{SetStore, StoreError, StoreMetrics, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Keyspace {
    sets: HashMap<String, HashSet<String>>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
}

impl Keyspace {
    fn union(&self, keys: &[String]) -> HashSet<String> {
        keys.iter()
            .filter_map(|key| self.sets.get(key))
            .flat_map(|set| set.iter().cloned())
            .collect()
    }

    /// Members ordered by (score, member) ascending
    fn ordered(&self, key: &str) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .sorted_sets
            .get(key)
            .map(|zset| zset.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.as_bytes().cmp(b.0.as_bytes()))
        });
        entries
    }
}

/// Resolve a Redis-style inclusive rank range against a collection length
fn rank_window(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    if len == 0 {
        return None;
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

fn slice_window(entries: Vec<(String, f64)>, start: isize, stop: isize) -> Vec<(String, f64)> {
    match rank_window(entries.len(), start, stop) {
        Some((from, to)) => entries.into_iter().skip(from).take(to - from + 1).collect(),
        None => Vec::new(),
    }
}

pub struct MemorySetStore {
    keyspace: RwLock<Keyspace>,
    metrics: StoreMetrics,
}

impl Default for MemorySetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySetStore {
    pub fn new() -> Self {
        Self {
            keyspace: RwLock::new(Keyspace::default()),
            metrics: StoreMetrics::new("memory"),
        }
    }

    /// Number of live keys of either type
    pub fn key_count(&self) -> usize {
        let keyspace = self.keyspace.read();
        keyspace.sets.len() + keyspace.sorted_sets.len()
    }

    /// Whether a key of either type currently exists
    pub fn contains_key(&self, key: &str) -> bool {
        let keyspace = self.keyspace.read();
        keyspace.sets.contains_key(key) || keyspace.sorted_sets.contains_key(key)
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

    fn range(&self, key: &str, start: isize, stop: isize, descending: bool) -> Vec<(String, f64)> {
        let mut entries = self.keyspace.read().ordered(key);
        if descending {
            entries.reverse();
        }
        slice_window(entries, start, stop)
    }
}

#[async_trait]
impl SetStore for MemorySetStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.metrics.record_op("sadd");
        let mut keyspace = self.keyspace.write();
        Ok(keyspace
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.metrics.record_op("srem");
        let mut keyspace = self.keyspace.write();
        let Some(set) = keyspace.sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        if set.is_empty() {
            keyspace.sets.remove(key);
        }
        Ok(removed)
    }

    async fn set_is_member(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.metrics.record_op("sismember");
        Ok(self
            .keyspace
            .read()
            .sets
            .get(key)
            .map(|set| set.contains(member))
            .unwrap_or(false))
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.metrics.record_op("smembers");
        Ok(self
            .keyspace
            .read()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_cardinality(&self, key: &str) -> StoreResult<usize> {
        self.metrics.record_op("scard");
        Ok(self.keyspace.read().sets.get(key).map_or(0, HashSet::len))
    }

    async fn set_union(&self, keys: &[String]) -> StoreResult<Vec<String>> {
        self.metrics.record_op("sunion");
        Ok(self.keyspace.read().union(keys).into_iter().collect())
    }

    async fn set_intersect(&self, keys: &[String]) -> StoreResult<Vec<String>> {
        self.metrics.record_op("sinter");
        let keyspace = self.keyspace.read();
        let Some((first, rest)) = keys.split_first() else {
            return Ok(Vec::new());
        };
        let Some(base) = keyspace.sets.get(first) else {
            return Ok(Vec::new());
        };
        Ok(base
            .iter()
            .filter(|member| {
                rest.iter().all(|key| {
                    keyspace
                        .sets
                        .get(key)
                        .map(|set| set.contains(*member))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect())
    }

    async fn set_difference(&self, key: &str, others: &[String]) -> StoreResult<Vec<String>> {
        self.metrics.record_op("sdiff");
        let keyspace = self.keyspace.read();
        let excluded = keyspace.union(others);
        Ok(keyspace
            .sets
            .get(key)
            .map(|set| {
                set.iter()
                    .filter(|member| !excluded.contains(*member))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_union_store(&self, dest: &str, keys: &[String]) -> StoreResult<usize> {
        self.metrics.record_op("sunionstore");
        let mut keyspace = self.keyspace.write();
        let union = keyspace.union(keys);
        let size = union.len();
        keyspace.sorted_sets.remove(dest);
        if union.is_empty() {
            keyspace.sets.remove(dest);
        } else {
            keyspace.sets.insert(dest.to_string(), union);
        }
        Ok(size)
    }

    async fn sorted_set_upsert(&self, key: &str, score: f64, member: &str) -> StoreResult<()> {
        Self::check_score(key, score)?;
        self.metrics.record_op("zadd");
        self.keyspace
            .write()
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn sorted_set_increment(
        &self,
        key: &str,
        delta: f64,
        member: &str,
    ) -> StoreResult<f64> {
        Self::check_score(key, delta)?;
        self.metrics.record_op("zincrby");
        let mut keyspace = self.keyspace.write();
        let score = keyspace
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .entry(member.to_string())
            .or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.metrics.record_op("zrem");
        let mut keyspace = self.keyspace.write();
        let Some(zset) = keyspace.sorted_sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = zset.remove(member).is_some();
        if zset.is_empty() {
            keyspace.sorted_sets.remove(key);
        }
        Ok(removed)
    }

    async fn sorted_set_score(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        self.metrics.record_op("zscore");
        Ok(self
            .keyspace
            .read()
            .sorted_sets
            .get(key)
            .and_then(|zset| zset.get(member).copied()))
    }

    async fn sorted_set_cardinality(&self, key: &str) -> StoreResult<usize> {
        self.metrics.record_op("zcard");
        Ok(self
            .keyspace
            .read()
            .sorted_sets
            .get(key)
            .map_or(0, HashMap::len))
    }

    async fn sorted_set_range_asc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>> {
        self.metrics.record_op("zrange");
        Ok(self
            .range(key, start, stop, false)
            .into_iter()
            .map(|(member, _)| member)
            .collect())
    }

    async fn sorted_set_range_desc(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<String>> {
        self.metrics.record_op("zrevrange");
        Ok(self
            .range(key, start, stop, true)
            .into_iter()
            .map(|(member, _)| member)
            .collect())
    }

    async fn sorted_set_range_asc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        self.metrics.record_op("zrange");
        Ok(self.range(key, start, stop, false))
    }

    async fn sorted_set_range_desc_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> StoreResult<Vec<(String, f64)>> {
        self.metrics.record_op("zrevrange");
        Ok(self.range(key, start, stop, true))
    }

    async fn sorted_set_trim_lowest(&self, key: &str, count: usize) -> StoreResult<usize> {
        self.metrics.record_op("zremrangebyrank");
        if count == 0 {
            return Ok(0);
        }
        let lowest: Vec<String> = self
            .range(key, 0, count as isize - 1, false)
            .into_iter()
            .map(|(member, _)| member)
            .collect();

        let mut keyspace = self.keyspace.write();
        let Some(zset) = keyspace.sorted_sets.get_mut(key) else {
            return Ok(0);
        };
        for member in &lowest {
            zset.remove(member);
        }
        if zset.is_empty() {
            keyspace.sorted_sets.remove(key);
        }
        Ok(lowest.len())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.metrics.record_op("del");
        let mut keyspace = self.keyspace.write();
        let had_set = keyspace.sets.remove(key).is_some();
        let had_zset = keyspace.sorted_sets.remove(key).is_some();
        Ok(had_set || had_zset)
    }
}
