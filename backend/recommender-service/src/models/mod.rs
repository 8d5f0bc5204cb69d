use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feeling {
    Liked,
    Disliked,
}

impl Feeling {
    pub fn from_liked(liked: bool) -> Self {
        if liked {
            Feeling::Liked
        } else {
            Feeling::Disliked
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Feeling::Liked => Feeling::Disliked,
            Feeling::Disliked => Feeling::Liked,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feeling::Liked => "liked",
            Feeling::Disliked => "disliked",
        }
    }
}

impl fmt::Display for Feeling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a ledger call did to the stored ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

impl RatingChange {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingChange::Added => "added",
            RatingChange::AlreadyPresent => "already_present",
            RatingChange::Removed => "removed",
            RatingChange::NotPresent => "not_present",
        }
    }
}

/// Result of one recommendation recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    /// No neighbor contributed a candidate; the stored list was left alone
    NoCandidates,
    Replaced { candidates: usize, stored: usize },
}

/// Summary of one `on_rating_changed` run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineReport {
    pub neighbors: usize,
    pub wilson_score: Option<f64>,
    pub recommendations: RecommendationOutcome,
}

/// What a ledger call changed and, if the pipeline ran, what it did
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingOutcome {
    pub change: RatingChange,
    pub pipeline: Option<PipelineReport>,
}

/// Sorted-set member with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub id: String,
    pub score: f64,
}

impl From<(String, f64)> for ScoredItem {
    fn from((id, score): (String, f64)) -> Self {
        Self { id, score }
    }
}
