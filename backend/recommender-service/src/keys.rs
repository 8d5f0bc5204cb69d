//! Store key schema
//!
//! Every component builds keys through `KeySchema` so that reads and writes
//! agree. Key format: {class}:{entity}:{identifier}:{relation}
//!
//! Lifetimes, for operators adding external expiry:
//! - rating sets (`user:*:liked`, `item:*:disliked`, ...) are permanent
//! - `similarSet` and `recommendedSet` are derived and rebuilt on the user's next rating
//! - `tempAllLikedSet` exists only during one recommendation recompute
//! - `mostLiked`, `mostDisliked` and `scoreboard` are permanent

use std::fmt::Display;

use crate::error::{RecommenderError, Result};
use crate::models::Feeling;

/// Key builder scoped to one item class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    class_name: String,
}

impl KeySchema {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    // ============= User Keys =============

    /// Items a user liked
    /// Format: movie:user:{user_id}:liked
    pub fn user_liked(&self, user_id: &str) -> String {
        format!("{}:user:{}:liked", self.class_name, user_id)
    }

    /// Items a user disliked
    /// Format: movie:user:{user_id}:disliked
    pub fn user_disliked(&self, user_id: &str) -> String {
        format!("{}:user:{}:disliked", self.class_name, user_id)
    }

    pub fn user_feeling(&self, user_id: &str, feeling: Feeling) -> String {
        match feeling {
            Feeling::Liked => self.user_liked(user_id),
            Feeling::Disliked => self.user_disliked(user_id),
        }
    }

    /// Other users ranked by similarity
    /// Format: movie:user:{user_id}:similarSet
    pub fn similarity(&self, user_id: &str) -> String {
        format!("{}:user:{}:similarSet", self.class_name, user_id)
    }

    /// Predicted ratings for unrated items
    /// Format: movie:user:{user_id}:recommendedSet
    pub fn recommended(&self, user_id: &str) -> String {
        format!("{}:user:{}:recommendedSet", self.class_name, user_id)
    }

    /// Scratch set for one recommendation recompute
    pub fn temp_union(&self, user_id: &str) -> String {
        format!("{}:user:{}:tempAllLikedSet", self.class_name, user_id)
    }

    // ============= Item Keys =============

    /// Users who liked an item
    /// Format: movie:item:{item_id}:liked
    pub fn item_liked_by(&self, item_id: &str) -> String {
        format!("{}:item:{}:liked", self.class_name, item_id)
    }

    /// Users who disliked an item
    /// Format: movie:item:{item_id}:disliked
    pub fn item_disliked_by(&self, item_id: &str) -> String {
        format!("{}:item:{}:disliked", self.class_name, item_id)
    }

    pub fn item_feeling(&self, item_id: &str, feeling: Feeling) -> String {
        match feeling {
            Feeling::Liked => self.item_liked_by(item_id),
            Feeling::Disliked => self.item_disliked_by(item_id),
        }
    }

    // ============= Global Keys =============

    pub fn most_liked(&self) -> String {
        format!("{}:mostLiked", self.class_name)
    }

    pub fn most_disliked(&self) -> String {
        format!("{}:mostDisliked", self.class_name)
    }

    pub fn most_feeling(&self, feeling: Feeling) -> String {
        match feeling {
            Feeling::Liked => self.most_liked(),
            Feeling::Disliked => self.most_disliked(),
        }
    }

    /// Wilson lower bound per item
    pub fn scoreboard(&self) -> String {
        format!("{}:scoreboard", self.class_name)
    }
}

/// Render an id as the string used in keys and set members.
///
/// Numeric and string ids must meet in the same form, otherwise set
/// intersections silently miss.
pub fn normalize_id(id: impl Display) -> Result<String> {
    let id = id.to_string();
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(RecommenderError::InvalidId("id must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
