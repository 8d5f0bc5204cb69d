//! Like/dislike collaborative-filtering recommender
//!
//! Users like or dislike items. After every rating change the service:
//! - recomputes the rater's similarity to every co-rater
//! - rescores the item on the global Wilson-bound scoreboard
//! - rebuilds the rater's stored recommendation list
//!
//! All state lives in a [`set_store::SetStore`] (Redis in production).

pub mod config;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod metrics;
pub mod models;
pub mod recommender;
pub mod services;

pub use config::{Config, EngineConfig};
pub use error::{RecommenderError, Result};
pub use models::{Feeling, PipelineReport, RatingChange, RatingOutcome, RecommendationOutcome};
pub use recommender::Recommender;
