/// Item API Handlers
///
/// Global rankings and per-item rater lists.
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::handlers::users::MAX_LIMIT;
use crate::keys::normalize_id;
use crate::models::{Feeling, ScoredItem};
use crate::recommender::Recommender;
use crate::services::statistics::DEFAULT_RANKING_LIMIT;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingOrder {
    #[default]
    Best,
    Worst,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    pub order: RankingOrder,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RANKING_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct PopularityQuery {
    #[serde(default = "default_feeling")]
    pub feeling: Feeling,
}

fn default_feeling() -> Feeling {
    Feeling::Liked
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub items: Vec<ScoredItem>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct PopularityResponse {
    pub feeling: Feeling,
    pub items: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RatersResponse {
    pub item_id: String,
    pub liked_by: Vec<String>,
    pub liked_count: usize,
    pub disliked_by: Vec<String>,
    pub disliked_count: usize,
}

/// GET /api/v1/items/ranking?order=best|worst&limit=
#[get("/api/v1/items/ranking")]
pub async fn get_ranking(
    recommender: web::Data<Recommender>,
    query: web::Query<RankingQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.min(MAX_LIMIT);
    let statistics = recommender.statistics();

    let items = match query.order {
        RankingOrder::Best => statistics.best_rated_with_scores(limit).await?,
        RankingOrder::Worst => statistics.worst_rated_with_scores(limit).await?,
    };

    Ok(HttpResponse::Ok().json(RankingResponse {
        count: items.len(),
        items,
    }))
}

/// GET /api/v1/items/popularity?feeling=liked|disliked
#[get("/api/v1/items/popularity")]
pub async fn get_popularity(
    recommender: web::Data<Recommender>,
    query: web::Query<PopularityQuery>,
) -> Result<HttpResponse> {
    let statistics = recommender.statistics();
    let items = match query.feeling {
        Feeling::Liked => statistics.most_liked().await?,
        Feeling::Disliked => statistics.most_disliked().await?,
    };

    Ok(HttpResponse::Ok().json(PopularityResponse {
        feeling: query.feeling,
        items,
    }))
}

/// GET /api/v1/items/{item_id}/raters
#[get("/api/v1/items/{item_id}/raters")]
pub async fn get_raters(
    recommender: web::Data<Recommender>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let item_id = normalize_id(path.into_inner())?;
    let statistics = recommender.statistics();

    let (liked_by, disliked_by) = tokio::try_join!(
        statistics.liked_by(&item_id),
        statistics.disliked_by(&item_id),
    )?;

    Ok(HttpResponse::Ok().json(RatersResponse {
        item_id,
        liked_count: liked_by.len(),
        disliked_count: disliked_by.len(),
        liked_by,
        disliked_by,
    }))
}
