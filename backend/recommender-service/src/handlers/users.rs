/// User API Handlers
///
/// Per-user reads: stored recommendations, point predictions, neighbors and
/// the user's own ratings.
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keys::normalize_id;
use crate::recommender::Recommender;
use crate::services::statistics::DEFAULT_RECOMMENDATION_LIMIT;

/// Upper bound on `limit` query parameters
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarOrder {
    #[default]
    Most,
    Least,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default)]
    pub order: SimilarOrder,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user_id: String,
    pub items: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub user_id: String,
    pub item_id: String,
    pub prediction: f64,
}

#[derive(Debug, Serialize)]
pub struct SimilarUsersResponse {
    pub user_id: String,
    pub users: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserRatingsResponse {
    pub user_id: String,
    pub liked: Vec<String>,
    pub disliked: Vec<String>,
    pub rated: Vec<String>,
}

/// GET /api/v1/users/{user_id}/recommendations
#[get("/api/v1/users/{user_id}/recommendations")]
pub async fn get_recommendations(
    recommender: web::Data<Recommender>,
    path: web::Path<String>,
    query: web::Query<RecommendationsQuery>,
) -> Result<HttpResponse> {
    let user_id = normalize_id(path.into_inner())?;
    let limit = query.limit.min(MAX_LIMIT);

    let items = recommender
        .statistics()
        .recommend_for(&user_id, limit)
        .await?;

    Ok(HttpResponse::Ok().json(RecommendationsResponse {
        user_id,
        count: items.len(),
        items,
    }))
}

/// GET /api/v1/users/{user_id}/predictions/{item_id}
#[get("/api/v1/users/{user_id}/predictions/{item_id}")]
pub async fn get_prediction(
    recommender: web::Data<Recommender>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (user_id, item_id) = path.into_inner();
    let (user_id, item_id) = (normalize_id(user_id)?, normalize_id(item_id)?);

    let prediction = recommender.predict(&user_id, &item_id).await?;

    Ok(HttpResponse::Ok().json(PredictionResponse {
        user_id,
        item_id,
        prediction,
    }))
}

/// GET /api/v1/users/{user_id}/similar?order=most|least
#[get("/api/v1/users/{user_id}/similar")]
pub async fn get_similar_users(
    recommender: web::Data<Recommender>,
    path: web::Path<String>,
    query: web::Query<SimilarQuery>,
) -> Result<HttpResponse> {
    let user_id = normalize_id(path.into_inner())?;
    let statistics = recommender.statistics();

    let users = match query.order {
        SimilarOrder::Most => statistics.most_similar_users(&user_id).await?,
        SimilarOrder::Least => statistics.least_similar_users(&user_id).await?,
    };

    Ok(HttpResponse::Ok().json(SimilarUsersResponse { user_id, users }))
}

/// GET /api/v1/users/{user_id}/ratings
#[get("/api/v1/users/{user_id}/ratings")]
pub async fn get_user_ratings(
    recommender: web::Data<Recommender>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = normalize_id(path.into_inner())?;
    let statistics = recommender.statistics();

    let (liked, disliked, rated) = tokio::try_join!(
        statistics.all_liked_for(&user_id),
        statistics.all_disliked_for(&user_id),
        statistics.all_rated_for(&user_id),
    )?;

    Ok(HttpResponse::Ok().json(UserRatingsResponse {
        user_id,
        liked,
        disliked,
        rated,
    }))
}
