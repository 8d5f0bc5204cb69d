/// Rating API Handlers
///
/// Record and remove likes/dislikes. Every accepted change runs the
/// recommendation pipeline before the response is sent.
use actix_web::{delete, post, web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::recommender::Recommender;

/// Body for POST/DELETE /api/v1/ratings
#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub user_id: String,
    pub item_id: String,
    /// true = like, false = dislike
    pub liked: bool,
}

/// POST /api/v1/ratings
#[post("/api/v1/ratings")]
pub async fn record_rating(
    recommender: web::Data<Recommender>,
    body: web::Json<RatingRequest>,
) -> Result<HttpResponse> {
    debug!(
        user_id = %body.user_id,
        item_id = %body.item_id,
        liked = body.liked,
        "Record rating request"
    );

    let outcome = recommender
        .record_rating(&body.user_id, &body.item_id, body.liked)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// DELETE /api/v1/ratings
#[delete("/api/v1/ratings")]
pub async fn remove_rating(
    recommender: web::Data<Recommender>,
    body: web::Json<RatingRequest>,
) -> Result<HttpResponse> {
    debug!(
        user_id = %body.user_id,
        item_id = %body.item_id,
        liked = body.liked,
        "Remove rating request"
    );

    let outcome = recommender
        .remove_rating(&body.user_id, &body.item_id, body.liked)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
