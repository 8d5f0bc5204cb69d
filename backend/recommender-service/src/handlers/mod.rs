pub mod items;
pub mod ratings;
pub mod users;

use actix_web::web;

pub use items::{get_popularity, get_ranking, get_raters};
pub use ratings::{record_rating, remove_rating};
pub use users::{get_prediction, get_recommendations, get_similar_users, get_user_ratings};

use crate::metrics::serve_metrics;

/// Register every route; callers provide `web::Data<Recommender>`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(|| async { "OK" }))
        .route("/metrics", web::get().to(serve_metrics))
        .service(record_rating)
        .service(remove_rating)
        .service(get_recommendations)
        .service(get_prediction)
        .service(get_similar_users)
        .service(get_user_ratings)
        .service(get_ranking)
        .service(get_popularity)
        .service(get_raters);
}
