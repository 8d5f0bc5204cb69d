use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use recommender_service::handlers;
use recommender_service::{EngineConfig, Recommender};
use set_store::{MemorySetStore, SharedStore};

fn recommender() -> web::Data<Recommender> {
    let store: SharedStore = Arc::new(MemorySetStore::new());
    let config = EngineConfig {
        perturb_perfect_scores: false,
        ..EngineConfig::default()
    };
    web::Data::new(Recommender::new(store, &config))
}

fn rating(user_id: &str, item_id: &str, liked: bool) -> Value {
    json!({ "user_id": user_id, "item_id": item_id, "liked": liked })
}

#[actix_web::test]
async fn test_health() {
    let app = test::init_service(
        App::new()
            .app_data(recommender())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_rating_flow() {
    let app = test::init_service(
        App::new()
            .app_data(recommender())
            .configure(handlers::configure),
    )
    .await;

    for (user, item, liked) in [
        ("chris", "batman", true),
        ("chris", "superman", true),
        ("max", "batman", true),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/ratings")
            .set_json(rating(user, item, liked))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["change"], "added");
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/users/max/recommendations?limit=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"], json!(["superman"]));
    assert_eq!(body["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/max/predictions/superman")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["prediction"], 1.0);

    let req = test::TestRequest::get()
        .uri("/api/v1/items/batman/raters")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["liked_count"], 2);
    assert_eq!(body["disliked_count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/items/ranking?order=best&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0]["id"], "batman");

    let req = test::TestRequest::get()
        .uri("/api/v1/items/popularity?feeling=liked")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0], "batman");

    let req = test::TestRequest::get()
        .uri("/api/v1/users/max/similar?order=least")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["users"], json!(["chris"]));

    let req = test::TestRequest::get()
        .uri("/api/v1/users/chris/ratings")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["disliked"], json!([]));
    assert_eq!(body["rated"].as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn test_conflicting_rating_returns_409() {
    let app = test::init_service(
        App::new()
            .app_data(recommender())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/ratings")
        .set_json(rating("chris", "batman", false))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/v1/ratings")
        .set_json(rating("chris", "batman", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 409);
}

#[actix_web::test]
async fn test_blank_id_returns_400() {
    let app = test::init_service(
        App::new()
            .app_data(recommender())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/ratings")
        .set_json(rating("  ", "batman", true))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_removing_absent_rating_skips_pipeline() {
    let app = test::init_service(
        App::new()
            .app_data(recommender())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/ratings")
        .set_json(rating("chris", "batman", true))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["change"], "not_present");
    assert!(body["pipeline"].is_null());
}
