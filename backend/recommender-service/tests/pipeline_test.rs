use std::sync::Arc;

use recommender_service::{EngineConfig, Recommender, RecommendationOutcome};
use set_store::{MemorySetStore, SharedStore};

fn setup(config: EngineConfig) -> (SharedStore, Recommender) {
    let store: SharedStore = Arc::new(MemorySetStore::new());
    let recommender = Recommender::new(store.clone(), &config);
    (store, recommender)
}

fn deterministic() -> EngineConfig {
    EngineConfig {
        perturb_perfect_scores: false,
        ..EngineConfig::default()
    }
}

/// chris, max, greg, larry, tuhin, kristina, andre and guy rating four movies
async fn seed_movie_night(recommender: &Recommender) {
    let likes = [
        ("chris", "batman"),
        ("chris", "superman"),
        ("max", "batman"),
        ("greg", "batman"),
        ("greg", "superman"),
        ("larry", "batman"),
        ("larry", "iceage"),
    ];
    let dislikes = [
        ("chris", "chipmunks"),
        ("max", "chipmunks"),
        ("tuhin", "batman"),
        ("tuhin", "superman"),
        ("tuhin", "chipmunks"),
        ("kristina", "batman"),
        ("kristina", "superman"),
        ("andre", "superman"),
        ("andre", "chipmunks"),
        ("guy", "superman"),
    ];

    for (user, item) in likes {
        recommender.like(user, item).await.unwrap();
    }
    for (user, item) in dislikes {
        recommender.dislike(user, item).await.unwrap();
    }
}

#[tokio::test]
async fn test_andre_is_recommended_batman() {
    let (_store, recommender) = setup(deterministic());
    seed_movie_night(&recommender).await;

    let recommendations = recommender
        .statistics()
        .recommend_for("andre", 5)
        .await
        .unwrap();

    assert_eq!(recommendations.first().map(String::as_str), Some("batman"));
    assert!(!recommendations.contains(&"chipmunks".to_string()));
}

#[tokio::test]
async fn test_batman_outranks_same_ratio_with_fewer_raters() {
    let (_store, recommender) = setup(deterministic());
    seed_movie_night(&recommender).await;

    // 2 likes to 1 dislike, the same 2:1 ratio as batman's 4:2
    recommender.like("ann", "robin").await.unwrap();
    recommender.like("bob", "robin").await.unwrap();
    recommender.dislike("cat", "robin").await.unwrap();

    let best = recommender.statistics().best_rated().await.unwrap();
    let position = |item: &str| best.iter().position(|i| i == item).unwrap();

    assert_eq!(best[0], "batman");
    assert!(position("batman") < position("robin"));
}

#[tokio::test]
async fn test_popularity_counters() {
    let (_store, recommender) = setup(deterministic());
    seed_movie_night(&recommender).await;

    let statistics = recommender.statistics();
    assert_eq!(statistics.most_liked().await.unwrap()[0], "batman");
    // superman and chipmunks tie on four dislikes each
    let mut most_disliked = statistics.most_disliked().await.unwrap();
    most_disliked.truncate(2);
    most_disliked.sort();
    assert_eq!(most_disliked, vec!["chipmunks", "superman"]);
    assert_eq!(statistics.liked_count("batman").await.unwrap(), 4);
    assert_eq!(statistics.disliked_count("batman").await.unwrap(), 2);
}

#[tokio::test]
async fn test_superset_rater_gets_no_recommendations() {
    let (_store, recommender) = setup(deterministic());

    recommender.like("ChristianB", "Typical").await.unwrap();
    recommender.like("ChristianB", "Value7").await.unwrap();
    recommender.like("malbery", "Typical").await.unwrap();
    for n in 1..=7 {
        recommender
            .like("malbery", format!("Value{n}"))
            .await
            .unwrap();
    }

    let recommendations = recommender
        .statistics()
        .recommend_for("malbery", 5)
        .await
        .unwrap();
    assert!(recommendations.is_empty());
}

#[tokio::test]
async fn test_like_then_unlike_restores_prior_state() {
    let (store, recommender) = setup(deterministic());
    recommender.like("chris", "batman").await.unwrap();
    let liked_before = store.set_members("movie:user:mai:liked").await.unwrap();
    let counter_before = store
        .sorted_set_score("movie:mostLiked", "superman")
        .await
        .unwrap();

    recommender.like("mai", "superman").await.unwrap();
    recommender.unlike("mai", "superman").await.unwrap();

    assert_eq!(
        store.set_members("movie:user:mai:liked").await.unwrap(),
        liked_before
    );
    assert!(store
        .set_members("movie:item:superman:liked")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .sorted_set_score("movie:mostLiked", "superman")
            .await
            .unwrap(),
        counter_before
    );
}

#[tokio::test]
async fn test_dislike_then_undislike_removes_rating() {
    let (store, recommender) = setup(deterministic());
    recommender.dislike("jesse", "superman").await.unwrap();
    recommender.undislike("jesse", "superman").await.unwrap();

    assert!(store
        .set_members("movie:user:jesse:disliked")
        .await
        .unwrap()
        .is_empty());
    assert!(recommender
        .statistics()
        .best_rated()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_user_never_in_own_similarity_set() {
    let (_store, recommender) = setup(deterministic());
    seed_movie_night(&recommender).await;

    for user in ["chris", "max", "greg", "larry", "tuhin", "kristina", "andre", "guy"] {
        let neighbors = recommender
            .statistics()
            .most_similar_users(user)
            .await
            .unwrap();
        assert!(!neighbors.iter().any(|n| n == user), "{user} is its own neighbor");
    }
}

#[tokio::test]
async fn test_unrated_user_has_no_neighbors() {
    let (_store, recommender) = setup(deterministic());
    seed_movie_night(&recommender).await;

    let report = recommender
        .on_rating_changed("nobody", "batman")
        .await
        .unwrap();
    assert_eq!(report.neighbors, 0);
    assert_eq!(report.recommendations, RecommendationOutcome::NoCandidates);
    assert!(recommender
        .statistics()
        .most_similar_users("nobody")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_recommendation_list_respects_cap() {
    let (store, recommender) = setup(EngineConfig {
        num_of_recs_store: 3,
        ..deterministic()
    });

    for n in 0..10 {
        recommender.like("mentor", format!("film{n}")).await.unwrap();
    }
    recommender.like("student", "film0").await.unwrap();

    let stored = store
        .sorted_set_cardinality("movie:user:student:recommendedSet")
        .await
        .unwrap();
    assert_eq!(stored, 3);
}

#[tokio::test]
async fn test_conflicting_rating_leaves_state_untouched() {
    let (store, recommender) = setup(deterministic());
    recommender.dislike("chris", "batman").await.unwrap();

    assert!(recommender.like("chris", "batman").await.is_err());
    assert!(!store
        .set_is_member("movie:item:batman:liked", "chris")
        .await
        .unwrap());

    recommender.undislike("chris", "batman").await.unwrap();
    recommender.like("chris", "batman").await.unwrap();
    assert!(store
        .set_is_member("movie:item:batman:liked", "chris")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_concurrent_identical_likes_keep_one_membership() {
    let (store, recommender) = setup(deterministic());

    let (first, second) = tokio::join!(
        recommender.like("chris", "batman"),
        recommender.like("chris", "batman"),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(
        store.set_members("movie:item:batman:liked").await.unwrap(),
        vec!["chris"]
    );
    // Check-then-increment may count the pair twice
    let count = store
        .sorted_set_score("movie:mostLiked", "batman")
        .await
        .unwrap()
        .unwrap();
    assert!(count == 1.0 || count == 2.0);
}

#[tokio::test]
async fn test_perturbed_scores_stay_in_range() {
    let (store, recommender) = setup(EngineConfig::default());
    recommender.like("a", "x").await.unwrap();
    recommender.like("b", "x").await.unwrap();
    recommender.like("a", "y").await.unwrap();

    let score = store
        .sorted_set_score("movie:user:a:similarSet", "b")
        .await
        .unwrap()
        .unwrap();
    assert!(score <= 1.0 && score > 0.999);
}
