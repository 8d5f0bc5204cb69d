use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recommender_service::config::{Config, StoreBackend};
use recommender_service::handlers;
use recommender_service::Recommender;
use set_store::{MemorySetStore, RedisSetStore, SharedStore, StoreMetrics};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        store_backend = ?config.service.store_backend,
        "Starting recommender-service"
    );

    StoreMetrics::register(prometheus::default_registry())
        .context("Failed to register store metrics")?;

    let store: SharedStore = match config.service.store_backend {
        StoreBackend::Redis => {
            let store = RedisSetStore::connect(&config.redis.url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; ratings are lost on restart");
            Arc::new(MemorySetStore::new())
        }
    };

    let recommender = web::Data::new(Recommender::new(store, &config.engine));
    let bind_addr = format!("0.0.0.0:{}", config.service.http_port);
    tracing::info!(addr = %bind_addr, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(recommender.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {bind_addr}"))?
    .run()
    .await?;

    Ok(())
}
