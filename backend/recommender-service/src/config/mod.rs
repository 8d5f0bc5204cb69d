use serde::Deserialize;
use thiserror::Error;

/// Prefix shared by every environment variable the service reads
pub const ENV_PREFIX: &str = "RECOMMENDER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub service: ServiceConfig,
    pub redis: RedisConfig,
}

/// Process-wide recommender settings, fixed at startup
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Neighbor fan-out for both ends of the similarity ranking
    pub nearest_neighbors: usize,
    /// Cap on stored recommendations per user
    pub num_of_recs_store: usize,
    /// Also pool the nearest neighbors' dislikes as candidates
    pub factor_least_similar_least_liked: bool,
    /// Jitter perfect +1/-1 similarities so tied neighbors rotate
    pub perturb_perfect_scores: bool,
    /// Key namespace, e.g. "movie"
    pub class_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nearest_neighbors: default_nearest_neighbors(),
            num_of_recs_store: default_num_of_recs_store(),
            factor_least_similar_least_liked: false,
            perturb_perfect_scores: true,
            class_name: default_class_name(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nearest_neighbors == 0 {
            return Err(ConfigError::Invalid(
                "nearest_neighbors must be at least 1".to_string(),
            ));
        }
        if self.num_of_recs_store == 0 {
            return Err(ConfigError::Invalid(
                "num_of_recs_store must be at least 1".to_string(),
            ));
        }
        if self.class_name.trim().is_empty() {
            return Err(ConfigError::Invalid("class_name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub store_backend: StoreBackend,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Flat view of the environment, as envy sees it
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default = "default_nearest_neighbors")]
    nearest_neighbors: usize,
    #[serde(default = "default_num_of_recs_store")]
    num_of_recs_store: usize,
    #[serde(default)]
    factor_least_similar_least_liked: bool,
    #[serde(default = "default_true")]
    perturb_perfect_scores: bool,
    #[serde(default = "default_class_name")]
    class_name: String,
    #[serde(default = "default_redis_url")]
    redis_url: String,
    #[serde(default = "default_store_backend")]
    store_backend: StoreBackend,
    #[serde(default = "default_http_port")]
    http_port: u16,
}

fn default_nearest_neighbors() -> usize {
    5
}

fn default_num_of_recs_store() -> usize {
    30
}

fn default_true() -> bool {
    true
}

fn default_class_name() -> String {
    "movie".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_http_port() -> u16 {
    8090
}

impl Config {
    /// Load `.env` (if any) and then `RECOMMENDER_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        Self::build(env)
    }

    /// Build from explicit key/value pairs (keys carry the prefix)
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        Self::build(env)
    }

    fn build(env: EnvConfig) -> Result<Self, ConfigError> {
        let engine = EngineConfig {
            nearest_neighbors: env.nearest_neighbors,
            num_of_recs_store: env.num_of_recs_store,
            factor_least_similar_least_liked: env.factor_least_similar_least_liked,
            perturb_perfect_scores: env.perturb_perfect_scores,
            class_name: env.class_name,
        };
        engine.validate()?;

        Ok(Config {
            engine,
            service: ServiceConfig {
                http_port: env.http_port,
                store_backend: env.store_backend,
            },
            redis: RedisConfig { url: env.redis_url },
        })
    }
}
