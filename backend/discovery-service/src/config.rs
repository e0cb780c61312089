/// Configuration management for Discovery Service
///
/// Settings are loaded from environment variables (optionally via a `.env`
/// file) with defaults suitable for local development.
use serde::{Deserialize, Serialize};

use crate::services::scoring::{ScoreWeights, ScoringPreset};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Feed ranking and paging configuration
    pub feed: FeedConfig,
    /// Token validation settings
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// "json" for structured logs, anything else for human-readable output
    pub log_format: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Feed ranking configuration (paging bounds, geo default, scoring weights)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub default_radius_km: f64,
    pub engagement_weights: ScoreWeights,
    pub popularity_weights: ScoreWeights,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            default_radius_km: 10.0,
            engagement_weights: ScoringPreset::Engagement.default_weights(),
            popularity_weights: ScoringPreset::Popularity.default_weights(),
        }
    }
}

impl FeedConfig {
    pub fn weights_for(&self, preset: ScoringPreset) -> ScoreWeights {
        match preset {
            ScoringPreset::Engagement => self.engagement_weights,
            ScoringPreset::Popularity => self.popularity_weights,
        }
    }
}

/// Bearer token settings. Without a secret only anonymous requests are served.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let defaults = FeedConfig::default();

        let default_page_size = parse_env("FEED_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size = parse_env("FEED_MAX_PAGE_SIZE", defaults.max_page_size)?;
        if default_page_size <= 0 || max_page_size <= 0 {
            return Err("FEED_DEFAULT_PAGE_SIZE and FEED_MAX_PAGE_SIZE must be positive".into());
        }
        if default_page_size > max_page_size {
            return Err(format!(
                "FEED_DEFAULT_PAGE_SIZE ({}) exceeds FEED_MAX_PAGE_SIZE ({})",
                default_page_size, max_page_size
            ));
        }

        let default_radius_km = parse_env("FEED_DEFAULT_RADIUS_KM", defaults.default_radius_km)?;
        if !default_radius_km.is_finite() || default_radius_km <= 0.0 {
            return Err("FEED_DEFAULT_RADIUS_KM must be a positive number".into());
        }

        let engagement_weights = match std::env::var("ENGAGEMENT_WEIGHTS") {
            Ok(raw) => ScoreWeights::parse(&raw)?,
            Err(_) => defaults.engagement_weights,
        };
        let popularity_weights = match std::env::var("POPULARITY_WEIGHTS") {
            Ok(raw) => ScoreWeights::parse(&raw)?,
            Err(_) => defaults.popularity_weights,
        };

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                host: std::env::var("DISCOVERY_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("DISCOVERY_SERVICE_PORT", 8085)?,
                log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| "DATABASE_URL must be set".to_string())?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            feed: FeedConfig {
                default_page_size,
                max_page_size,
                default_radius_km,
                engagement_weights,
                popularity_weights,
            },
            auth: AuthConfig {
                jwt_secret: std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            },
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{} is invalid: {}", key, e)),
        Err(_) => Ok(default),
    }
}
