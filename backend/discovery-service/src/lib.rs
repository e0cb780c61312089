//! discovery-service
//!
//! Ranked, filtered and paginated travel-post feeds. Scores come from live
//! interaction counts (likes, reads, comments, favorites) under a named
//! weighting preset; candidates are restricted by visibility, category,
//! time, text query, distance and the viewer's interests.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
