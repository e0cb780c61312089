/// Database access layer
///
/// Postgres implementations of the ranking collaborators:
/// - `post_repo`: content items and bulk interaction counts
/// - `profile_repo`: staff flags and interest signals
/// - `interaction_repo`: like/favorite toggles, reads and comments
pub mod interaction_repo;
pub mod post_repo;
pub mod profile_repo;

pub use interaction_repo::{InteractionRepository, ToggleOutcome};
pub use post_repo::PgContentStore;
pub use profile_repo::PgProfileRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Create the Postgres pool used by every repository
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await
}

/// Apply the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
