use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use discovery_service::db::{
    create_pool, run_migrations, InteractionRepository, PgContentStore, PgProfileRepository,
};
use discovery_service::handlers::{self, FeedHandlerState, InteractionHandlerState};
use discovery_service::middleware::{MetricsMiddleware, OptionalViewerMiddleware};
use discovery_service::services::FeedService;
use discovery_service::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "discovery-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "discovery-service"
        })),
    }
}

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into());

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_format);

    tracing::info!("Starting discovery-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    if config.auth.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not configured; bearer tokens will be rejected");
    }

    let db_pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&db_pool)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Connected to database");

    let store = Arc::new(PgContentStore::new(db_pool.clone()));
    let profiles = Arc::new(PgProfileRepository::new(db_pool.clone()));
    let feed = Arc::new(FeedService::new(
        store,
        profiles.clone(),
        profiles,
        config.feed.clone(),
    ));

    let feed_state = web::Data::new(FeedHandlerState { feed });
    let interaction_state = web::Data::new(InteractionHandlerState {
        repo: Arc::new(InteractionRepository::new(db_pool.clone())),
    });
    let pool_data = web::Data::new(db_pool);
    let jwt_secret = config.auth.jwt_secret.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(feed_state.clone())
            .app_data(interaction_state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(discovery_service::metrics::serve_metrics))
            .route("/api/v1/health", web::get().to(health_summary))
            .service(
                web::scope("/api/v1")
                    .wrap(OptionalViewerMiddleware::new(jwt_secret.clone()))
                    .wrap(MetricsMiddleware)
                    .service(
                        web::scope("/feed")
                            .route("", web::get().to(handlers::get_feed))
                            .route("/trending", web::get().to(handlers::get_trending))
                            .route("/most-commented", web::get().to(handlers::get_most_commented))
                            .route("/recent", web::get().to(handlers::get_recent))
                            .route("/recommended", web::get().to(handlers::get_recommended)),
                    )
                    .service(
                        web::scope("/posts/{post_id}")
                            .route("/like", web::post().to(handlers::toggle_like))
                            .route("/favorite", web::post().to(handlers::toggle_favorite))
                            .route("/read", web::post().to(handlers::record_read))
                            .route("/comment", web::post().to(handlers::record_comment)),
                    ),
            )
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
