use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod jwt;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod validation;

use sqlx::PgPool;

use common::database;

use crate::jwt::JwtService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: crate::repositories::UserRepository,
    pub rate_limiter: crate::rate_limiter::RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize JWT service
    let jwt_config = crate::jwt::JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    let user_repository = crate::repositories::UserRepository::new(pool.clone());
    let rate_limiter =
        crate::rate_limiter::RateLimiter::new(crate::rate_limiter::RateLimiterConfig::from_env());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        rate_limiter,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listen_addr =
        std::env::var("AUTH_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Authentication service listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
