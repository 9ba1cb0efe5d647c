use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::database;

pub use crate::state::AppState;

use crate::{
    middleware::JwtVerifier,
    repositories::{UserRepository, request::RequestRepository, software::SoftwareRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Token verification key, loaded once
    let jwt_verifier = JwtVerifier::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let software_repository = SoftwareRepository::new(pool.clone());
    let request_repository = RequestRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_verifier,
        user_repository,
        software_repository,
        request_repository,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listen_addr =
        std::env::var("API_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("API service listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
