use std::net::SocketAddr;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod middleware;
mod routes;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opendesk_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env();

    // Initialize database
    let db = db::Database::connect(&config.database_url).await?;
    db.run_migrations().await?;

    // Build application state
    let state = AppState {
        db,
        config: config.clone(),
    };

    // Build protected routes (require authentication)
    let protected_routes = Router::new()
        .nest("/projects", routes::projects::router())
        .nest("/issues", routes::issues::router())
        .nest("/comments", routes::comments::router())
        .nest("/users", routes::users::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Build API router
    let api_router = Router::new()
        .nest("/auth", routes::auth::router())
        .merge(protected_routes);

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
}
