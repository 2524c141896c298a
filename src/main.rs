use axum::{extract::Extension, Router};
use dotenv::dotenv;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod error;
mod model;
mod notify;
mod routes;
mod shortid;

use config::Config;
use notify::Notifier;
use routes::bookings::booking_router;
use routes::hosts::host_router;
use routes::scooters::scooter_router;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let notifier = Notifier::new(config.notify_url.clone());

    let app = Router::new()
        .merge(scooter_router())
        .merge(booking_router())
        .merge(host_router())
        .layer(Extension(pool))
        .layer(Extension(notifier))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
