use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;

mod crypto {
    pub mod field;
    pub mod mask;
    pub mod token;
}

mod models {
    pub mod staff;
    pub mod admin;
    pub mod salary;
}

mod repositories {
    pub mod staff;
    pub mod admin;
    pub mod salary;
}

mod services {
    pub mod auth;
}

mod handlers {
    pub mod auth;
    pub mod user;
    pub mod admin;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

/// Liveness probe.
async fn health() -> impl IntoResponse {
    Json(sonic_rs::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;
    tracing::info!("✅ AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
        .on_failure(DefaultOnFailure::new().level(Level::WARN));

    // Teacher-facing routes: any verified token.
    let user_routes = Router::new()
        .route("/{work_id}/years", get(handlers::user::years))
        .route("/{work_id}", get(handlers::user::profile))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ));

    // Admin routes: verified token plus the admin role.
    let admin_routes = Router::new()
        .route(
            "/users",
            get(handlers::admin::list_users).delete(handlers::admin::delete_users),
        )
        .route(
            "/users/{work_id}",
            get(handlers::admin::get_user).put(handlers::admin::update_user),
        )
        .route(
            "/users/{work_id}/salary",
            put(handlers::admin::update_salary),
        )
        .route("/users/import", post(handlers::admin::import_users))
        .layer(from_fn(middleware_layer::auth::require_admin))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/login", post(handlers::auth::login))
        .nest("/api/user", user_routes)
        .nest("/api/admin", admin_routes)
        .layer(trace)
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("🚀 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
