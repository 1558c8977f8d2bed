//! quorum-api - HTTP API server for quorum

mod extract;
mod handlers;
mod response;

use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use quorum_db::{Database, PoolConfig};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

/// Parse comma-separated `ALLOWED_ORIGINS` into header values.
fn parse_allowed_origins() -> Vec<axum::http::HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    origins_str
        .split(',')
        .filter_map(|o| o.trim().parse().ok())
        .collect()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/sign-up", post(handlers::auth::sign_up))
        .route("/auth/sign-in", post(handlers::auth::sign_in))
        .route(
            "/auth/sign-in-with-oauth",
            post(handlers::auth::sign_in_with_oauth),
        )
        .route("/auth/sign-out", post(handlers::auth::sign_out))
        // Questions
        .route(
            "/questions",
            get(handlers::questions::list).post(handlers::questions::create),
        )
        .route(
            "/questions/:id",
            get(handlers::questions::get).put(handlers::questions::update),
        )
        .route(
            "/questions/:id/views",
            post(handlers::questions::increment_views),
        )
        .route(
            "/questions/:id/answers",
            get(handlers::answers::list_for_question),
        )
        // Answers
        .route("/answers", post(handlers::answers::create))
        // Users
        .route("/me", get(handlers::users::me))
        .route("/users/:id", get(handlers::users::get))
        // Tags
        .route("/tags", get(handlers::tags::list))
        .route("/tags/:id", get(handlers::tags::get))
        .route("/tags/:id/questions", get(handlers::tags::questions))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // RUST_LOG controls verbosity (default: quorum_api=debug,tower_http=debug)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quorum_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/quorum".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    info!(subsystem = "api", "Database connected and migrated");

    // Opportunistic session cleanup at boot
    let purged = db.sessions.purge_expired().await?;
    if purged > 0 {
        info!(subsystem = "api", purged, "Expired sessions purged");
    }

    let app = router(AppState { db });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
