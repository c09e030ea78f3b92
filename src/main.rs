use axum::{middleware::from_fn, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use roamline::config;
use roamline::database::DatabaseManager;
use roamline::handlers::{categories, events, highlights, locations, trips, users};
use roamline::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Roamline API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ROAMLINE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Roamline API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Authenticated resource API
        .merge(resource_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn resource_routes() -> Router {
    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::get).patch(categories::update).delete(categories::delete),
        )
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/:id",
            get(events::get).patch(events::update).delete(events::delete),
        )
        .route("/locations", get(locations::list).post(locations::create))
        .route(
            "/locations/:id",
            get(locations::get).patch(locations::update).delete(locations::delete),
        )
        .route("/highlights", get(highlights::list).post(highlights::create))
        .route(
            "/highlights/:id",
            get(highlights::get).patch(highlights::update).delete(highlights::delete),
        )
        .route("/trips", get(trips::list).post(trips::create))
        .route("/trips/:id", get(trips::get).patch(trips::update).delete(trips::delete))
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get).patch(users::update))
        .layer(from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Roamline API",
        "version": version,
        "description": "Travel planning backend - trips, events, categories, locations, highlights and users",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "categories": "/categories[/:id]",
            "events": "/events[/:id]",
            "locations": "/locations[/:id]",
            "highlights": "/highlights[/:id]",
            "trips": "/trips[/:id]",
            "users": "/users[/:id]",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
