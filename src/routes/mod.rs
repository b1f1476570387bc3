//! Rutas de la API
//!
//! Un router por recurso, montados bajo `/api` en `create_router`.

pub mod driver_routes;
pub mod location_routes;
pub mod payment_routes;
pub mod rating_routes;
pub mod ride_routes;
pub mod user_routes;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::cors::cors_layer_for;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer_for(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/users", user_routes::create_user_router())
        .nest("/api/token", user_routes::create_token_router())
        .nest("/api/passengers", user_routes::create_passenger_router())
        .nest("/api/drivers", driver_routes::create_driver_router())
        .nest("/api/rides", ride_routes::create_ride_router())
        .nest("/api/locations", location_routes::create_location_router())
        .nest("/api/ratings", rating_routes::create_rating_router())
        .nest("/api/payments", payment_routes::create_payment_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check simple
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "rideshare_backend",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
