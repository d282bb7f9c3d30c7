use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use log::error;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::leaderboard::LeaderboardEntry;
use crate::server::AppState;

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/leaderboard", get(get_leaderboard))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_leaderboard(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, String)> {
    app_state.public_leaderboard().await.map(Json).map_err(|e| {
        error!("Failed to load leaderboard: {e:#}");
        (
            StatusCode::BAD_GATEWAY,
            "Failed to load leaderboard".to_string(),
        )
    })
}
