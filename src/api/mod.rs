pub mod email;
pub mod health;
pub mod tracking;

use axum::Router;

use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let max_attachment_bytes = state.config.max_attachment_bytes;

    Router::new()
        .nest("/api/email", email::email_routes(max_attachment_bytes))
        .nest("/api/track", tracking::tracking_routes())
        .merge(health::health_routes())
        .with_state(state)
}
