use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ServerState;

use super::{analytics, devices, events, feed};

pub struct AppRouter;

impl AppRouter {
    pub fn create(state: ServerState) -> Router {
        // The extension posts from arbitrary origins; restricting this is
        // a deployment concern
        let cors_layer = CorsLayer::permissive();

        Router::new()
            .route("/", get(|| async { "Searchtrack server" }))
            .route("/devices", post(devices::register_device))
            .route("/events", post(events::push_event))
            .route("/analytics", get(analytics::get_analytics))
            .route("/random-query", get(feed::get_random_query))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer)
            .with_state(state)
            .fallback(handler_404)
    }
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Route does not exist")
}
