use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppJsonResult};
use crate::ingest::RawEvent;
use crate::{util, ServerState};

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub query: String,
    pub timestamp: String,
    pub device_id: i32,
}

#[derive(Debug, Serialize)]
pub struct EventQueuedResponse {
    pub status: &'static str,
    pub queue_size: usize,
}

/// Accept one search event from the extension. Enqueueing never waits on
/// classification; only validation problems surface to the caller.
pub async fn push_event(
    State(state): State<ServerState>,
    Json(payload): Json<EventRequest>,
) -> AppJsonResult<EventQueuedResponse> {
    if !state.device_cache.has_device_id(payload.device_id) {
        return Err(AppError::BadRequest("unregistered device".to_string()));
    }

    if util::parse_timestamp(&payload.timestamp).is_none() {
        return Err(AppError::BadRequest(format!(
            "invalid timestamp: {}",
            payload.timestamp
        )));
    }

    state.event_queue.push(RawEvent {
        query: payload.query,
        timestamp: payload.timestamp,
        device_id: payload.device_id,
    });

    Ok(Json(EventQueuedResponse {
        status: "queued",
        queue_size: state.event_queue.len(),
    }))
}
