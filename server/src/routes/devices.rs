use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppJsonResult;
use crate::model::device::{DeviceCtrl, DeviceRegistration};
use crate::{util, ServerState};

#[derive(Debug, Deserialize)]
pub struct DeviceRegisterRequest {
    pub platform: String,
    pub browser: String,
    pub name: String,
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceRegisterResponse {
    pub device_id: i32,
}

/// Register (or re-identify) a device by its deterministic fingerprint.
pub async fn register_device(
    State(state): State<ServerState>,
    Json(payload): Json<DeviceRegisterRequest>,
) -> AppJsonResult<DeviceRegisterResponse> {
    let fingerprint = util::make_fingerprint(
        &payload.user,
        &payload.name,
        &payload.platform,
        &payload.browser,
    );

    // Fast path: already cached
    if let Some(device_id) = state.device_cache.get(&fingerprint) {
        return Ok(Json(DeviceRegisterResponse { device_id }));
    }

    if let Some(existing) = DeviceCtrl::find_by_fingerprint(&state.conn, &fingerprint).await? {
        state.device_cache.insert(fingerprint, existing.id);
        return Ok(Json(DeviceRegisterResponse {
            device_id: existing.id,
        }));
    }

    let device = DeviceCtrl::create(
        &state.conn,
        DeviceRegistration {
            platform: payload.platform,
            browser: payload.browser,
            name: payload.name,
            user: payload.user,
        },
        fingerprint.clone(),
    )
    .await?;

    state.device_cache.insert(fingerprint, device.id);
    tracing::info!("Registered new device {}", device.id);

    Ok(Json(DeviceRegisterResponse {
        device_id: device.id,
    }))
}
