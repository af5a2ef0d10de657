use chrono::Utc;
use entity::{device, prelude::*};
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::AppResult;

pub struct DeviceCtrl;

#[derive(Debug, Clone)]
pub struct DeviceRegistration {
    pub platform: String,
    pub browser: String,
    pub name: String,
    pub user: String,
}

impl DeviceCtrl {
    pub async fn all(conn: &DatabaseConnection) -> AppResult<Vec<device::Model>> {
        let devices = Device::find().all(conn).await?;
        Ok(devices)
    }

    pub async fn find_by_fingerprint(
        conn: &DatabaseConnection,
        fingerprint: &str,
    ) -> AppResult<Option<device::Model>> {
        let device = Device::find()
            .filter(device::Column::Fingerprint.eq(fingerprint))
            .one(conn)
            .await?;

        Ok(device)
    }

    pub async fn create(
        conn: &DatabaseConnection,
        registration: DeviceRegistration,
        fingerprint: String,
    ) -> AppResult<device::Model> {
        let model = device::ActiveModel {
            id: ActiveValue::NotSet,
            fingerprint: ActiveValue::Set(fingerprint),
            platform: ActiveValue::Set(registration.platform),
            browser: ActiveValue::Set(registration.browser),
            name: ActiveValue::Set(registration.name),
            user: ActiveValue::Set(registration.user),
            created_at: ActiveValue::Set(Utc::now()),
            last_seen: ActiveValue::Set(None),
        };

        let device = Device::insert(model).exec_with_returning(conn).await?;

        Ok(device)
    }
}
