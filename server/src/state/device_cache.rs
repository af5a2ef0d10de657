use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use sea_orm::DatabaseConnection;

use crate::error::AppResult;
use crate::model::device::DeviceCtrl;

/// In-memory fingerprint -> device id map, loaded once at startup and
/// updated as devices register. Avoids a storage read on every event push.
#[derive(Clone, Default)]
pub struct DeviceCache {
    inner: Arc<RwLock<HashMap<String, i32>>>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, conn: &DatabaseConnection) -> AppResult<usize> {
        let devices = DeviceCtrl::all(conn).await?;
        let mut inner = self.inner.write().unwrap();
        for device in &devices {
            inner.insert(device.fingerprint.clone(), device.id);
        }
        Ok(devices.len())
    }

    pub fn get(&self, fingerprint: &str) -> Option<i32> {
        self.inner.read().unwrap().get(fingerprint).copied()
    }

    pub fn insert(&self, fingerprint: String, device_id: i32) {
        self.inner.write().unwrap().insert(fingerprint, device_id);
    }

    pub fn has_device_id(&self, device_id: i32) -> bool {
        self.inner
            .read()
            .unwrap()
            .values()
            .any(|id| *id == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_fingerprint_and_id() {
        let cache = DeviceCache::new();
        cache.insert("abc123".to_string(), 1);
        cache.insert("def456".to_string(), 2);

        assert_eq!(cache.get("abc123"), Some(1));
        assert_eq!(cache.get("missing"), None);
        assert!(cache.has_device_id(2));
        assert!(!cache.has_device_id(3));
    }
}
