//! Per-category cache and cyclic cursor.
//!
//! Each category keeps a materialized snapshot of its stored events plus a
//! read cursor. Pages are served from the snapshot; storage is only hit
//! when the cache is empty, when a cycle has completed (cursor back at 0
//! with a non-empty cache), or on an explicit force refresh. On refresh
//! the snapshot is replaced wholesale and the cursor resets to 0; the last
//! snapshot wins under concurrent refreshes.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use entity::search_event;
use sea_orm::DatabaseConnection;

use crate::error::AppResult;
use crate::model::search_event::SearchEventCtrl;

#[derive(Debug, Default)]
struct FeedEntry {
    items: Vec<search_event::Model>,
    // 0 <= cursor <= items.len(); 0 means "fresh or fully cycled"
    cursor: usize,
}

#[derive(Clone, Default)]
pub struct CategoryFeed {
    inner: Arc<Mutex<HashMap<String, FeedEntry>>>,
}

impl CategoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next `limit` queries for `category` in cyclic order.
    pub async fn get_page(
        &self,
        conn: &DatabaseConnection,
        category: &str,
        limit: usize,
        force_refresh: bool,
    ) -> AppResult<Vec<String>> {
        let needs_refresh = {
            let mut inner = self.inner.lock().unwrap();
            let entry = inner.entry(category.to_string()).or_default();

            let cache_empty = entry.items.is_empty();
            let fully_cycled = entry.cursor == 0 && !cache_empty;

            cache_empty || fully_cycled || force_refresh
        };

        if needs_refresh {
            // Fetch with no lock held; whichever refresh lands last wins
            let events = SearchEventCtrl::all_by_category(conn, category).await?;

            let mut inner = self.inner.lock().unwrap();
            let entry = inner.entry(category.to_string()).or_default();
            entry.items = events;
            entry.cursor = 0;
        }

        let mut inner = self.inner.lock().unwrap();
        let entry = inner.entry(category.to_string()).or_default();

        if entry.items.is_empty() {
            return Ok(Vec::new());
        }

        let start = entry.cursor;
        let end = (start + limit).min(entry.items.len());
        let page = entry.items[start..end]
            .iter()
            .map(|event| event.query.clone())
            .collect();

        // Reaching the end resets the cursor, arming the next call's
        // refresh trigger
        entry.cursor = if end >= entry.items.len() { 0 } else { end };

        Ok(page)
    }
}
