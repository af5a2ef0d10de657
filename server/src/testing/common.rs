use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::time::Duration;

use anyhow::anyhow;
use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::error::AppResult;
use crate::ingest::pipeline::PipelineSettings;
use crate::ingest::{RawEvent, WorkerSettings};
use crate::prompt::Classifier;

pub fn raw_event(i: i32) -> RawEvent {
    RawEvent {
        query: format!("query {}", i),
        timestamp: "2025-10-03T09:23:00Z".to_string(),
        device_id: 1,
    }
}

pub fn prompt_items(n: i32) -> Vec<serde_json::Value> {
    (0..n).map(|i| raw_event(i).to_prompt_item()).collect()
}

pub fn stored_events(category: &str, n: usize) -> Vec<entity::search_event::Model> {
    let base = Utc.with_ymd_and_hms(2025, 10, 3, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| entity::search_event::Model {
            id: i as i32 + 1,
            query: format!("query {}", i),
            timestamp: base + chrono::Duration::seconds(i as i64),
            category: Some(category.to_string()),
            device_id: Some(1),
        })
        .collect()
}

pub fn test_worker_settings(min_batch_size: usize) -> WorkerSettings {
    WorkerSettings {
        min_batch_size,
        poll_interval: Duration::from_millis(10),
        system_prompt: "label these".to_string(),
        pipeline: PipelineSettings {
            sub_batch_size: 2,
            concurrency: 2,
            run_item_cap: 100,
        },
    }
}

/// Instrumented stand-in for the classification service. Echoes its input
/// back with a category added, and records call counts, submitted item
/// totals and the concurrent-call high-water mark.
pub struct MockClassifier {
    delay: Duration,
    fail: bool,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    calls: AtomicUsize,
    items_seen: AtomicUsize,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: false,
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            items_seen: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(SeqCst)
    }

    pub fn items_seen(&self) -> usize {
        self.items_seen.load(SeqCst)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(SeqCst)
    }
}

impl Classifier for MockClassifier {
    async fn classify(
        &self,
        _system_prompt: &str,
        items: &[serde_json::Value],
    ) -> AppResult<Vec<serde_json::Value>> {
        let now = self.in_flight.fetch_add(1, SeqCst) + 1;
        self.high_water.fetch_max(now, SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, SeqCst);
        self.calls.fetch_add(1, SeqCst);
        self.items_seen.fetch_add(items.len(), SeqCst);

        if self.fail {
            return Err(anyhow!("mock classifier failure").into());
        }

        let labeled = items
            .iter()
            .map(|item| {
                let mut entry = item.clone();
                entry["category"] = json!("Test");
                entry
            })
            .collect();

        Ok(labeled)
    }
}
