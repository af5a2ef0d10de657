//! Background batch worker.
//!
//! Owns the consumer side of the event queue. When at least
//! `min_batch_size` events are queued it drains exactly that many, runs
//! them through the dispatch pipeline and persists the labeled results.
//! A batch below the threshold waits until producers fill it up; there is
//! no flush timer.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::ingest::pipeline::{run_batch_classification, PipelineSettings};
use crate::ingest::{EventQueue, RawEvent};
use crate::model::search_event::{ClassifiedEvent, SearchEventCtrl};
use crate::prompt::Classifier;
use crate::server_config::cfg;
use crate::{prompt, util};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub min_batch_size: usize,
    pub poll_interval: Duration,
    pub system_prompt: String,
    pub pipeline: PipelineSettings,
}

impl WorkerSettings {
    pub fn from_cfg() -> Self {
        Self {
            min_batch_size: cfg.ingest.min_batch_size,
            poll_interval: Duration::from_millis(cfg.ingest.poll_interval_ms),
            system_prompt: prompt::system_prompt(&cfg.categories),
            pipeline: PipelineSettings::from_cfg(),
        }
    }
}

pub struct BatchWorker<C: Classifier + 'static> {
    queue: EventQueue,
    conn: DatabaseConnection,
    classifier: Arc<C>,
    settings: WorkerSettings,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Classifier + 'static> BatchWorker<C> {
    pub fn new(
        queue: EventQueue,
        conn: DatabaseConnection,
        classifier: Arc<C>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            conn,
            classifier,
            settings,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the consumer loop. Calling `start` twice is a no-op.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap();
        if handle.is_some() {
            return;
        }

        let queue = self.queue.clone();
        let conn = self.conn.clone();
        let classifier = self.classifier.clone();
        let settings = self.settings.clone();
        let cancel = self.cancel.clone();

        *handle = Some(tokio::spawn(async move {
            run_loop(queue, conn, classifier, settings, cancel).await;
        }));
    }

    /// Signal the loop to exit and wait up to `timeout` for it. Safe to
    /// call repeatedly and when the worker never started; a join timeout
    /// is surfaced as a warning, not escalated.
    pub async fn stop(&self, timeout: Duration) {
        self.cancel.cancel();

        let handle = self.handle.lock().unwrap().take();
        let Some(handle) = handle else {
            return;
        };

        match tokio::time::timeout(timeout, handle).await {
            Ok(_) => tracing::info!("Batch worker stopped"),
            Err(_) => tracing::warn!(
                "Batch worker did not stop within {:?}, considering it unresponsive",
                timeout
            ),
        }
    }
}

async fn run_loop<C: Classifier>(
    queue: EventQueue,
    conn: DatabaseConnection,
    classifier: Arc<C>,
    settings: WorkerSettings,
    cancel: CancellationToken,
) {
    tracing::info!(
        "Starting batch worker loop (threshold {}, poll {:?})...",
        settings.min_batch_size,
        settings.poll_interval
    );

    loop {
        // Cancellation is observed between iterations, never mid-dispatch
        if cancel.is_cancelled() {
            break;
        }

        let Some(batch) = queue.take_batch(settings.min_batch_size) else {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = queue.notified() => {}
                _ = tokio::time::sleep(settings.poll_interval) => {}
            }
            continue;
        };

        let result = AssertUnwindSafe(process_batch(
            classifier.as_ref(),
            &conn,
            batch,
            &settings,
        ))
        .catch_unwind()
        .await;

        match result {
            Ok(Ok(persisted)) => {
                tracing::info!("Persisted {} classified events", persisted);
            }
            Ok(Err(e)) => {
                // Raw events were already dequeued; this batch is lost
                tracing::error!("Batch processing failed, dropping batch: {:?}", e);
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());
                tracing::error!("Batch worker iteration panicked, recovering: {}", msg);
            }
        }
    }

    tracing::info!("Batch worker loop exited");
}

async fn process_batch<C: Classifier>(
    classifier: &C,
    conn: &DatabaseConnection,
    batch: Vec<RawEvent>,
    settings: &WorkerSettings,
) -> AppResult<usize> {
    let items: Vec<serde_json::Value> = batch.iter().map(RawEvent::to_prompt_item).collect();

    let outcome = run_batch_classification(
        classifier,
        &settings.system_prompt,
        &items,
        &settings.pipeline,
    )
    .await;

    tracing::info!(
        "Pipeline run finished: {} sub-batches, {} results, {:.2}s",
        outcome.completed_batches,
        outcome.results.len(),
        outcome.elapsed.as_secs_f64(),
    );

    let events = parse_classified_items(&outcome.results);
    let persisted = SearchEventCtrl::insert_classified(conn, events).await?;

    Ok(persisted)
}

/// Turn raw pipeline results into persistable records. Entries missing a
/// `query` or a parseable `time` are dropped rather than failing the
/// whole batch.
pub fn parse_classified_items(items: &[serde_json::Value]) -> Vec<ClassifiedEvent> {
    items
        .iter()
        .filter_map(|entry| {
            let query = entry.get("query")?.as_str()?;
            let timestamp = util::parse_timestamp(entry.get("time")?.as_str()?)?;
            let category = entry
                .get("category")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let device_id = entry
                .get("device_id")
                .and_then(|v| v.as_i64())
                .map(|v| v as i32);

            Some(ClassifiedEvent {
                query: query.to_string(),
                timestamp,
                category,
                device_id,
            })
        })
        .collect()
}
