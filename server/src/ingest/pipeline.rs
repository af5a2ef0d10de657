//! Bounded-concurrency dispatch pipeline.
//!
//! Splits a batch into fixed-size sub-batches and sends them to the
//! classification service, at most `concurrency` in flight at once. A
//! failed or malformed sub-batch contributes zero results; the run itself
//! never fails. Results accumulate in completion order, not submission
//! order.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::prompt::Classifier;
use crate::server_config::cfg;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub sub_batch_size: usize,
    pub concurrency: usize,
    pub run_item_cap: usize,
}

impl PipelineSettings {
    pub fn from_cfg() -> Self {
        Self {
            sub_batch_size: cfg.pipeline.sub_batch_size,
            concurrency: cfg.pipeline.concurrency,
            run_item_cap: cfg.pipeline.run_item_cap,
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub results: Vec<serde_json::Value>,
    pub completed_batches: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Progress {
    completed_batches: usize,
}

/// Run one complete classification pass over `items`. Input beyond
/// `run_item_cap` is ignored for this run; callers size their batches
/// below the cap.
pub async fn run_batch_classification<C: Classifier>(
    classifier: &C,
    system_prompt: &str,
    items: &[serde_json::Value],
    settings: &PipelineSettings,
) -> PipelineOutcome {
    let capped = &items[..items.len().min(settings.run_item_cap)];
    let total_batches = capped.len().div_ceil(settings.sub_batch_size.max(1));

    let results = Mutex::new(Vec::new());
    let progress = Mutex::new(Progress::default());
    let started = Instant::now();

    tracing::info!("Dispatching {} sub-batches...", total_batches);

    stream::iter(capped.chunks(settings.sub_batch_size.max(1)).enumerate())
        .for_each_concurrent(settings.concurrency, |(idx, sub_batch)| {
            let results = &results;
            let progress = &progress;
            async move {
                let batch_started = Instant::now();
                let labeled = match classifier.classify(system_prompt, sub_batch).await {
                    Ok(labeled) => labeled,
                    Err(e) => {
                        tracing::error!("Sub-batch {} failed, yielding no results: {:?}", idx + 1, e);
                        Vec::new()
                    }
                };

                results.lock().unwrap().extend(labeled);

                // Progress section is serialized; the classification call
                // above runs outside both locks.
                let mut progress = progress.lock().unwrap();
                progress.completed_batches += 1;
                tracing::info!(
                    "Batch {}/{} | {} items | batch time {:.2}s | elapsed {:.2}s",
                    progress.completed_batches,
                    total_batches,
                    sub_batch.len(),
                    batch_started.elapsed().as_secs_f64(),
                    started.elapsed().as_secs_f64(),
                );
            }
        })
        .await;

    PipelineOutcome {
        results: results.into_inner().unwrap(),
        completed_batches: progress.into_inner().unwrap().completed_batches,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::common::{prompt_items, MockClassifier};

    fn settings(sub_batch_size: usize, concurrency: usize, run_item_cap: usize) -> PipelineSettings {
        PipelineSettings {
            sub_batch_size,
            concurrency,
            run_item_cap,
        }
    }

    #[tokio::test]
    async fn test_sub_batch_count_and_item_totals() {
        let classifier = MockClassifier::new();
        let items = prompt_items(25);

        let outcome =
            run_batch_classification(&classifier, "label these", &items, &settings(10, 4, 100))
                .await;

        // ceil(25/10) = 3 sub-batches, all 25 items submitted and returned
        assert_eq!(outcome.completed_batches, 3);
        assert_eq!(classifier.calls(), 3);
        assert_eq!(classifier.items_seen(), 25);
        assert_eq!(outcome.results.len(), 25);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_honored() {
        let classifier = MockClassifier::new().with_delay(Duration::from_millis(20));
        let items = prompt_items(100);

        let outcome =
            run_batch_classification(&classifier, "label these", &items, &settings(5, 3, 100))
                .await;

        assert_eq!(outcome.completed_batches, 20);
        assert!(classifier.high_water() <= 3);
        // With 20 sub-batches and a real delay the gate must actually fill
        assert!(classifier.high_water() >= 2);
    }

    #[tokio::test]
    async fn test_run_item_cap() {
        let classifier = MockClassifier::new();
        let items = prompt_items(150);

        let outcome =
            run_batch_classification(&classifier, "label these", &items, &settings(10, 10, 100))
                .await;

        assert_eq!(outcome.results.len(), 100);
        assert_eq!(outcome.completed_batches, 10);
        assert_eq!(classifier.items_seen(), 100);
    }

    #[tokio::test]
    async fn test_failed_sub_batches_yield_zero_results() {
        let classifier = MockClassifier::new().failing();
        let items = prompt_items(30);

        let outcome =
            run_batch_classification(&classifier, "label these", &items, &settings(10, 2, 100))
                .await;

        // Every sub-batch still resolves; the run completes with no results
        assert_eq!(outcome.completed_batches, 3);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let classifier = MockClassifier::new();

        let outcome =
            run_batch_classification(&classifier, "label these", &[], &settings(10, 2, 100)).await;

        assert_eq!(outcome.completed_batches, 0);
        assert_eq!(classifier.calls(), 0);
        assert!(outcome.results.is_empty());
    }
}
