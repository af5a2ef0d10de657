//! Ingestion queue + batch worker + dispatch pipeline.
//!
//! Producers push raw search events into the queue from request handlers;
//! a single background worker drains fixed-size batches, fans them out to
//! the classification service and persists the labeled results. Queue
//! state is volatile by design.

pub mod pipeline;
pub mod queue;
pub mod worker;

pub use queue::EventQueue;
pub use worker::{BatchWorker, WorkerSettings};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// One ingested, not-yet-classified search event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub query: String,
    pub timestamp: String,
    pub device_id: i32,
}

impl RawEvent {
    /// Shape the classification service sees. The prompt contract uses
    /// `time` for the timestamp field.
    pub fn to_prompt_item(&self) -> serde_json::Value {
        json!({
            "query": self.query,
            "time": self.timestamp,
            "device_id": self.device_id,
        })
    }
}
