use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppJsonResult;
use crate::model::search_event::SearchEventCtrl;
use crate::ServerState;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    fn window(&self) -> Duration {
        match self {
            Period::Day => Duration::days(1),
            Period::Week => Duration::weeks(1),
            Period::Month => Duration::days(30),
            Period::Year => Duration::days(365),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub period: Period,
    pub total_queries: usize,
    pub category_distribution: HashMap<String, usize>,
}

/// Query counts and per-category distribution within the given window.
pub async fn get_analytics(
    State(state): State<ServerState>,
    Query(params): Query<AnalyticsParams>,
) -> AppJsonResult<AnalyticsResponse> {
    let start = Utc::now() - params.period.window();
    let events = SearchEventCtrl::all_since(&state.conn, start).await?;

    let mut category_distribution: HashMap<String, usize> = HashMap::new();
    for event in &events {
        let category = event
            .category
            .clone()
            .unwrap_or_else(|| "uncategorized".to_string());
        *category_distribution.entry(category).or_default() += 1;
    }

    Ok(Json(AnalyticsResponse {
        period: params.period,
        total_queries: events.len(),
        category_distribution,
    }))
}
