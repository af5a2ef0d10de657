use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppJsonResult};
use crate::ServerState;

fn default_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct RandomQueryParams {
    pub category: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub force_refresh: bool,
}

/// Serve the next page of queries for a category in cyclic order.
pub async fn get_random_query(
    State(state): State<ServerState>,
    Query(params): Query<RandomQueryParams>,
) -> AppJsonResult<Vec<String>> {
    if params.limit < 1 {
        return Err(AppError::BadRequest("limit must be >= 1".to_string()));
    }

    let page = state
        .category_feed
        .get_page(
            &state.conn,
            &params.category,
            params.limit,
            params.force_refresh,
        )
        .await?;

    Ok(Json(page))
}
